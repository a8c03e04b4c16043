// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rust SDK client for Functionary product analytics.
//!
//! The SDK accepts many independent identify/event calls, merges them by
//! logical entity, throttles delivery, and guarantees eventual,
//! bounded-latency, deduplicated delivery to the collection endpoint —
//! including a best-effort flush on process teardown. Failures never
//! propagate into the host application; they are observed only through
//! the `tracing` log stream.
//!
//! # Example
//!
//! ```ignore
//! use funct::{Entity, Functionary, IdentifyOptions, Properties};
//!
//! let funct = Functionary::builder()
//!     .api_key("fn_live_xxx")
//!     .build();
//!
//! // identify the logged-in customer and make it the implicit target
//! funct
//!     .identify(
//!         Entity::customer(vec!["cust_42"]),
//!         IdentifyOptions::new()
//!             .set_to_context(true)
//!             .properties(Properties::new().set("plan", "pro")),
//!     )
//!     .await;
//!
//! // batched, merged, delivered within the throttle window
//! funct.event("signed_up", None).await;
//! funct.customer().track("viewed_dashboard", None).await;
//!
//! // reliable teardown: cancel timers and flush what is pending
//! funct.shutdown().await;
//! ```

mod cache;
mod client;
mod context;
mod error;
mod handles;
mod scheduler;
mod surface;
mod transport;

pub use cache::{SharedCaches, STATE_RECORD_CAP};
pub use client::{
	EventTarget, Functionary, FunctionaryBuilder, IdentifyOptions, DEFAULT_BASE_URL,
};
pub use error::{FunctError, Result};
pub use handles::{CustomerHandle, OrganizationHandle, TrackOptions};
pub use scheduler::{FlushScheduler, FLUSH_DELAY};
pub use surface::{FlushListener, MemorySurface, SurfaceDelegate};

pub use funct_core::{
	ChildrenRef, Entity, EntityId, IdentifyRecord, Model, ParentRef, ParseModelError,
	Properties, StateBatch, StateEvent, StateRecord,
};
