// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for Functionary product analytics.
//!
//! This crate holds the entity model and the wire payloads shared by the
//! SDK client and any server-side consumer: models and entities, identify
//! records with their merge rules, state (event) records, and the
//! properties builder. It performs no I/O.

mod identify;
mod model;
mod properties;
mod state;

pub use identify::{ids_intersect, union_ids, ChildrenRef, IdentifyRecord, ParentRef};
pub use model::{Entity, EntityId, Model, ParseModelError};
pub use properties::Properties;
pub use state::{StateBatch, StateEvent, StateRecord};
