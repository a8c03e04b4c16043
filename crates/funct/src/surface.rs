// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persistence surface abstraction.
//!
//! The SDK persists small pieces of state — the API key, the base URL, and
//! the per-model entity context — through whatever the runtime surface
//! offers. A browser build would back this with cookies/local storage; a
//! server process backs it with memory. The concrete variant is chosen
//! explicitly at construction, never sniffed from the environment.
//!
//! The surface is also the process-teardown seam: the SDK registers a
//! flush listener so pending batches are delivered before exit, and the
//! host application invokes [`MemorySurface::notify_exit`] from its
//! shutdown path.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

/// Callback registered to run before process/page teardown.
pub type FlushListener = Arc<dyn Fn() + Send + Sync>;

/// Key/value persistence plus an exit hook, the capability the SDK needs
/// from its runtime surface.
pub trait SurfaceDelegate: Send + Sync {
	fn get(&self, key: &str) -> Option<String>;
	fn set(&self, key: &str, value: &str);
	fn remove(&self, key: &str);
	fn clear(&self);

	/// Registers a callback to run before the process terminates.
	fn add_flush_listener(&self, listener: FlushListener);
}

/// In-process surface for server-side use.
///
/// Values live for the lifetime of the process; nothing survives a
/// restart. Exit listeners fire when the host calls [`notify_exit`]
/// from its shutdown path.
///
/// [`notify_exit`]: MemorySurface::notify_exit
#[derive(Default)]
pub struct MemorySurface {
	values: Mutex<HashMap<String, String>>,
	listeners: Mutex<Vec<FlushListener>>,
}

impl MemorySurface {
	pub fn new() -> Self {
		Self::default()
	}

	/// Runs every registered flush listener, in registration order.
	pub fn notify_exit(&self) {
		let listeners = self.listeners.lock().expect("listener lock poisoned");
		debug!(count = listeners.len(), "Running exit flush listeners");
		for listener in listeners.iter() {
			listener();
		}
	}
}

impl SurfaceDelegate for MemorySurface {
	fn get(&self, key: &str) -> Option<String> {
		self.values
			.lock()
			.expect("surface lock poisoned")
			.get(key)
			.cloned()
	}

	fn set(&self, key: &str, value: &str) {
		self.values
			.lock()
			.expect("surface lock poisoned")
			.insert(key.to_string(), value.to_string());
	}

	fn remove(&self, key: &str) {
		self.values.lock().expect("surface lock poisoned").remove(key);
	}

	fn clear(&self) {
		self.values.lock().expect("surface lock poisoned").clear();
	}

	fn add_flush_listener(&self, listener: FlushListener) {
		self.listeners
			.lock()
			.expect("listener lock poisoned")
			.push(listener);
	}
}
