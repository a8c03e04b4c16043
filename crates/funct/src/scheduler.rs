// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Trailing-edge flush scheduler.
//!
//! Each batching cache owns one scheduler. [`schedule`] arms (or re-arms)
//! a single delayed task: repeated calls within the delay window replace
//! the pending firing rather than stacking new ones, so the task runs once
//! the burst goes quiet. There is deliberately no leading-edge invocation —
//! the first call in a burst only starts the timer.
//!
//! [`schedule`]: FlushScheduler::schedule

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

/// Delay between the last triggering call and the flush it schedules.
pub const FLUSH_DELAY: Duration = Duration::from_secs(10);

pub struct FlushScheduler {
	delay: Duration,
	pending: Mutex<Option<JoinHandle<()>>>,
}

impl FlushScheduler {
	pub fn new(delay: Duration) -> Self {
		Self {
			delay,
			pending: Mutex::new(None),
		}
	}

	/// Schedules `task` to run after the delay, replacing any pending
	/// firing. Must be called from within a tokio runtime.
	pub fn schedule<F>(&self, task: F)
	where
		F: Future<Output = ()> + Send + 'static,
	{
		let delay = self.delay;
		let handle = tokio::spawn(async move {
			tokio::time::sleep(delay).await;
			task.await;
		});

		let mut pending = self.pending.lock().expect("scheduler lock poisoned");
		if let Some(previous) = pending.replace(handle) {
			trace!("Rescheduling pending flush");
			previous.abort();
		}
	}

	/// Drops the pending firing, if any.
	pub fn cancel_pending(&self) {
		if let Some(handle) = self
			.pending
			.lock()
			.expect("scheduler lock poisoned")
			.take()
		{
			handle.abort();
		}
	}

	/// Returns `true` while a firing is armed and not yet run.
	pub fn is_scheduled(&self) -> bool {
		self.pending
			.lock()
			.expect("scheduler lock poisoned")
			.as_ref()
			.is_some_and(|handle| !handle.is_finished())
	}
}

impl Default for FlushScheduler {
	fn default() -> Self {
		Self::new(FLUSH_DELAY)
	}
}
