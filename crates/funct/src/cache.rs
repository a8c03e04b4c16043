// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Batching caches for pending identify and state records.
//!
//! Two independent append-merge caches, each keyed by (model, id-set).
//! Membership is "do the stringified id sets intersect", not exact
//! equality, because two calls may reference the same subject through
//! different aliases. Identify records for one subject fold into a single
//! merged record; state records are only ever appended — the subject's
//! id set merges, the occurrences do not.
//!
//! Flushing uses swap-then-send: [`IdentifyCache::take`] /
//! [`StateCache::take`] atomically detach the accumulated batch, so
//! records arriving while a flush's network request is in flight land in
//! a fresh cache and are never lost or double-sent.

use tokio::sync::Mutex;

use funct_core::{ids_intersect, union_ids, IdentifyRecord, Model, StateBatch, StateRecord};

use crate::scheduler::FlushScheduler;

/// Hard cap on cached state records across all entries. Reaching it forces
/// an immediate flush regardless of timer state, bounding memory growth
/// under high event volume.
pub const STATE_RECORD_CAP: usize = 300;

/// Pending identify records, at most one entry per (model, id-set).
#[derive(Debug, Default)]
pub struct IdentifyCache {
	entries: Vec<IdentifyRecord>,
}

impl IdentifyCache {
	/// Merges the record into the first entry whose model matches and
	/// whose id set intersects, or appends a new entry.
	///
	/// Scan order is insertion order and the first match wins. A record
	/// bridging two pre-existing disjoint entries merges only into the
	/// first; the entries themselves are not coalesced.
	pub fn merge_or_insert(&mut self, record: IdentifyRecord) {
		for entry in &mut self.entries {
			if entry.model == record.model && ids_intersect(&entry.ids, &record.ids) {
				entry.merge_from(record);
				return;
			}
		}
		self.entries.push(record);
	}

	/// Detaches and returns the accumulated records, leaving the cache empty.
	pub fn take(&mut self) -> Vec<IdentifyRecord> {
		std::mem::take(&mut self.entries)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// Pending state records grouped per entity, plus the total-record counter
/// that drives the safety-cap flush.
#[derive(Debug, Default)]
pub struct StateCache {
	entries: Vec<StateBatch>,
	total: usize,
}

impl StateCache {
	/// Appends a state record under the entity's entry, creating one if no
	/// existing entry's id set intersects. Returns the running total of
	/// cached state records.
	pub fn append(&mut self, model: Model, ids: Vec<String>, record: StateRecord) -> usize {
		self.total += 1;
		for entry in &mut self.entries {
			if entry.model == model && ids_intersect(&entry.ids, &ids) {
				union_ids(&mut entry.ids, &ids);
				entry.states.push(record);
				return self.total;
			}
		}
		self.entries.push(StateBatch {
			model,
			ids,
			states: vec![record],
		});
		self.total
	}

	/// Detaches and returns the accumulated batches, resetting the counter.
	pub fn take(&mut self) -> Vec<StateBatch> {
		self.total = 0;
		std::mem::take(&mut self.entries)
	}

	pub fn total_records(&self) -> usize {
		self.total
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// The two caches and their throttle schedulers, shared by every facade
/// instance wired to the same application root.
///
/// Sharing is explicit: create one `SharedCaches`, hand a clone of the
/// `Arc` to each [`Functionary`](crate::Functionary) you build, and they
/// batch into one outbound queue per cache type — whichever instance
/// enqueues last governs the flush timing for all of them. A facade built
/// without one gets its own.
#[derive(Default)]
pub struct SharedCaches {
	pub(crate) identify: Mutex<IdentifyCache>,
	pub(crate) state: Mutex<StateCache>,
	pub(crate) identify_scheduler: FlushScheduler,
	pub(crate) state_scheduler: FlushScheduler,
}

impl SharedCaches {
	pub fn new() -> Self {
		Self::default()
	}
}
