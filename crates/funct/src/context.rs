// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Entity context store.
//!
//! Tracks "the currently identified entity" per model — e.g. the logged-in
//! customer — so event and property calls can omit an explicit target. The
//! in-memory map is the fast path; the surface delegate is the durable
//! fallback, promoted back into memory on a hit (write-through cache).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use funct_core::{Entity, Model};

use crate::error::{FunctError, Result};
use crate::surface::SurfaceDelegate;

fn storage_key(model: Model) -> String {
	format!("{model}ReferenceId")
}

pub struct ContextStore {
	cache: Mutex<HashMap<Model, String>>,
	surface: Arc<dyn SurfaceDelegate>,
}

impl ContextStore {
	pub fn new(surface: Arc<dyn SurfaceDelegate>) -> Self {
		Self {
			cache: Mutex::new(HashMap::new()),
			surface,
		}
	}

	/// Stores the entity's reference id (first id, stringified) as the
	/// current context for its model, in memory and through the surface.
	pub fn set(&self, entity: &Entity) -> Result<()> {
		let reference_id = entity
			.reference_id()
			.ok_or(FunctError::EmptyIds(entity.model))?;

		self.cache
			.lock()
			.expect("context lock poisoned")
			.insert(entity.model, reference_id.clone());
		self.surface
			.set(&storage_key(entity.model), &reference_id);
		debug!(model = %entity.model, reference_id = %reference_id, "Entity context set");
		Ok(())
	}

	/// Returns the current reference id for the model, if any.
	///
	/// Absence is not an error: callers log and skip the operation.
	pub fn get(&self, model: Model) -> Option<String> {
		if let Some(id) = self
			.cache
			.lock()
			.expect("context lock poisoned")
			.get(&model)
		{
			return Some(id.clone());
		}

		// fall back to the durable surface, promoting any hit
		let stored = self.surface.get(&storage_key(model))?;
		self.cache
			.lock()
			.expect("context lock poisoned")
			.insert(model, stored.clone());
		Some(stored)
	}

	/// Removes the model's context from memory and the surface.
	pub fn revoke(&self, model: Model) {
		self.cache
			.lock()
			.expect("context lock poisoned")
			.remove(&model);
		self.surface.remove(&storage_key(model));
		debug!(model = %model, "Entity context revoked");
	}

	/// Hydrates the in-memory map from the surface for one model.
	///
	/// Returns whether a stored context was found.
	pub fn restore(&self, model: Model) -> bool {
		match self.surface.get(&storage_key(model)) {
			Some(stored) => {
				self.cache
					.lock()
					.expect("context lock poisoned")
					.insert(model, stored);
				true
			}
			None => false,
		}
	}

	/// Revokes context for each listed model (logout semantics).
	pub fn reset(&self, models: &[Model]) {
		for model in models {
			self.revoke(*model);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::surface::MemorySurface;
	use funct_core::EntityId;

	fn store() -> (Arc<MemorySurface>, ContextStore) {
		let surface = Arc::new(MemorySurface::new());
		let store = ContextStore::new(Arc::clone(&surface) as Arc<dyn SurfaceDelegate>);
		(surface, store)
	}

	#[test]
	fn set_stores_first_id_stringified() {
		let (surface, store) = store();
		store
			.set(&Entity::customer(vec![EntityId::Number(1), "alias".into()]))
			.unwrap();

		assert_eq!(store.get(Model::Customer), Some("1".to_string()));
		assert_eq!(surface.get("customerReferenceId"), Some("1".to_string()));
	}

	#[test]
	fn set_with_empty_ids_is_an_error() {
		let (_, store) = store();
		let err = store
			.set(&Entity::customer(Vec::<String>::new()))
			.unwrap_err();
		assert!(matches!(err, FunctError::EmptyIds(Model::Customer)));
		assert_eq!(store.get(Model::Customer), None);
	}

	#[test]
	fn get_falls_back_to_surface_and_promotes() {
		let (surface, store) = store();
		surface.set("organizationReferenceId", "org-7");

		assert_eq!(store.get(Model::Organization), Some("org-7".to_string()));

		// promoted: still served after the surface copy is gone
		surface.remove("organizationReferenceId");
		assert_eq!(store.get(Model::Organization), Some("org-7".to_string()));
	}

	#[test]
	fn get_returns_none_when_nothing_set() {
		let (_, store) = store();
		assert_eq!(store.get(Model::Customer), None);
	}

	#[test]
	fn revoke_clears_memory_and_surface() {
		let (surface, store) = store();
		store.set(&Entity::customer(vec!["1"])).unwrap();
		store.revoke(Model::Customer);

		assert_eq!(store.get(Model::Customer), None);
		assert_eq!(surface.get("customerReferenceId"), None);
	}

	#[test]
	fn restore_hydrates_from_surface() {
		let (surface, store) = store();
		surface.set("customerReferenceId", "42");

		assert!(store.restore(Model::Customer));
		assert_eq!(store.get(Model::Customer), Some("42".to_string()));
		assert!(!store.restore(Model::Organization));
	}

	#[test]
	fn reset_revokes_only_listed_models() {
		let (_, store) = store();
		store.set(&Entity::customer(vec!["1"])).unwrap();
		store.set(&Entity::organization(vec!["org-1"])).unwrap();

		store.reset(&[Model::Customer]);
		assert_eq!(store.get(Model::Customer), None);
		assert_eq!(store.get(Model::Organization), Some("org-1".to_string()));

		store.reset(Model::all());
		assert_eq!(store.get(Model::Organization), None);
	}

	#[test]
	fn contexts_are_independent_per_model() {
		let (_, store) = store();
		store.set(&Entity::customer(vec!["c-1"])).unwrap();
		store.set(&Entity::organization(vec!["o-1"])).unwrap();

		assert_eq!(store.get(Model::Customer), Some("c-1".to_string()));
		assert_eq!(store.get(Model::Organization), Some("o-1".to_string()));
	}
}
