// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-model convenience handles.
//!
//! A handle binds the facade to one model so call sites read naturally:
//! `funct.customer().track("signed_up", ...)`. Handles are thin — every
//! call delegates straight to the facade.

use funct_core::{Entity, EntityId, Model, Properties, StateEvent};

use crate::client::{EventTarget, Functionary, IdentifyOptions};

/// Options for [`CustomerHandle::track`] / [`OrganizationHandle::track`].
#[derive(Debug, Clone, Default)]
pub struct TrackOptions {
	properties: Option<Properties>,
	ids: Option<Vec<EntityId>>,
}

impl TrackOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn properties(mut self, properties: Properties) -> Self {
		self.properties = Some(properties);
		self
	}

	/// Targets an explicit entity instead of the current context.
	pub fn ids<I, T>(mut self, ids: I) -> Self
	where
		I: IntoIterator<Item = T>,
		T: Into<EntityId>,
	{
		self.ids = Some(ids.into_iter().map(Into::into).collect());
		self
	}
}

fn target_for(model: Model, ids: Option<Vec<EntityId>>) -> EventTarget {
	match ids {
		Some(ids) => EventTarget::ByEntity(Entity::new(model, ids)),
		None => EventTarget::ByContext(model),
	}
}

macro_rules! handle_common {
	($model:expr) => {
		/// Identifies an entity of this model.
		///
		/// Context is not set by default (many subjects may share one
		/// server process); chain [`with_context_default`] or pass
		/// explicit options to change that.
		///
		/// [`with_context_default`]: Self::with_context_default
		pub async fn identify<I, T>(&self, ids: I, opts: Option<IdentifyOptions>)
		where
			I: IntoIterator<Item = T>,
			T: Into<EntityId>,
		{
			let opts = opts
				.unwrap_or_else(|| IdentifyOptions::new().set_to_context(self.set_to_context));
			self.client.identify(Entity::new($model, ids), opts).await;
		}

		/// Records a state event, against the context entity or the ids
		/// given in `opts`.
		pub async fn track(&self, name: impl Into<String>, opts: Option<TrackOptions>) {
			let opts = opts.unwrap_or_default();
			let mut state = StateEvent::new(name);
			if let Some(properties) = opts.properties {
				state = state.with_properties(properties);
			}
			self.client
				.event(state, Some(target_for($model, opts.ids)))
				.await;
		}

		/// Adds properties to the context entity of this model.
		pub async fn set(&self, properties: Properties) {
			self.client
				.add_properties(properties, Some(EventTarget::ByContext($model)))
				.await;
		}

		/// Clears this model's entity context (logout semantics).
		pub fn reset(&self) {
			self.client.reset_context(Some(&[$model]));
		}

		/// Changes whether `identify` without options sets the context.
		pub fn with_context_default(mut self, set_to_context: bool) -> Self {
			self.set_to_context = set_to_context;
			self
		}
	};
}

/// Facade handle bound to the customer model.
#[derive(Clone)]
pub struct CustomerHandle {
	client: Functionary,
	set_to_context: bool,
}

impl CustomerHandle {
	pub(crate) fn new(client: Functionary) -> Self {
		Self {
			client,
			set_to_context: false,
		}
	}

	handle_common!(Model::Customer);

	/// Assigns a customer into an organization.
	///
	/// Identifies the organization first, then enqueues the assignment.
	/// With no `customer_ids`, the current customer context is used.
	pub async fn join_organization<I, T>(&self, organization_ids: I, customer_ids: Option<Vec<EntityId>>)
	where
		I: IntoIterator<Item = T>,
		T: Into<EntityId>,
	{
		let organization = Entity::new(Model::Organization, organization_ids);
		self.client
			.identify(organization.clone(), IdentifyOptions::new())
			.await;

		let customer = Entity {
			model: Model::Customer,
			ids: customer_ids.unwrap_or_default(),
		};
		self.client.assign(customer, organization).await;
	}
}

/// Facade handle bound to the organization model.
#[derive(Clone)]
pub struct OrganizationHandle {
	client: Functionary,
	set_to_context: bool,
}

impl OrganizationHandle {
	pub(crate) fn new(client: Functionary) -> Self {
		Self {
			client,
			set_to_context: false,
		}
	}

	handle_common!(Model::Organization);
}
