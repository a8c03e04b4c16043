// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! State (event) payloads.
//!
//! A state is a timestamped named occurrence attributed to an entity. The
//! `ts` field is stamped when the host application records the state, not
//! when the batch is eventually delivered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::Model;
use crate::properties::Properties;

/// A named occurrence as recorded by the host application, before the SDK
/// stamps a timestamp on it.
#[derive(Debug, Clone, PartialEq)]
pub struct StateEvent {
	pub name: String,
	pub properties: Option<Value>,
}

impl StateEvent {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			properties: None,
		}
	}

	pub fn with_properties(mut self, properties: Properties) -> Self {
		self.properties = Some(properties.into_value());
		self
	}

	/// Stamps the event with its creation time.
	pub fn into_record(self, ts: DateTime<Utc>) -> StateRecord {
		StateRecord {
			name: self.name,
			ts,
			properties: self.properties,
		}
	}
}

impl From<&str> for StateEvent {
	fn from(name: &str) -> Self {
		StateEvent::new(name)
	}
}

/// A timestamped state, as delivered inside a [`StateBatch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
	pub name: String,
	pub ts: DateTime<Utc>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub properties: Option<Value>,
}

/// All pending states for one entity, the unit of the `/state` body.
///
/// The endpoint takes a list of these; states for the same subject are
/// grouped under one entry with the union of the subject's ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateBatch {
	pub model: Model,
	pub ids: Vec<String>,
	pub states: Vec<StateRecord>,
}
