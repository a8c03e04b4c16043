// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identify payloads and their merge rules.
//!
//! An [`IdentifyRecord`] is a pending mutation to an entity's identity:
//! ids, display name, properties, and parent/children relationships. While
//! records wait in the identify cache, records for the same subject are
//! folded together with [`IdentifyRecord::merge_from`]; the merged record
//! is what the `/identify` endpoint eventually receives.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::Model;
use crate::properties::Properties;

/// A reference to a related entity, serialized as `parentModel`/`parentIds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentRef {
	#[serde(rename = "parentModel")]
	pub model: Model,
	#[serde(rename = "parentIds")]
	pub ids: Vec<String>,
}

/// A reference to related child entities, serialized as `childModel`/`childIds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildrenRef {
	#[serde(rename = "childModel")]
	pub model: Model,
	#[serde(rename = "childIds")]
	pub ids: Vec<String>,
}

/// A pending identity mutation for one entity.
///
/// The wire shape matches the collection API's `/identify` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyRecord {
	pub model: Model,
	pub ids: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub display_name: Option<String>,
	#[serde(skip_serializing_if = "Map::is_empty", default)]
	pub properties: Map<String, Value>,
	#[serde(flatten)]
	pub parent: Option<ParentRef>,
	#[serde(flatten)]
	pub children: Option<ChildrenRef>,
}

impl IdentifyRecord {
	/// Creates a record carrying only identity (model + ids).
	pub fn new(model: Model, ids: Vec<String>) -> Self {
		Self {
			model,
			ids,
			display_name: None,
			properties: Map::new(),
			parent: None,
			children: None,
		}
	}

	/// Sets the display name.
	pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
		self.display_name = Some(name.into());
		self
	}

	/// Sets the properties to assert on the entity.
	pub fn with_properties(mut self, properties: Properties) -> Self {
		self.properties = properties.into_map();
		self
	}

	/// Sets the parent reference.
	pub fn with_parent(mut self, model: Model, ids: Vec<String>) -> Self {
		self.parent = Some(ParentRef { model, ids });
		self
	}

	/// Sets the children reference.
	pub fn with_children(mut self, model: Model, ids: Vec<String>) -> Self {
		self.children = Some(ChildrenRef { model, ids });
		self
	}

	/// Folds `newer` into this record.
	///
	/// - ids: set union, preserving first-seen order
	/// - properties: shallow merge, newer value wins each key
	/// - display name, parent, children: whole-value replace when the newer
	///   record carries one
	pub fn merge_from(&mut self, newer: IdentifyRecord) {
		union_ids(&mut self.ids, &newer.ids);
		for (k, v) in newer.properties {
			self.properties.insert(k, v);
		}
		if newer.display_name.is_some() {
			self.display_name = newer.display_name;
		}
		if newer.parent.is_some() {
			self.parent = newer.parent;
		}
		if newer.children.is_some() {
			self.children = newer.children;
		}
	}
}

/// Returns `true` if the two stringified id sets share any id.
pub fn ids_intersect(a: &[String], b: &[String]) -> bool {
	a.iter().any(|id| b.contains(id))
}

/// Unions `from` into `into`, keeping first-seen order and no duplicates.
pub fn union_ids(into: &mut Vec<String>, from: &[String]) {
	for id in from {
		if !into.contains(id) {
			into.push(id.clone());
		}
	}
}
