// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Entity model types.
//!
//! A trackable subject is an [`Entity`]: one of a small closed set of
//! [`Model`]s plus a non-empty list of aliasable ids. Multiple ids on one
//! entity all refer to the same underlying subject (e.g. an internal id and
//! an email address for the same customer).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of model types an entity can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Model {
	/// An individual end user of the host application.
	Customer,
	/// A company or team that customers belong to.
	Organization,
}

impl Model {
	/// Returns the string representation ("customer" or "organization").
	pub fn as_str(&self) -> &'static str {
		match self {
			Model::Customer => "customer",
			Model::Organization => "organization",
		}
	}

	/// All supported models, in a stable order.
	pub fn all() -> &'static [Model] {
		&[Model::Customer, Model::Organization]
	}

	/// Returns `true` if this model can be assigned to a parent.
	///
	/// Only customers can be assigned into an organization.
	pub fn can_have_parent(&self) -> bool {
		matches!(self, Model::Customer)
	}
}

impl std::fmt::Display for Model {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

/// Error returned when parsing an unknown model name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported model: {0}")]
pub struct ParseModelError(pub String);

impl std::str::FromStr for Model {
	type Err = ParseModelError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"customer" => Ok(Model::Customer),
			"organization" => Ok(Model::Organization),
			other => Err(ParseModelError(other.to_string())),
		}
	}
}

/// A single entity identifier: a string or a number.
///
/// The remote API accepts either form; comparisons inside the SDK are
/// always on the stringified value, so `1` and `"1"` alias the same
/// subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
	Text(String),
	Number(i64),
}

impl std::fmt::Display for EntityId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			EntityId::Text(s) => write!(f, "{s}"),
			EntityId::Number(n) => write!(f, "{n}"),
		}
	}
}

impl From<String> for EntityId {
	fn from(s: String) -> Self {
		EntityId::Text(s)
	}
}

impl From<&str> for EntityId {
	fn from(s: &str) -> Self {
		EntityId::Text(s.to_string())
	}
}

impl From<i64> for EntityId {
	fn from(n: i64) -> Self {
		EntityId::Number(n)
	}
}

impl From<i32> for EntityId {
	fn from(n: i32) -> Self {
		EntityId::Number(n as i64)
	}
}

/// A trackable subject: a model plus the ids that alias it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
	pub model: Model,
	pub ids: Vec<EntityId>,
}

impl Entity {
	/// Creates an entity from any id-like values.
	pub fn new<I, T>(model: Model, ids: I) -> Self
	where
		I: IntoIterator<Item = T>,
		T: Into<EntityId>,
	{
		Self {
			model,
			ids: ids.into_iter().map(Into::into).collect(),
		}
	}

	/// Shorthand for a customer entity.
	pub fn customer<I, T>(ids: I) -> Self
	where
		I: IntoIterator<Item = T>,
		T: Into<EntityId>,
	{
		Self::new(Model::Customer, ids)
	}

	/// Shorthand for an organization entity.
	pub fn organization<I, T>(ids: I) -> Self
	where
		I: IntoIterator<Item = T>,
		T: Into<EntityId>,
	{
		Self::new(Model::Organization, ids)
	}

	/// Returns `true` if the id list is empty.
	pub fn has_no_ids(&self) -> bool {
		self.ids.is_empty()
	}

	/// The reference id: the first id, stringified.
	///
	/// This is the value stored as the entity context for the model.
	pub fn reference_id(&self) -> Option<String> {
		self.ids.first().map(ToString::to_string)
	}

	/// All ids, stringified, in order.
	pub fn string_ids(&self) -> Vec<String> {
		self.ids.iter().map(ToString::to_string).collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn model_str_roundtrip() {
		for model in Model::all() {
			let parsed: Model = model.as_str().parse().unwrap();
			assert_eq!(parsed, *model);
		}
	}

	#[test]
	fn model_rejects_unknown_names() {
		let err = "account".parse::<Model>().unwrap_err();
		assert_eq!(err, ParseModelError("account".to_string()));
	}

	#[test]
	fn model_serde_is_lowercase() {
		assert_eq!(
			serde_json::to_string(&Model::Customer).unwrap(),
			"\"customer\""
		);
		assert_eq!(
			serde_json::to_string(&Model::Organization).unwrap(),
			"\"organization\""
		);
	}

	#[test]
	fn model_parent_capability() {
		assert!(Model::Customer.can_have_parent());
		assert!(!Model::Organization.can_have_parent());
	}

	#[test]
	fn entity_id_stringifies_numbers() {
		let id = EntityId::from(42);
		assert_eq!(id.to_string(), "42");
	}

	#[test]
	fn entity_id_serde_untagged() {
		assert_eq!(
			serde_json::to_string(&EntityId::Text("a".into())).unwrap(),
			"\"a\""
		);
		assert_eq!(serde_json::to_string(&EntityId::Number(7)).unwrap(), "7");

		let parsed: Vec<EntityId> = serde_json::from_str("[\"a\", 7]").unwrap();
		assert_eq!(
			parsed,
			vec![EntityId::Text("a".into()), EntityId::Number(7)]
		);
	}

	#[test]
	fn entity_reference_id_is_first_id() {
		let entity = Entity::customer(vec![
			EntityId::Number(1),
			EntityId::Text("alias".into()),
		]);
		assert_eq!(entity.reference_id(), Some("1".to_string()));
	}

	#[test]
	fn entity_with_no_ids_has_no_reference() {
		let entity = Entity::customer(Vec::<String>::new());
		assert!(entity.has_no_ids());
		assert_eq!(entity.reference_id(), None);
	}

	#[test]
	fn entity_string_ids_preserve_order() {
		let entity = Entity::new(Model::Organization, vec!["acme", "acme-inc"]);
		assert_eq!(entity.string_ids(), vec!["acme", "acme-inc"]);
	}

	proptest! {
		#[test]
		fn entity_string_ids_match_len(ids in proptest::collection::vec("[a-z0-9]{1,12}", 0..8)) {
			let entity = Entity::customer(ids.clone());
			prop_assert_eq!(entity.string_ids().len(), ids.len());
		}

		#[test]
		fn numeric_and_text_ids_stringify_equal(n in 0i64..1_000_000) {
			let numeric = EntityId::Number(n);
			let text = EntityId::Text(n.to_string());
			prop_assert_eq!(numeric.to_string(), text.to_string());
		}
	}
}
