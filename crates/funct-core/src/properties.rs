// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Builder for entity and state properties.

use serde_json::{Map, Value};

/// A flat key/value property dictionary.
///
/// Merging is shallow: on a key collision the newer value replaces the
/// older one, matching the remote API's own conflict resolution.
///
/// # Example
///
/// ```
/// use funct_core::Properties;
///
/// let props = Properties::new()
///     .set("plan", "pro")
///     .set("seats", 12)
///     .set("trial", false);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
	inner: Map<String, Value>,
}

impl Properties {
	/// Creates an empty property set.
	pub fn new() -> Self {
		Self { inner: Map::new() }
	}

	/// Sets a property, replacing any existing value for the key.
	pub fn set<K, V>(mut self, key: K, value: V) -> Self
	where
		K: Into<String>,
		V: Into<Value>,
	{
		self.inner.insert(key.into(), value.into());
		self
	}

	/// Folds `newer` into this set, newer value winning each key collision.
	pub fn merge_from(&mut self, newer: Properties) {
		for (k, v) in newer.inner {
			self.inner.insert(k, v);
		}
	}

	/// Gets a value by key.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.inner.get(key)
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	/// Consumes the builder, returning the underlying JSON map.
	pub fn into_map(self) -> Map<String, Value> {
		self.inner
	}

	/// Consumes the builder, returning a JSON object value.
	pub fn into_value(self) -> Value {
		Value::Object(self.inner)
	}
}

impl From<Properties> for Value {
	fn from(props: Properties) -> Self {
		props.into_value()
	}
}

impl From<Map<String, Value>> for Properties {
	fn from(map: Map<String, Value>) -> Self {
		Self { inner: map }
	}
}

impl From<Value> for Properties {
	fn from(value: Value) -> Self {
		match value {
			Value::Object(map) => Self { inner: map },
			_ => Self::new(),
		}
	}
}

impl<K, V> FromIterator<(K, V)> for Properties
where
	K: Into<String>,
	V: Into<Value>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self {
			inner: iter
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		}
	}
}
