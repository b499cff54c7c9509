//! Common types used across store operations.
//!
//! The store is schemaless: an item is a map of named, typed attributes, and
//! the only attribute a collection knows about is its single string hash key.

use std::{collections::BTreeMap, fmt};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A typed attribute value.
///
/// Mirrors the attribute model of document-oriented key-value stores. Numbers
/// are carried as their decimal string form so no precision is lost between
/// the caller and the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttributeValue {
    /// UTF-8 string.
    S(String),
    /// Number in decimal string form.
    N(String),
    /// Raw bytes.
    B(Bytes),
    /// Boolean.
    Bool(bool),
    /// Explicit null.
    Null,
    /// Ordered list of values.
    L(Vec<AttributeValue>),
    /// Nested map of values.
    M(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Creates a string attribute.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::S(value.into())
    }

    /// Creates a number attribute from anything with a decimal `Display`.
    #[must_use]
    pub fn number(value: impl fmt::Display) -> Self {
        Self::N(value.to_string())
    }

    /// Returns the string content if this is an `S` attribute.
    #[must_use]
    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the decimal content if this is an `N` attribute.
    #[must_use]
    pub fn as_n(&self) -> Option<&str> {
        match self {
            Self::N(n) => Some(n),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::S(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::S(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::number(value)
    }
}

/// A stored item: attribute name to value.
pub type Item = BTreeMap<String, AttributeValue>;

/// The single-attribute string primary key of an item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrimaryKey {
    /// Name of the key attribute (e.g. `token`).
    pub attribute: String,
    /// Key value.
    pub value: String,
}

impl PrimaryKey {
    /// Creates a primary key.
    #[must_use]
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self { attribute: attribute.into(), value: value.into() }
    }

    /// Extracts the key from an item, if the item carries it as a string.
    #[must_use]
    pub fn from_item(item: &Item, attribute: &str) -> Option<Self> {
        item.get(attribute).and_then(AttributeValue::as_s).map(|value| Self::new(attribute, value))
    }

    /// Returns the key as an `(attribute, value)` item entry.
    #[must_use]
    pub fn to_entry(&self) -> (String, AttributeValue) {
        (self.attribute.clone(), AttributeValue::S(self.value.clone()))
    }
}

/// Provisioned read/write capacity for a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Throughput {
    /// Read capacity units.
    #[serde(default = "default_capacity")]
    pub read_capacity_units: u64,
    /// Write capacity units.
    #[serde(default = "default_capacity")]
    pub write_capacity_units: u64,
}

fn default_capacity() -> u64 {
    1
}

impl Default for Throughput {
    fn default() -> Self {
        Self { read_capacity_units: default_capacity(), write_capacity_units: default_capacity() }
    }
}

/// Request to create a collection.
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder)]
pub struct CollectionSpec {
    /// Collection name.
    #[builder(into)]
    pub name: String,
    /// Name of the string hash key attribute.
    #[builder(into)]
    pub key_attribute: String,
    /// Provisioned capacity.
    #[builder(default)]
    pub throughput: Throughput,
}

/// Lifecycle state of a collection as reported by the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionStatus {
    /// Accepted but not yet serving traffic.
    Creating,
    /// Ready for reads and writes.
    Active,
    /// Being removed.
    Deleting,
}

impl fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Creating => "CREATING",
            Self::Active => "ACTIVE",
            Self::Deleting => "DELETING",
        })
    }
}

/// Control-plane view of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDescription {
    /// Collection name.
    pub name: String,
    /// Name of the string hash key attribute.
    pub key_attribute: String,
    /// Current lifecycle state.
    pub status: CollectionStatus,
    /// Number of stored items.
    pub item_count: usize,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn primary_key_from_item_requires_string() {
        let mut item = Item::new();
        item.insert("id".into(), AttributeValue::number(7));
        assert_eq!(PrimaryKey::from_item(&item, "id"), None);

        item.insert("id".into(), "1234".into());
        assert_eq!(PrimaryKey::from_item(&item, "id"), Some(PrimaryKey::new("id", "1234")));
    }

    #[test]
    fn attribute_value_json_shape() {
        let value = AttributeValue::M(BTreeMap::from([
            ("name".to_owned(), AttributeValue::string("kamil")),
            ("age".to_owned(), AttributeValue::number(33)),
        ]));
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"M":{"age":{"N":"33"},"name":{"S":"kamil"}}}"#);
    }

    #[test]
    fn throughput_defaults_to_one_unit() {
        let throughput: Throughput = serde_json::from_str("{}").unwrap();
        assert_eq!(throughput, Throughput::default());
        assert_eq!(throughput.read_capacity_units, 1);
    }
}
