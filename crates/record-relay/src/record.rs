//! The opaque record type that flows through the pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field name of the unique identifier required by bulk-indexed sinks.
pub const ID_FIELD: &str = "uuid";

/// A single data record: an unordered mapping of string keys to JSON-like
/// values. Records pass through the pipeline unmodified; the only field the
/// pipeline itself ever inspects is [`ID_FIELD`], which bulk sinks use as the
/// storage document id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// The unique identifier field, if present and a string.
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_str)
    }

    /// Look up a field by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a field, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
