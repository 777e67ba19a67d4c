//! Keys, records and scan requests exchanged with the record store

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::planner::IndexFilter;

/// Fully-qualified primary key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    pub namespace: String,
    /// Set name; `None` addresses records stored without a set
    pub set: Option<String>,
    /// User-supplied key value
    pub user_key: Value,
}

impl Key {
    pub fn new(namespace: impl Into<String>, set: Option<&str>, user_key: impl Into<Value>) -> Self {
        Self {
            namespace: namespace.into(),
            set: set.map(str::to_string),
            user_key: user_key.into(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.namespace,
            self.set.as_deref().unwrap_or(""),
            self.user_key
        )
    }
}

/// A raw record as returned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub key: Key,
    /// Bin name to value
    pub bins: Map<String, Value>,
    /// Server-side modification counter
    #[serde(default)]
    pub generation: u32,
}

impl Record {
    pub fn new(key: Key, bins: Map<String, Value>) -> Self {
        Self {
            key,
            bins,
            generation: 1,
        }
    }

    /// Builds a record from a JSON object; non-object bodies yield no bins
    pub fn from_json(key: Key, body: Value) -> Self {
        let bins = match body {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(key, bins)
    }

    /// Returns a bin value
    pub fn bin(&self, name: &str) -> Option<&Value> {
        self.bins.get(name)
    }
}

/// Query sent to the store: one namespace/set and at most one index filter
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    pub namespace: String,
    pub set: Option<String>,
    pub filter: Option<IndexFilter>,
}
