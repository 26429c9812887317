//! A single health check as reported by the watcher.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Status;

/// One health check's observed state.
///
/// Only `CheckID` and `Status` are interpreted. Everything else the watcher
/// sends (`Node`, `Name`, `Output`, `ServiceID`, ...) is kept in `fields` and
/// serialized back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRecord {
    /// Unique identifier of the check.
    #[serde(rename = "CheckID")]
    pub check_id: String,

    /// Current state of the check.
    #[serde(rename = "Status")]
    pub status: Status,

    /// Opaque descriptive fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CheckRecord {
    /// Create a record with no descriptive fields.
    pub fn new(check_id: impl Into<String>, status: Status) -> Self {
        Self {
            check_id: check_id.into(),
            status,
            fields: Map::new(),
        }
    }

    /// Attach a descriptive field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Look up a descriptive field as a string.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}
