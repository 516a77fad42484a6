//! Module for assembling scored report documents from collected results
//!
//! All report modes consume the same score aggregation on different input
//! shapes: a snapshot covers one result, a diff compares several models side
//! by side and a history follows results over recorded commits.

pub mod config;
pub mod diff;
pub mod formula;
pub mod history;
pub mod score;
pub mod snapshot;

use serde::Serialize;
use serde_json::Value;

/// Serialize a report document as the JSON consumed by the report front end
pub fn render_json<T: Serialize>(document: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(document)
    } else {
        serde_json::to_string(document)
    }
}

/// Select the slice of a possibly per parameter field
pub(crate) fn param_field(value: &Value, param: &str) -> Value {
    match value {
        Value::Object(map) => map.get(param).cloned().unwrap_or(Value::Null),
        _ => Value::Null,
    }
}
