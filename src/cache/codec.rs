//! Value codec
//!
//! Stored values are JSON documents. The codec is the only place that
//! touches their textual form.

use serde_json::Value;

/// Parses raw JSON text into a value.
pub fn decode(raw: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Renders a value in its compact canonical form.
pub fn encode(value: &Value) -> String {
    // Serializing a `Value` into a String cannot fail.
    value.to_string()
}
