//! Canonical value-to-JSON encoding.
//!
//! `encode` is total: every `Value` has a defined JSON form and nothing here
//! can fail or panic. Event delivery and RPC responses both run through it,
//! so an unrepresentable value degrades to its string form instead of
//! blocking the path.
//!
//! Arms are listed in rule order. Sets and collections are flattened to
//! sequences before the list rule; maps go through `serde_json::Map`, whose
//! key order is sorted, so callers must not rely on map key order.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Number, Value as JsonValue};

use crate::value::Value;

/// Encodes a value into its wire JSON form.
///
/// # Examples
///
/// ```
/// use telemux::{encode, Value};
/// use serde_json::json;
///
/// let v = Value::map(vec![("ok", Value::from(true)), ("raw", Value::bytes(vec![1u8, 2, 3]))]);
/// assert_eq!(encode(&v), json!({ "ok": true, "raw": "AQID" }));
/// ```
#[must_use]
pub fn encode(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Json(v) => v.clone(),
        Value::Bool(v) => JsonValue::Bool(*v),
        Value::Int(v) => JsonValue::Number(Number::from(*v)),
        Value::Long(v) => JsonValue::Number(Number::from(*v)),
        Value::Float(v) => float(f64::from(*v), v),
        Value::Double(v) => float(*v, v),
        Value::String(v) => JsonValue::String(v.clone()),
        Value::Set(items) | Value::Collection(items) | Value::List(items) => sequence(items),
        Value::Map(entries) => object(entries),
        Value::Bytes(data) => JsonValue::String(STANDARD.encode(data)),
        Value::Array(items) => sequence(items),
        Value::Record(record) => record.to_json(),
        Value::Opaque(v) => JsonValue::String(v.to_string()),
    }
}

/// Encodes a slice of values as a JSON array.
#[must_use]
pub fn encode_all(values: &[Value]) -> JsonValue {
    sequence(values)
}

fn sequence(items: &[Value]) -> JsonValue {
    JsonValue::Array(items.iter().map(encode).collect())
}

fn object(entries: &[(String, Value)]) -> JsonValue {
    let mut out = Map::with_capacity(entries.len());
    for (key, value) in entries {
        out.insert(key.clone(), encode(value));
    }
    JsonValue::Object(out)
}

// Non-finite floats have no JSON number form; they fall back to their
// display string like any other unrepresentable value.
fn float(widened: f64, original: &impl std::fmt::Display) -> JsonValue {
    Number::from_f64(widened).map_or_else(
        || JsonValue::String(original.to_string()),
        JsonValue::Number,
    )
}
