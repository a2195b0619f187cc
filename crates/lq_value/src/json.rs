//! JSON boundary.
//!
//! Arrays whose keys are exactly `0..n` serialize as JSON arrays; any
//! other array serializes as a JSON object with stringified keys. Objects
//! are materialized first. Non-finite floats serialize as `null`.
//!
//! Parsing maps JSON integers that fit in `i64` to `Int`, every other
//! number to `Float`, JSON arrays to list-shaped arrays, and JSON objects
//! to arrays keyed by the property names in document order.

use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::{json_error, ArrayValue, LinqResult, Value};

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Float(_) => serializer.serialize_unit(),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Array(a) => a.serialize(serializer),
            Value::Object(o) => o
                .materialize()
                .map_err(S::Error::custom)?
                .serialize(serializer),
        }
    }
}

impl Serialize for ArrayValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_list() {
            let mut seq = serializer.serialize_seq(Some(self.len()))?;
            for value in self.values() {
                seq.serialize_element(value)?;
            }
            seq.end()
        } else {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for (key, value) in self.iter() {
                match key {
                    Value::Str(s) => map.serialize_entry(&**s, value)?,
                    other => map.serialize_entry(&other.to_string(), value)?,
                }
            }
            map.end()
        }
    }
}

/// Serialize a value to JSON text.
pub fn to_json_text(value: &Value, pretty: bool) -> LinqResult<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    text.map_err(json_error)
}

/// Convert a value into a `serde_json` document.
pub fn to_json_value(value: &Value) -> LinqResult<serde_json::Value> {
    serde_json::to_value(value).map_err(json_error)
}

/// Parse JSON text into a value.
pub fn from_json_text(text: &str) -> LinqResult<Value> {
    let doc: serde_json::Value = serde_json::from_str(text).map_err(json_error)?;
    Ok(from_json_value(doc))
}

/// Convert a `serde_json` document into a value.
pub fn from_json_value(doc: serde_json::Value) -> Value {
    match doc {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::string(s),
        serde_json::Value::Array(items) => Value::list(items.into_iter().map(from_json_value)),
        serde_json::Value::Object(fields) => Value::array(
            fields
                .into_iter()
                .map(|(k, v)| (Value::string(k), from_json_value(v)))
                .collect(),
        ),
    }
}
