//! Tagged value model for variable snapshots
//!
//! Snapshot values are canonicalized once at the boundary so downstream
//! comparison and classification switch on an explicit tag instead of
//! re-inspecting raw JSON. Integers and floats share one numeric form,
//! so `5` and `5.0` compare equal.

use serde::ser::{Serialize, Serializer};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// Runtime category of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueCategory {
    Null,
    Bool,
    Number,
    Text,
    Sequence,
    Mapping,
}

impl ValueCategory {
    /// Plain-language label used by beginner-level rendering
    pub fn label(&self) -> &'static str {
        match self {
            ValueCategory::Null => "an empty value",
            ValueCategory::Bool => "a true/false value",
            ValueCategory::Number => "a number",
            ValueCategory::Text => "a piece of text",
            ValueCategory::Sequence => "an ordered collection",
            ValueCategory::Mapping => "a key-value collection",
        }
    }
}

/// A variable value in canonical form
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Sequence(Vec<Value>),
    Mapping(BTreeMap<String, Value>),
}

impl Value {
    pub fn category(&self) -> ValueCategory {
        match self {
            Value::Null => ValueCategory::Null,
            Value::Bool(_) => ValueCategory::Bool,
            Value::Number(_) => ValueCategory::Number,
            Value::Text(_) => ValueCategory::Text,
            Value::Sequence(_) => ValueCategory::Sequence,
            Value::Mapping(_) => ValueCategory::Mapping,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }
}

fn is_whole(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0 && n.abs() <= i64::MAX as f64
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            // Whole numbers round-trip as integers
            Value::Number(n) if is_whole(*n) => serializer.serialize_i64(*n as i64),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Sequence(items) => items.serialize(serializer),
            Value::Mapping(map) => map.serialize(serializer),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => Value::Number(f),
                None => Value::Text(n.to_string()),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Mapping(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "None"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) if is_whole(*n) => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "\"{}\"", s),
            Value::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Mapping(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}
