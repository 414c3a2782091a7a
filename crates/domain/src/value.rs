//! Typed property values reported by and written to devices.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Last-known properties of a device, keyed by property name.
pub type StateMap = BTreeMap<String, PropertyValue>;

/// A single device property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Json(serde_json::Value),
}

impl PropertyValue {
    /// Numeric view of the value: ints, floats, and strings that parse as
    /// a finite number. Booleans and structured values are not numbers.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        #[allow(clippy::cast_precision_loss)]
        let n = match self {
            Self::Int(i) => *i as f64,
            Self::Float(f) => *f,
            Self::String(s) => s.trim().parse().ok()?,
            Self::Bool(_) | Self::Json(_) => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Coerced equality used by `equals` conditions.
    ///
    /// Two values that both read as numbers compare numerically
    /// (`"30"` equals `30` equals `30.0`). Anything else compares by its
    /// [`Display`](fmt::Display) form, ignoring ASCII case (`"ON"` equals `"on"`,
    /// `true` equals `"true"`).
    #[must_use]
    pub fn loosely_equals(&self, other: &Self) -> bool {
        match (self.as_number(), other.as_number()) {
            #[allow(clippy::float_cmp)]
            (Some(a), Some(b)) => a == b,
            _ => self.to_string().eq_ignore_ascii_case(&other.to_string()),
        }
    }

    /// Convert into a JSON value (used when handing parameters to connectors).
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Value::from(*f),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Json(v) => v.clone(),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}
