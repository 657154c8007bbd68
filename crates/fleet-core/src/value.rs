//! Typed capability values
//!
//! The relational schema stores a capability value as three nullable columns
//! (`value_int`, `value_bool`, `value_text`) with an implicit "exactly one is
//! set" contract. Inside the workspace the value is always a
//! [`CapabilityValue`]; [`ValueColumns`] exists only at the storage boundary
//! and is converted immediately on read and write.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::FleetError;

/// Strings accepted as a true feature flag when a capability is stored as text
const TRUTHY_TEXT: [&str; 4] = ["true", "1", "yes", "enabled"];

/// Declared semantic type of a capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Signed integer, usually a limit
    Int,
    /// Feature flag
    Bool,
    /// Free text
    Text,
}

impl ValueType {
    /// Schema name of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Int => "int",
            ValueType::Bool => "bool",
            ValueType::Text => "text",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" => Ok(ValueType::Int),
            "bool" | "boolean" => Ok(ValueType::Bool),
            "text" | "string" => Ok(ValueType::Text),
            other => Err(FleetError::invalid(format!(
                "unknown capability value type: {other}"
            ))),
        }
    }
}

/// A single typed capability value
///
/// Serialized untagged so JSON payloads carry plain `true`, `25` or `"gold"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapabilityValue {
    /// Boolean flag
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Text value
    Text(String),
}

impl CapabilityValue {
    /// Runtime type of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            CapabilityValue::Int(_) => ValueType::Int,
            CapabilityValue::Bool(_) => ValueType::Bool,
            CapabilityValue::Text(_) => ValueType::Text,
        }
    }

    /// Coerce to an integer limit.
    ///
    /// Booleans become 1/0; text is parsed after trimming and falls back to 0.
    pub fn coerce_int(&self) -> i64 {
        match self {
            CapabilityValue::Int(v) => *v,
            CapabilityValue::Bool(v) => i64::from(*v),
            CapabilityValue::Text(v) => v.trim().parse::<i64>().unwrap_or(0),
        }
    }

    /// Coerce to a feature flag.
    ///
    /// Integers are enabled above zero; text is enabled only when it is
    /// exactly `true`/`1`/`yes`/`enabled` in any case, with no surrounding
    /// whitespace.
    pub fn coerce_bool(&self) -> bool {
        match self {
            CapabilityValue::Bool(v) => *v,
            CapabilityValue::Int(v) => *v > 0,
            CapabilityValue::Text(v) => TRUTHY_TEXT.iter().any(|t| v.eq_ignore_ascii_case(t)),
        }
    }

    /// JSON form used in summaries and API responses
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CapabilityValue::Int(v) => serde_json::Value::from(*v),
            CapabilityValue::Bool(v) => serde_json::Value::Bool(*v),
            CapabilityValue::Text(v) => serde_json::Value::String(v.clone()),
        }
    }
}

impl fmt::Display for CapabilityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityValue::Int(v) => write!(f, "{v}"),
            CapabilityValue::Bool(v) => write!(f, "{v}"),
            CapabilityValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for CapabilityValue {
    fn from(v: i64) -> Self {
        CapabilityValue::Int(v)
    }
}

impl From<bool> for CapabilityValue {
    fn from(v: bool) -> Self {
        CapabilityValue::Bool(v)
    }
}

impl From<&str> for CapabilityValue {
    fn from(v: &str) -> Self {
        CapabilityValue::Text(v.to_string())
    }
}

impl From<String> for CapabilityValue {
    fn from(v: String) -> Self {
        CapabilityValue::Text(v)
    }
}

/// Legacy three-column value encoding used by persisted rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueColumns {
    /// Integer column
    #[serde(default)]
    pub value_int: Option<i64>,
    /// Boolean column
    #[serde(default)]
    pub value_bool: Option<bool>,
    /// Text column
    #[serde(default)]
    pub value_text: Option<String>,
}

impl ValueColumns {
    /// Encode a value, setting exactly one column
    pub fn from_value(value: &CapabilityValue) -> Self {
        match value {
            CapabilityValue::Int(v) => Self {
                value_int: Some(*v),
                ..Self::default()
            },
            CapabilityValue::Bool(v) => Self {
                value_bool: Some(*v),
                ..Self::default()
            },
            CapabilityValue::Text(v) => Self {
                value_text: Some(v.clone()),
                ..Self::default()
            },
        }
    }

    /// True when no column is populated
    pub fn is_empty(&self) -> bool {
        self.value_int.is_none() && self.value_bool.is_none() && self.value_text.is_none()
    }

    /// Decode against the capability's declared type.
    ///
    /// The declared column wins. A row whose declared column is null but that
    /// carries another column decodes to the first populated of int, bool,
    /// text. A row with no populated column decodes to `None`.
    pub fn to_value(&self, declared: ValueType) -> Option<CapabilityValue> {
        let declared_value = match declared {
            ValueType::Int => self.value_int.map(CapabilityValue::Int),
            ValueType::Bool => self.value_bool.map(CapabilityValue::Bool),
            ValueType::Text => self.value_text.clone().map(CapabilityValue::Text),
        };
        if declared_value.is_some() {
            return declared_value;
        }

        let fallback = self
            .value_int
            .map(CapabilityValue::Int)
            .or_else(|| self.value_bool.map(CapabilityValue::Bool))
            .or_else(|| self.value_text.clone().map(CapabilityValue::Text));
        match &fallback {
            Some(value) => tracing::warn!(
                declared = %declared,
                actual = %value.value_type(),
                "stored capability value does not match declared type"
            ),
            None => tracing::warn!(declared = %declared, "stored capability value is empty"),
        }
        fallback
    }
}
