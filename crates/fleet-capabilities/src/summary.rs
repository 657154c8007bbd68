//! Limits/features partition for the summary endpoint
//!
//! Cataloged capabilities are classified by their declared type: `int`
//! capabilities are limits (coerced the same way [`get_limit`] coerces), `bool`
//! and `text` capabilities are features. Codes that exist only in the default
//! table have no declared type and are classified by the runtime type of the
//! value. Absent values are always reported as features with a null value so a
//! missing limit is never displayed as "0 = unlimited". For the same reason an
//! `int` capability holding text that is not an integer is reported as a
//! feature carrying that text.
//!
//! [`get_limit`]: crate::CapabilityResolver::get_limit

use fleet_core::{CapabilityValue, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::resolved::ResolvedCapability;

/// Response of `GET /capabilities`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySummary {
    /// Integer limits by code
    pub limits: BTreeMap<String, i64>,
    /// Feature values by code
    pub features: BTreeMap<String, serde_json::Value>,
}

/// Which side of the summary a resolved capability lands on
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Integer limit
    Limit(i64),
    /// Feature value, kept in its JSON form
    Feature(serde_json::Value),
}

impl Classification {
    /// Classify a resolved capability
    pub fn of(resolved: &ResolvedCapability) -> Self {
        let Some(value) = &resolved.value else {
            return Classification::Feature(serde_json::Value::Null);
        };

        let kind = resolved.declared_type.unwrap_or_else(|| value.value_type());
        match (kind, value) {
            (ValueType::Int, CapabilityValue::Text(text)) if text.trim().parse::<i64>().is_err() => {
                Classification::Feature(value.to_json())
            }
            (ValueType::Int, _) => Classification::Limit(value.coerce_int()),
            (ValueType::Bool | ValueType::Text, _) => Classification::Feature(value.to_json()),
        }
    }
}
