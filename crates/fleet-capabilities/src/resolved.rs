//! Resolution output

use chrono::{DateTime, Utc};
use fleet_core::{CapabilityValue, PlanId, ValueType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tier that produced a resolved value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilitySource {
    /// Non-expired organization override
    Organization,
    /// The active plan's assigned value
    Plan,
    /// The injected default table (value may be absent)
    Default,
}

impl CapabilitySource {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilitySource::Organization => "organization",
            CapabilitySource::Plan => "plan",
            CapabilitySource::Default => "default",
        }
    }
}

impl fmt::Display for CapabilitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective value of one capability for one organization.
///
/// Built fresh by every resolution call and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCapability {
    /// Capability code
    pub code: String,
    /// Effective value; `None` for unknown codes or malformed rows
    pub value: Option<CapabilityValue>,
    /// Tier that produced the value
    pub source: CapabilitySource,
    /// Set only when `source` is `Plan`
    pub plan_id: Option<PlanId>,
    /// Set only when `source` is `Organization` and the override expires
    pub expires_at: Option<DateTime<Utc>>,
    /// Declared catalog type; `None` when the code is not cataloged
    pub declared_type: Option<ValueType>,
}

impl ResolvedCapability {
    pub(crate) fn from_override(
        code: &str,
        declared_type: ValueType,
        value: Option<CapabilityValue>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            code: code.to_string(),
            value,
            source: CapabilitySource::Organization,
            plan_id: None,
            expires_at,
            declared_type: Some(declared_type),
        }
    }

    pub(crate) fn from_plan(
        code: &str,
        declared_type: ValueType,
        value: Option<CapabilityValue>,
        plan_id: PlanId,
    ) -> Self {
        Self {
            code: code.to_string(),
            value,
            source: CapabilitySource::Plan,
            plan_id: Some(plan_id),
            expires_at: None,
            declared_type: Some(declared_type),
        }
    }

    pub(crate) fn from_default(
        code: &str,
        declared_type: Option<ValueType>,
        value: Option<CapabilityValue>,
    ) -> Self {
        Self {
            code: code.to_string(),
            value,
            source: CapabilitySource::Default,
            plan_id: None,
            expires_at: None,
            declared_type,
        }
    }

    /// Integer view: absent values are 0
    pub fn as_int(&self) -> i64 {
        self.value.as_ref().map_or(0, CapabilityValue::coerce_int)
    }

    /// Flag view: absent values are disabled
    pub fn as_bool(&self) -> bool {
        self.value.as_ref().is_some_and(CapabilityValue::coerce_bool)
    }
}
