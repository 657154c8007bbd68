//! Process-wide fallback values
//!
//! The default table is immutable once built and is handed to the resolver at
//! construction. Configuration can layer replacements over the standard table
//! with [`CapabilityDefaults::with`], which copies rather than mutates.

use fleet_core::CapabilityValue;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Well-known capability codes
pub mod codes {
    /// Number of GPS devices an organization may register
    pub const MAX_DEVICES: &str = "max_devices";
    /// Number of units (vehicles) an organization may register
    pub const MAX_UNITS: &str = "max_units";
    /// Number of user accounts in the organization
    pub const MAX_USERS: &str = "max_users";
    /// Number of geofences
    pub const MAX_GEOFENCES: &str = "max_geofences";
    /// Days of position history retained
    pub const HISTORY_RETENTION_DAYS: &str = "history_retention_days";
    /// Programmatic API access
    pub const API_ACCESS: &str = "api_access";
    /// Scheduled and exported reports
    pub const ADVANCED_REPORTS: &str = "advanced_reports";
    /// SMS alert delivery
    pub const SMS_ALERTS: &str = "sms_alerts";
    /// Support tier label
    pub const SUPPORT_TIER: &str = "support_tier";
}

/// Immutable default table keyed by capability code
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CapabilityDefaults {
    values: Arc<BTreeMap<String, CapabilityValue>>,
}

impl CapabilityDefaults {
    /// The built-in table used when no configuration replaces it
    pub fn standard() -> Self {
        Self::from_entries([
            (codes::MAX_DEVICES, CapabilityValue::Int(1)),
            (codes::MAX_UNITS, CapabilityValue::Int(1)),
            (codes::MAX_USERS, CapabilityValue::Int(1)),
            (codes::MAX_GEOFENCES, CapabilityValue::Int(3)),
            (codes::HISTORY_RETENTION_DAYS, CapabilityValue::Int(7)),
            (codes::API_ACCESS, CapabilityValue::Bool(false)),
            (codes::ADVANCED_REPORTS, CapabilityValue::Bool(false)),
            (codes::SMS_ALERTS, CapabilityValue::Bool(false)),
            (codes::SUPPORT_TIER, CapabilityValue::Text("standard".to_string())),
        ])
    }

    /// Build from `(code, value)` pairs; later duplicates win
    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, CapabilityValue)>,
    {
        Self {
            values: Arc::new(entries.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// Copy of this table with `code` set to `value`
    pub fn with(&self, code: impl Into<String>, value: CapabilityValue) -> Self {
        let mut values = (*self.values).clone();
        values.insert(code.into(), value);
        Self {
            values: Arc::new(values),
        }
    }

    /// Default for a code
    pub fn get(&self, code: &str) -> Option<&CapabilityValue> {
        self.values.get(code)
    }

    /// Entries ordered by code
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CapabilityValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
