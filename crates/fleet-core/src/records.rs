//! Persisted capability records
//!
//! These are the typed forms of the `capabilities`, `plan_capabilities`,
//! `organization_capabilities` and `subscriptions` tables. Storage handlers
//! decode rows into these types before anything else sees them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{
    CapabilityId, CapabilityValue, FleetError, OrganizationId, PlanId, SubscriptionId, ValueType,
};

/// Catalog definition of a capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    /// Row identifier
    pub id: CapabilityId,
    /// Unique code, e.g. `max_devices`
    pub code: String,
    /// Human description
    pub description: String,
    /// Declared semantic type
    pub value_type: ValueType,
}

impl Capability {
    /// Create a new catalog entry with a random identifier
    pub fn new(code: impl Into<String>, value_type: ValueType, description: impl Into<String>) -> Self {
        Self {
            id: CapabilityId::new_random(),
            code: code.into(),
            description: description.into(),
            value_type,
        }
    }
}

/// Value assigned to a capability by a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanCapability {
    /// Plan owning the value
    pub plan_id: PlanId,
    /// Capability the value applies to
    pub capability_id: CapabilityId,
    /// Decoded value; `None` when the stored row carried no value
    pub value: Option<CapabilityValue>,
}

/// Organization-specific override of a capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationCapability {
    /// Organization the override belongs to
    pub organization_id: OrganizationId,
    /// Capability being overridden
    pub capability_id: CapabilityId,
    /// Decoded value; `None` when the stored row carried no value
    pub value: Option<CapabilityValue>,
    /// Free-text context for humans and auditors
    pub reason: Option<String>,
    /// Absolute expiry; `None` never expires
    pub expires_at: Option<DateTime<Utc>>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl OrganizationCapability {
    /// An override is expired once `expires_at` is strictly before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at < now)
    }
}

/// Subscription lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    /// Paid and current
    Active,
    /// Cancelled by the customer
    Cancelled,
    /// Lapsed
    Expired,
    /// Trial period
    Trial,
}

impl SubscriptionStatus {
    /// Schema name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "ACTIVE",
            SubscriptionStatus::Cancelled => "CANCELLED",
            SubscriptionStatus::Expired => "EXPIRED",
            SubscriptionStatus::Trial => "TRIAL",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(SubscriptionStatus::Active),
            "CANCELLED" | "CANCELED" => Ok(SubscriptionStatus::Cancelled),
            "EXPIRED" => Ok(SubscriptionStatus::Expired),
            "TRIAL" => Ok(SubscriptionStatus::Trial),
            other => Err(FleetError::invalid(format!(
                "unknown subscription status: {other}"
            ))),
        }
    }
}

/// An organization's subscription to a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Row identifier
    pub id: SubscriptionId,
    /// Subscribing organization
    pub organization_id: OrganizationId,
    /// Plan subscribed to
    pub plan_id: PlanId,
    /// Lifecycle status
    pub status: SubscriptionStatus,
    /// Start of the subscription
    pub started_at: DateTime<Utc>,
}
