//! JSON snapshot of the capability tables
//!
//! Plan values and overrides are stored in the relational row shape, with the
//! three nullable value columns flattened into the row:
//!
//! ```json
//! {
//!   "capabilities": [{"id": "…", "code": "max_devices", "description": "…", "value_type": "int"}],
//!   "plan_capabilities": [{"plan_id": "…", "capability_id": "…", "value_int": 10}],
//!   "organization_capabilities": [{"organization_id": "…", "capability_id": "…", "value_int": 25}],
//!   "subscriptions": [{"id": "…", "organization_id": "…", "plan_id": "…", "status": "ACTIVE", "started_at": "…"}],
//!   "audit_log": []
//! }
//! ```

use chrono::{DateTime, Utc};
use fleet_core::{
    AuditEntry, Capability, CapabilityId, FleetError, FleetResult, OrganizationCapability,
    OrganizationId, PlanCapability, PlanId, Subscription, ValueColumns, ValueType,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::memory::MemoryCapabilityStore;

/// `plan_capabilities` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanCapabilityRow {
    /// Plan
    pub plan_id: PlanId,
    /// Capability
    pub capability_id: CapabilityId,
    /// Value columns
    #[serde(flatten)]
    pub columns: ValueColumns,
}

impl PlanCapabilityRow {
    /// Encode a typed plan value
    pub fn from_record(record: &PlanCapability) -> Self {
        Self {
            plan_id: record.plan_id,
            capability_id: record.capability_id,
            columns: record
                .value
                .as_ref()
                .map(ValueColumns::from_value)
                .unwrap_or_default(),
        }
    }

    /// Decode against the capability's declared type
    pub fn to_record(&self, declared: ValueType) -> PlanCapability {
        PlanCapability {
            plan_id: self.plan_id,
            capability_id: self.capability_id,
            value: self.columns.to_value(declared),
        }
    }
}

/// `organization_capabilities` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationCapabilityRow {
    /// Organization
    pub organization_id: OrganizationId,
    /// Capability
    pub capability_id: CapabilityId,
    /// Value columns
    #[serde(flatten)]
    pub columns: ValueColumns,
    /// Reason text
    #[serde(default)]
    pub reason: Option<String>,
    /// Expiry
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Creation time
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    /// Last modification time
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl OrganizationCapabilityRow {
    /// Encode a typed override
    pub fn from_record(record: &OrganizationCapability) -> Self {
        Self {
            organization_id: record.organization_id,
            capability_id: record.capability_id,
            columns: record
                .value
                .as_ref()
                .map(ValueColumns::from_value)
                .unwrap_or_default(),
            reason: record.reason.clone(),
            expires_at: record.expires_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    /// Decode against the capability's declared type
    pub fn to_record(&self, declared: ValueType) -> OrganizationCapability {
        OrganizationCapability {
            organization_id: self.organization_id,
            capability_id: self.capability_id,
            value: self.columns.to_value(declared),
            reason: self.reason.clone(),
            expires_at: self.expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Full contents of a [`MemoryCapabilityStore`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSnapshot {
    /// Catalog
    pub capabilities: Vec<Capability>,
    /// Plan values
    pub plan_capabilities: Vec<PlanCapabilityRow>,
    /// Organization overrides, in lookup order
    pub organization_capabilities: Vec<OrganizationCapabilityRow>,
    /// Subscription history
    pub subscriptions: Vec<Subscription>,
    /// Audit log
    pub audit_log: Vec<AuditEntry>,
}

impl StoreSnapshot {
    /// Parse a JSON snapshot
    pub fn from_json_str(content: &str) -> FleetResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Read a JSON snapshot from disk
    pub fn load_from_file(path: &Path) -> FleetResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FleetError::not_found(format!("snapshot {}: {e}", path.display()))
        })?;
        Self::from_json_str(&content)
    }

    /// Serialize as pretty JSON
    pub fn to_json_string(&self) -> FleetResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build a store holding these tables.
    ///
    /// Capability codes must be unique.
    pub fn into_store(self) -> FleetResult<MemoryCapabilityStore> {
        MemoryCapabilityStore::from_snapshot(self)
    }
}
