//! Capability table effects.
//!
//! Reads are point lookups; the resolver issues at most four per resolution.
//! Handlers must decode the legacy value columns into
//! [`CapabilityValue`](crate::CapabilityValue) before returning.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::effects::AuditLogEffects;
use crate::{
    AuditEntry, Capability, CapabilityId, OrganizationCapability, OrganizationId, PlanCapability,
    PlanId,
};

/// Error type for storage operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum StorageError {
    #[error("Conflict: {reason}")]
    Conflict { reason: String },
    #[error("Storage backend unavailable")]
    Unavailable,
}

/// Read access to the capability catalog, plan values and overrides
#[async_trait]
pub trait CapabilityStoreEffects: Send + Sync {
    /// Catalog lookup by unique code
    async fn capability_by_code(&self, code: &str) -> Result<Option<Capability>, StorageError>;

    /// Every catalog definition, ordered by code
    async fn list_capabilities(&self) -> Result<Vec<Capability>, StorageError>;

    /// First override row for the pair, expired or not
    async fn organization_capability(
        &self,
        organization_id: &OrganizationId,
        capability_id: &CapabilityId,
    ) -> Result<Option<OrganizationCapability>, StorageError>;

    /// All override rows for an organization, expired included
    async fn list_organization_capabilities(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<OrganizationCapability>, StorageError>;

    /// Plan value for the pair
    async fn plan_capability(
        &self,
        plan_id: &PlanId,
        capability_id: &CapabilityId,
    ) -> Result<Option<PlanCapability>, StorageError>;
}

/// A single override mutation, committed together with its audit entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideChange {
    /// Insert the override, replacing any row for the same pair. A replaced
    /// row's `created_at` is carried over.
    Upsert(OrganizationCapability),
    /// Remove every row for the pair
    Delete {
        /// Organization owning the override
        organization_id: OrganizationId,
        /// Capability being cleared
        capability_id: CapabilityId,
    },
}

impl OverrideChange {
    /// The `(organization, capability)` pair the change applies to
    pub fn key(&self) -> (OrganizationId, CapabilityId) {
        match self {
            OverrideChange::Upsert(record) => (record.organization_id, record.capability_id),
            OverrideChange::Delete {
                organization_id,
                capability_id,
            } => (*organization_id, *capability_id),
        }
    }
}

/// Builds the audit entry for an override change from the row it replaces.
///
/// Runs inside the handler's transaction. Returning `None` aborts the change.
pub type OverrideAudit =
    Box<dyn FnOnce(Option<&OrganizationCapability>) -> Option<AuditEntry> + Send>;

/// Write access used by capability administration
#[async_trait]
pub trait CapabilityAdminEffects: CapabilityStoreEffects + AuditLogEffects {
    /// Add a catalog definition; a duplicate code is a `Conflict`
    async fn insert_capability(&self, capability: Capability) -> Result<(), StorageError>;

    /// Insert or replace a plan value, returning the previous one
    async fn upsert_plan_capability(
        &self,
        plan_capability: PlanCapability,
    ) -> Result<Option<PlanCapability>, StorageError>;

    /// Remove a plan value, returning whether a row existed
    async fn delete_plan_capability(
        &self,
        plan_id: &PlanId,
        capability_id: &CapabilityId,
    ) -> Result<bool, StorageError>;

    /// Apply an override change and append its audit entry atomically.
    ///
    /// `audit` sees the row currently stored for the pair, read under the same
    /// lock as the mutation. Either both the mutation and the audit entry
    /// become visible or neither does. Returns the row that was stored before
    /// the call, whether or not the change was applied.
    async fn commit_override_change(
        &self,
        change: OverrideChange,
        audit: OverrideAudit,
    ) -> Result<Option<OrganizationCapability>, StorageError>;
}
