//! Audit log effects.

use async_trait::async_trait;

use crate::effects::StorageError;
use crate::{AuditEntry, OrganizationId};

/// Append-only audit log
#[async_trait]
pub trait AuditLogEffects: Send + Sync {
    /// Append an entry
    async fn append_audit(&self, entry: AuditEntry) -> Result<(), StorageError>;

    /// Entries for an organization in insertion order
    async fn audit_entries(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<AuditEntry>, StorageError>;
}
