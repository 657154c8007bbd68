//! Audit log entries
//!
//! Written by the administration layer alongside every override mutation and
//! by membership management. The resolution engine never reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{AuditEntryId, OrganizationId};

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A capability override was created
    OverrideCreated,
    /// An existing override changed value, reason or expiry
    OverrideUpdated,
    /// An override was removed
    OverrideRemoved,
    /// A member joined the organization
    MemberAdded,
    /// A member left or was removed
    MemberRemoved,
    /// A member's role changed
    MemberRoleChanged,
}

impl AuditAction {
    /// Stable name used in the `audit_log.action` column
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::OverrideCreated => "override_created",
            AuditAction::OverrideUpdated => "override_updated",
            AuditAction::OverrideRemoved => "override_removed",
            AuditAction::MemberAdded => "member_added",
            AuditAction::MemberRemoved => "member_removed",
            AuditAction::MemberRoleChanged => "member_role_changed",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry identifier
    pub id: AuditEntryId,
    /// Organization the change applies to
    pub organization_id: OrganizationId,
    /// Principal that made the change
    pub actor: String,
    /// Kind of change
    pub action: AuditAction,
    /// Capability code or member identifier
    pub target: String,
    /// Structured before/after details
    pub details: serde_json::Value,
    /// When the change was recorded
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Create a new entry with a random identifier
    pub fn new(
        organization_id: OrganizationId,
        actor: impl Into<String>,
        action: AuditAction,
        target: impl Into<String>,
        details: serde_json::Value,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AuditEntryId::new_random(),
            organization_id,
            actor: actor.into(),
            action,
            target: target.into(),
            details,
            created_at,
        }
    }
}
