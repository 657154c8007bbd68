//! Capability administration
//!
//! The write side of the capability tables. Unlike resolution, this path is
//! strict: unknown codes are `NotFound` and values must match the declared
//! type. Every override mutation is committed together with its audit entry.

use chrono::{DateTime, Utc};
use fleet_core::effects::{
    CapabilityAdminEffects, OverrideAudit, OverrideChange, PhysicalTimeEffects,
};
use fleet_core::{
    AuditAction, AuditEntry, Capability, CapabilityValue, FleetError, FleetResult,
    OrganizationCapability, OrganizationId, PlanCapability, PlanId, ValueType,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use tracing::info;

/// Longest accepted capability code
const MAX_CODE_LEN: usize = 64;

/// Override to create or replace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRequest {
    /// Organization receiving the override
    pub organization_id: OrganizationId,
    /// Capability code
    pub code: String,
    /// New value; must match the declared type
    pub value: CapabilityValue,
    /// Why the override exists
    pub reason: Option<String>,
    /// When the override stops applying
    pub expires_at: Option<DateTime<Utc>>,
}

/// Override listing row with its code attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideView {
    /// Capability code
    pub code: String,
    /// Override value
    pub value: Option<CapabilityValue>,
    /// Why the override exists
    pub reason: Option<String>,
    /// Expiry, if any
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether the override is expired at listing time
    pub expired: bool,
    /// Last modification
    pub updated_at: DateTime<Utc>,
}

/// Membership events recorded on behalf of the membership CRUD
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MembershipChange {
    /// A member joined with a role
    Added {
        /// Member identifier
        member: String,
        /// Granted role
        role: String,
    },
    /// A member was removed
    Removed {
        /// Member identifier
        member: String,
    },
    /// A member's role changed
    RoleChanged {
        /// Member identifier
        member: String,
        /// Previous role
        from: String,
        /// New role
        to: String,
    },
}

impl MembershipChange {
    fn action(&self) -> AuditAction {
        match self {
            MembershipChange::Added { .. } => AuditAction::MemberAdded,
            MembershipChange::Removed { .. } => AuditAction::MemberRemoved,
            MembershipChange::RoleChanged { .. } => AuditAction::MemberRoleChanged,
        }
    }

    fn member(&self) -> &str {
        match self {
            MembershipChange::Added { member, .. }
            | MembershipChange::Removed { member }
            | MembershipChange::RoleChanged { member, .. } => member,
        }
    }

    fn details(&self) -> serde_json::Value {
        match self {
            MembershipChange::Added { role, .. } => json!({ "role": role }),
            MembershipChange::Removed { .. } => json!({}),
            MembershipChange::RoleChanged { from, to, .. } => json!({ "from": from, "to": to }),
        }
    }
}

/// Administration service over the capability tables
#[derive(Debug, Clone)]
pub struct CapabilityAdministration<S, T> {
    store: S,
    clock: T,
}

impl<S, T> CapabilityAdministration<S, T>
where
    S: CapabilityAdminEffects,
    T: PhysicalTimeEffects,
{
    /// Create the service
    pub fn new(store: S, clock: T) -> Self {
        Self { store, clock }
    }

    /// Add a capability to the catalog
    pub async fn define_capability(
        &self,
        code: &str,
        value_type: ValueType,
        description: &str,
    ) -> FleetResult<Capability> {
        let code = normalize_code(code)?;
        if self.store.capability_by_code(&code).await?.is_some() {
            return Err(FleetError::invalid(format!(
                "capability {code} is already defined"
            )));
        }
        let capability = Capability::new(code, value_type, description.trim());
        self.store.insert_capability(capability.clone()).await?;
        info!(code = %capability.code, value_type = %value_type, "capability defined");
        Ok(capability)
    }

    /// Set a plan's value for a capability, returning the previous value
    pub async fn assign_plan_capability(
        &self,
        plan_id: PlanId,
        code: &str,
        value: CapabilityValue,
    ) -> FleetResult<Option<CapabilityValue>> {
        let capability = self.cataloged(code).await?;
        ensure_type(&capability, &value)?;
        let previous = self
            .store
            .upsert_plan_capability(PlanCapability {
                plan_id,
                capability_id: capability.id,
                value: Some(value.clone()),
            })
            .await?;
        info!(plan = %plan_id, code, value = %value, "plan capability assigned");
        Ok(previous.and_then(|row| row.value))
    }

    /// Remove a plan's value for a capability
    pub async fn remove_plan_capability(&self, plan_id: PlanId, code: &str) -> FleetResult<bool> {
        let capability = self.cataloged(code).await?;
        let removed = self
            .store
            .delete_plan_capability(&plan_id, &capability.id)
            .await?;
        info!(plan = %plan_id, code, removed, "plan capability removed");
        Ok(removed)
    }

    /// Create or replace an organization override.
    ///
    /// An expiry that is already in the past is rejected: the row would never
    /// apply.
    pub async fn set_override(
        &self,
        actor: &str,
        request: OverrideRequest,
    ) -> FleetResult<OrganizationCapability> {
        let capability = self.cataloged(&request.code).await?;
        ensure_type(&capability, &request.value)?;

        let now = self.clock.now().await?;
        if let Some(expires_at) = request.expires_at {
            if expires_at < now {
                return Err(FleetError::invalid(format!(
                    "override for {} would already be expired ({expires_at})",
                    capability.code
                )));
            }
        }

        let reason = request
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        let mut row = OrganizationCapability {
            organization_id: request.organization_id,
            capability_id: capability.id,
            value: Some(request.value),
            reason,
            expires_at: request.expires_at,
            created_at: now,
            updated_at: now,
        };

        // Created vs. updated is decided against the row the store replaces.
        let current = override_details(&row);
        let (organization_id, actor_name, code) =
            (row.organization_id, actor.to_string(), capability.code.clone());
        let audit: OverrideAudit = Box::new(
            move |previous: Option<&OrganizationCapability>| -> Option<AuditEntry> {
                let action = if previous.is_some() {
                    AuditAction::OverrideUpdated
                } else {
                    AuditAction::OverrideCreated
                };
                Some(AuditEntry::new(
                    organization_id,
                    actor_name,
                    action,
                    code,
                    json!({
                        "previous": previous.map(override_details),
                        "current": current,
                    }),
                    now,
                ))
            },
        );

        let previous = self
            .store
            .commit_override_change(OverrideChange::Upsert(row.clone()), audit)
            .await?;
        if let Some(previous) = &previous {
            row.created_at = previous.created_at;
        }
        info!(
            organization = %row.organization_id,
            code = %capability.code,
            replaced = previous.is_some(),
            actor,
            "capability override saved"
        );
        Ok(row)
    }

    /// Remove an organization override; returns false when none existed
    pub async fn clear_override(
        &self,
        actor: &str,
        organization_id: OrganizationId,
        code: &str,
    ) -> FleetResult<bool> {
        let capability = self.cataloged(code).await?;
        let now = self.clock.now().await?;

        let (actor_name, target) = (actor.to_string(), capability.code.clone());
        let audit: OverrideAudit = Box::new(
            move |previous: Option<&OrganizationCapability>| -> Option<AuditEntry> {
                let previous = previous?;
                Some(AuditEntry::new(
                    organization_id,
                    actor_name,
                    AuditAction::OverrideRemoved,
                    target,
                    json!({ "previous": override_details(previous) }),
                    now,
                ))
            },
        );
        let removed = self
            .store
            .commit_override_change(
                OverrideChange::Delete {
                    organization_id,
                    capability_id: capability.id,
                },
                audit,
            )
            .await?
            .is_some();
        info!(organization = %organization_id, code, actor, removed, "capability override cleared");
        Ok(removed)
    }

    /// An organization's overrides, ordered by code
    pub async fn list_overrides(
        &self,
        organization_id: &OrganizationId,
        include_expired: bool,
    ) -> FleetResult<Vec<OverrideView>> {
        let now = self.clock.now().await?;
        let codes: HashMap<_, _> = self
            .store
            .list_capabilities()
            .await?
            .into_iter()
            .map(|c| (c.id, c.code))
            .collect();

        let mut views: Vec<OverrideView> = self
            .store
            .list_organization_capabilities(organization_id)
            .await?
            .into_iter()
            .filter_map(|row| {
                let expired = row.is_expired_at(now);
                if expired && !include_expired {
                    return None;
                }
                let code = codes.get(&row.capability_id)?.clone();
                Some(OverrideView {
                    code,
                    value: row.value,
                    reason: row.reason,
                    expires_at: row.expires_at,
                    expired,
                    updated_at: row.updated_at,
                })
            })
            .collect();
        views.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(views)
    }

    /// Record a membership event in the audit log
    pub async fn record_membership_change(
        &self,
        actor: &str,
        organization_id: OrganizationId,
        change: &MembershipChange,
    ) -> FleetResult<AuditEntry> {
        let entry = AuditEntry::new(
            organization_id,
            actor,
            change.action(),
            change.member(),
            change.details(),
            self.clock.now().await?,
        );
        self.store.append_audit(entry.clone()).await?;
        info!(organization = %organization_id, action = %entry.action, actor, "membership change recorded");
        Ok(entry)
    }

    /// Audit entries for an organization, oldest first
    pub async fn audit_trail(&self, organization_id: &OrganizationId) -> FleetResult<Vec<AuditEntry>> {
        let mut entries = self.store.audit_entries(organization_id).await?;
        entries.sort_by_key(|entry| entry.created_at);
        Ok(entries)
    }

    async fn cataloged(&self, code: &str) -> FleetResult<Capability> {
        self.store
            .capability_by_code(code)
            .await?
            .ok_or_else(|| FleetError::not_found(format!("capability {code}")))
    }
}

fn normalize_code(code: &str) -> FleetResult<String> {
    let code = code.trim();
    if code.is_empty() || code.len() > MAX_CODE_LEN {
        return Err(FleetError::invalid(format!(
            "capability code must be 1-{MAX_CODE_LEN} characters"
        )));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(FleetError::invalid(format!(
            "capability code {code} may only contain a-z, 0-9 and _"
        )));
    }
    Ok(code.to_string())
}

fn ensure_type(capability: &Capability, value: &CapabilityValue) -> FleetResult<()> {
    if value.value_type() == capability.value_type {
        Ok(())
    } else {
        Err(FleetError::invalid(format!(
            "capability {} expects {} but got {}",
            capability.code,
            capability.value_type,
            value.value_type()
        )))
    }
}

fn override_details(row: &OrganizationCapability) -> serde_json::Value {
    json!({
        "value": row.value,
        "reason": row.reason,
        "expires_at": row.expires_at,
    })
}
