//! In-memory capability store
//!
//! Rows are held in their relational shape (three nullable value columns) and
//! decoded into typed records against the catalog on every read. All tables
//! sit behind one `RwLock`, which is what makes
//! [`commit_override_change`](CapabilityAdminEffects::commit_override_change)
//! atomic with respect to readers.

use async_trait::async_trait;
use fleet_core::effects::{
    AuditLogEffects, CapabilityAdminEffects, CapabilityStoreEffects, OverrideAudit, OverrideChange,
    StorageError, SubscriptionEffects,
};
use fleet_core::{
    AuditEntry, Capability, CapabilityId, FleetError, FleetResult, OrganizationCapability,
    OrganizationId, PlanCapability, PlanId, Subscription, SubscriptionId, ValueType,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::snapshot::{OrganizationCapabilityRow, PlanCapabilityRow, StoreSnapshot};

#[derive(Debug, Default)]
struct Tables {
    capabilities: BTreeMap<CapabilityId, Capability>,
    plan_capabilities: BTreeMap<(PlanId, CapabilityId), PlanCapabilityRow>,
    organization_capabilities: Vec<OrganizationCapabilityRow>,
    subscriptions: BTreeMap<SubscriptionId, Subscription>,
    audit_log: Vec<AuditEntry>,
}

impl Tables {
    fn declared_type(&self, capability_id: &CapabilityId) -> ValueType {
        // Rows pointing at a missing catalog entry are unreachable through the
        // resolver; text keeps whatever column they carry.
        self.capabilities
            .get(capability_id)
            .map_or(ValueType::Text, |c| c.value_type)
    }

    fn code_taken(&self, code: &str) -> bool {
        self.capabilities.values().any(|c| c.code == code)
    }

    fn first_override(
        &self,
        organization_id: &OrganizationId,
        capability_id: &CapabilityId,
    ) -> Option<OrganizationCapability> {
        self.organization_capabilities
            .iter()
            .find(|row| {
                row.organization_id == *organization_id && row.capability_id == *capability_id
            })
            .map(|row| row.to_record(self.declared_type(capability_id)))
    }

    fn remove_overrides(&mut self, organization_id: &OrganizationId, capability_id: &CapabilityId) {
        self.organization_capabilities.retain(|row| {
            row.organization_id != *organization_id || row.capability_id != *capability_id
        });
    }
}

/// In-memory handler for every storage trait.
///
/// Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryCapabilityStore {
    tables: Arc<RwLock<Tables>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryCapabilityStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a snapshot; duplicate capability codes are rejected
    pub fn from_snapshot(snapshot: StoreSnapshot) -> FleetResult<Self> {
        let mut tables = Tables::default();
        for capability in snapshot.capabilities {
            if tables.code_taken(&capability.code) {
                return Err(FleetError::invalid(format!(
                    "duplicate capability code in snapshot: {}",
                    capability.code
                )));
            }
            tables.capabilities.insert(capability.id, capability);
        }
        for row in snapshot.plan_capabilities {
            tables
                .plan_capabilities
                .insert((row.plan_id, row.capability_id), row);
        }
        tables.organization_capabilities = snapshot.organization_capabilities;
        for subscription in snapshot.subscriptions {
            tables.subscriptions.insert(subscription.id, subscription);
        }
        tables.audit_log = snapshot.audit_log;

        tracing::debug!(
            capabilities = tables.capabilities.len(),
            plan_values = tables.plan_capabilities.len(),
            overrides = tables.organization_capabilities.len(),
            subscriptions = tables.subscriptions.len(),
            "loaded capability store from snapshot"
        );
        Ok(Self {
            tables: Arc::new(RwLock::new(tables)),
            unavailable: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Export every table
    pub async fn snapshot(&self) -> StoreSnapshot {
        let tables = self.tables.read().await;
        let mut capabilities: Vec<Capability> = tables.capabilities.values().cloned().collect();
        capabilities.sort_by(|a, b| a.code.cmp(&b.code));
        StoreSnapshot {
            capabilities,
            plan_capabilities: tables.plan_capabilities.values().cloned().collect(),
            organization_capabilities: tables.organization_capabilities.clone(),
            subscriptions: tables.subscriptions.values().cloned().collect(),
            audit_log: tables.audit_log.clone(),
        }
    }

    /// Append a raw override row without replacing existing rows for the pair.
    ///
    /// Lets callers reproduce legacy data where a pair has several rows; lookups
    /// return the first one.
    pub async fn push_override_row(&self, row: OrganizationCapabilityRow) {
        self.tables.write().await.organization_capabilities.push(row);
    }

    /// Insert or replace a raw plan row, bypassing value encoding
    pub async fn put_plan_row(&self, row: PlanCapabilityRow) {
        self.tables
            .write()
            .await
            .plan_capabilities
            .insert((row.plan_id, row.capability_id), row);
    }

    /// Make every operation fail with `StorageError::Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CapabilityStoreEffects for MemoryCapabilityStore {
    async fn capability_by_code(&self, code: &str) -> Result<Option<Capability>, StorageError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .capabilities
            .values()
            .find(|c| c.code == code)
            .cloned())
    }

    async fn list_capabilities(&self) -> Result<Vec<Capability>, StorageError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let mut capabilities: Vec<Capability> = tables.capabilities.values().cloned().collect();
        capabilities.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(capabilities)
    }

    async fn organization_capability(
        &self,
        organization_id: &OrganizationId,
        capability_id: &CapabilityId,
    ) -> Result<Option<OrganizationCapability>, StorageError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables.first_override(organization_id, capability_id))
    }

    async fn list_organization_capabilities(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<OrganizationCapability>, StorageError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .organization_capabilities
            .iter()
            .filter(|row| row.organization_id == *organization_id)
            .map(|row| row.to_record(tables.declared_type(&row.capability_id)))
            .collect())
    }

    async fn plan_capability(
        &self,
        plan_id: &PlanId,
        capability_id: &CapabilityId,
    ) -> Result<Option<PlanCapability>, StorageError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .plan_capabilities
            .get(&(*plan_id, *capability_id))
            .map(|row| row.to_record(tables.declared_type(capability_id))))
    }
}

#[async_trait]
impl AuditLogEffects for MemoryCapabilityStore {
    async fn append_audit(&self, entry: AuditEntry) -> Result<(), StorageError> {
        self.check_available()?;
        self.tables.write().await.audit_log.push(entry);
        Ok(())
    }

    async fn audit_entries(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<AuditEntry>, StorageError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .audit_log
            .iter()
            .filter(|entry| entry.organization_id == *organization_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CapabilityAdminEffects for MemoryCapabilityStore {
    async fn insert_capability(&self, capability: Capability) -> Result<(), StorageError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if tables.code_taken(&capability.code) {
            return Err(StorageError::Conflict {
                reason: format!("capability code {} already exists", capability.code),
            });
        }
        tables.capabilities.insert(capability.id, capability);
        Ok(())
    }

    async fn upsert_plan_capability(
        &self,
        plan_capability: PlanCapability,
    ) -> Result<Option<PlanCapability>, StorageError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let declared = tables.declared_type(&plan_capability.capability_id);
        let row = PlanCapabilityRow::from_record(&plan_capability);
        Ok(tables
            .plan_capabilities
            .insert((row.plan_id, row.capability_id), row)
            .map(|previous| previous.to_record(declared)))
    }

    async fn delete_plan_capability(
        &self,
        plan_id: &PlanId,
        capability_id: &CapabilityId,
    ) -> Result<bool, StorageError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        Ok(tables
            .plan_capabilities
            .remove(&(*plan_id, *capability_id))
            .is_some())
    }

    async fn commit_override_change(
        &self,
        change: OverrideChange,
        audit: OverrideAudit,
    ) -> Result<Option<OrganizationCapability>, StorageError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let (organization_id, capability_id) = change.key();
        let previous = tables.first_override(&organization_id, &capability_id);

        let Some(entry) = audit(previous.as_ref()) else {
            return Ok(previous);
        };

        tables.remove_overrides(&organization_id, &capability_id);
        if let OverrideChange::Upsert(mut record) = change {
            if let Some(previous) = &previous {
                record.created_at = previous.created_at;
            }
            tables
                .organization_capabilities
                .push(OrganizationCapabilityRow::from_record(&record));
        }
        tables.audit_log.push(entry);
        Ok(previous)
    }
}

#[async_trait]
impl SubscriptionEffects for MemoryCapabilityStore {
    async fn subscriptions_for_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Subscription>, StorageError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .subscriptions
            .values()
            .filter(|s| s.organization_id == *organization_id)
            .cloned()
            .collect())
    }

    async fn upsert_subscription(&self, subscription: Subscription) -> Result<(), StorageError> {
        self.check_available()?;
        self.tables
            .write()
            .await
            .subscriptions
            .insert(subscription.id, subscription);
        Ok(())
    }
}
