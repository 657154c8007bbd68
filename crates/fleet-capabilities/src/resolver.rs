//! Capability resolution engine
//!
//! Resolution is a pure function of table contents and the clock. Each call
//! performs at most four point reads (catalog, override, active subscription,
//! plan value) and keeps nothing between calls.

use chrono::{DateTime, Utc};
use fleet_core::effects::{CapabilityStoreEffects, PhysicalTimeEffects};
use fleet_core::{Capability, FleetResult, OrganizationId, PlanId};
use std::collections::BTreeMap;
use tracing::debug;

use crate::defaults::CapabilityDefaults;
use crate::resolved::ResolvedCapability;
use crate::subscription::ActiveSubscriptionProvider;
use crate::summary::{CapabilitySummary, Classification};

/// Whether one more item fits under `limit` given `current_count` items.
///
/// A limit of zero or below means unlimited. Otherwise the comparison is
/// strict: at the limit nothing more may be added.
pub fn limit_allows(limit: i64, current_count: i64) -> bool {
    limit <= 0 || current_count < limit
}

/// Per-call state shared by the lookups of a single organization.
///
/// The active plan is fetched at most once per call, and only if some
/// capability actually falls through to the plan tier.
struct ResolutionScope<'a> {
    organization_id: &'a OrganizationId,
    now: DateTime<Utc>,
    active_plan: Option<Option<PlanId>>,
}

/// Resolves capabilities through override → plan → default
#[derive(Debug, Clone)]
pub struct CapabilityResolver<S, A, T> {
    store: S,
    subscriptions: A,
    clock: T,
    defaults: CapabilityDefaults,
}

impl<S, A, T> CapabilityResolver<S, A, T>
where
    S: CapabilityStoreEffects,
    A: ActiveSubscriptionProvider,
    T: PhysicalTimeEffects,
{
    /// Create a resolver over the given store, subscription provider, clock
    /// and default table
    pub fn new(store: S, subscriptions: A, clock: T, defaults: CapabilityDefaults) -> Self {
        Self {
            store,
            subscriptions,
            clock,
            defaults,
        }
    }

    /// The injected default table
    pub fn defaults(&self) -> &CapabilityDefaults {
        &self.defaults
    }

    /// Resolve one capability code for an organization.
    ///
    /// Never fails for unknown codes or organizations; those resolve to the
    /// default tier with a possibly absent value.
    #[tracing::instrument(
        level = "debug",
        skip(self, organization_id),
        fields(organization = %organization_id)
    )]
    pub async fn get_capability(
        &self,
        organization_id: &OrganizationId,
        code: &str,
    ) -> FleetResult<ResolvedCapability> {
        let Some(capability) = self.store.capability_by_code(code).await? else {
            debug!(code, "capability not cataloged, using default table");
            return Ok(ResolvedCapability::from_default(
                code,
                None,
                self.defaults.get(code).cloned(),
            ));
        };

        let mut scope = self.scope(organization_id).await?;
        self.resolve_cataloged(&mut scope, &capability).await
    }

    /// Resolve every cataloged capability, plus default-table codes that
    /// are not in the catalog
    #[tracing::instrument(
        level = "debug",
        skip(self, organization_id),
        fields(organization = %organization_id)
    )]
    pub async fn get_all_capabilities(
        &self,
        organization_id: &OrganizationId,
    ) -> FleetResult<BTreeMap<String, ResolvedCapability>> {
        let catalog = self.store.list_capabilities().await?;
        let mut scope = self.scope(organization_id).await?;

        let mut resolved = BTreeMap::new();
        for capability in &catalog {
            let value = self.resolve_cataloged(&mut scope, capability).await?;
            resolved.insert(capability.code.clone(), value);
        }

        for (code, value) in self.defaults.iter() {
            if !resolved.contains_key(code) {
                resolved.insert(
                    code.to_string(),
                    ResolvedCapability::from_default(code, None, Some(value.clone())),
                );
            }
        }

        debug!(
            cataloged = catalog.len(),
            total = resolved.len(),
            "resolved all capabilities"
        );
        Ok(resolved)
    }

    /// Partition every resolved capability into limits and features
    pub async fn get_capabilities_summary(
        &self,
        organization_id: &OrganizationId,
    ) -> FleetResult<CapabilitySummary> {
        let resolved = self.get_all_capabilities(organization_id).await?;
        let mut summary = CapabilitySummary::default();
        for (code, capability) in resolved {
            match Classification::of(&capability) {
                Classification::Limit(limit) => {
                    summary.limits.insert(code, limit);
                }
                Classification::Feature(value) => {
                    summary.features.insert(code, value);
                }
            }
        }
        Ok(summary)
    }

    /// Whether a feature is enabled for the organization
    pub async fn has_capability(
        &self,
        organization_id: &OrganizationId,
        code: &str,
    ) -> FleetResult<bool> {
        Ok(self.get_capability(organization_id, code).await?.as_bool())
    }

    /// Integer limit for the organization; absent values are 0 (unlimited)
    pub async fn get_limit(&self, organization_id: &OrganizationId, code: &str) -> FleetResult<i64> {
        Ok(self.get_capability(organization_id, code).await?.as_int())
    }

    /// Whether the organization may add one more item given `current_count`
    pub async fn validate_limit(
        &self,
        organization_id: &OrganizationId,
        code: &str,
        current_count: i64,
    ) -> FleetResult<bool> {
        let limit = self.get_limit(organization_id, code).await?;
        let allowed = limit_allows(limit, current_count);
        debug!(
            organization = %organization_id,
            code,
            limit,
            current_count,
            allowed,
            "validated limit"
        );
        Ok(allowed)
    }

    async fn scope<'a>(
        &self,
        organization_id: &'a OrganizationId,
    ) -> FleetResult<ResolutionScope<'a>> {
        Ok(ResolutionScope {
            organization_id,
            now: self.clock.now().await?,
            active_plan: None,
        })
    }

    async fn active_plan(&self, scope: &mut ResolutionScope<'_>) -> FleetResult<Option<PlanId>> {
        if let Some(plan) = scope.active_plan {
            return Ok(plan);
        }
        let plan = self
            .subscriptions
            .active_plan_id(scope.organization_id)
            .await?;
        scope.active_plan = Some(plan);
        Ok(plan)
    }

    async fn resolve_cataloged(
        &self,
        scope: &mut ResolutionScope<'_>,
        capability: &Capability,
    ) -> FleetResult<ResolvedCapability> {
        let code = capability.code.as_str();

        if let Some(row) = self
            .store
            .organization_capability(scope.organization_id, &capability.id)
            .await?
        {
            if row.is_expired_at(scope.now) {
                debug!(code, expires_at = ?row.expires_at, "ignoring expired override");
            } else {
                debug!(code, "organization override applies");
                return Ok(ResolvedCapability::from_override(
                    code,
                    capability.value_type,
                    row.value,
                    row.expires_at,
                ));
            }
        }

        if let Some(plan_id) = self.active_plan(scope).await? {
            if let Some(row) = self.store.plan_capability(&plan_id, &capability.id).await? {
                debug!(code, plan = %plan_id, "plan value applies");
                return Ok(ResolvedCapability::from_plan(
                    code,
                    capability.value_type,
                    row.value,
                    plan_id,
                ));
            }
        }

        debug!(code, "falling back to default table");
        Ok(ResolvedCapability::from_default(
            code,
            Some(capability.value_type),
            self.defaults.get(code).cloned(),
        ))
    }
}
