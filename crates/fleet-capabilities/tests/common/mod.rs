//! Shared fixture for capability integration tests
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use fleet_capabilities::{
    CapabilityAdministration, CapabilityDefaults, CapabilityResolver, StoredActiveSubscription,
};
use fleet_core::effects::SubscriptionEffects;
use fleet_core::{
    CapabilityValue, OrganizationId, PlanId, Subscription, SubscriptionId, SubscriptionStatus,
    ValueType,
};
use fleet_effects::{MemoryCapabilityStore, SimulatedTimeHandler};

pub type Resolver = CapabilityResolver<
    MemoryCapabilityStore,
    StoredActiveSubscription<MemoryCapabilityStore>,
    SimulatedTimeHandler,
>;

pub type Admin = CapabilityAdministration<MemoryCapabilityStore, SimulatedTimeHandler>;

pub const ADMIN: &str = "admin@fleet.test";

pub struct Fixture {
    pub store: MemoryCapabilityStore,
    pub clock: SimulatedTimeHandler,
    pub admin: Admin,
    pub organization: OrganizationId,
    pub plan: PlanId,
}

impl Fixture {
    /// Catalog with `max_devices`, `max_units` (int), `api_access` (bool) and
    /// `support_tier` (text); one organization and one plan, not yet subscribed.
    pub async fn new() -> Self {
        let store = MemoryCapabilityStore::new();
        let clock = SimulatedTimeHandler::new(Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap());
        let admin = CapabilityAdministration::new(store.clone(), clock.clone());

        for (code, value_type) in [
            ("max_devices", ValueType::Int),
            ("max_units", ValueType::Int),
            ("api_access", ValueType::Bool),
            ("support_tier", ValueType::Text),
        ] {
            admin
                .define_capability(code, value_type, &format!("{code} capability"))
                .await
                .unwrap();
        }

        Self {
            store,
            clock,
            admin,
            organization: OrganizationId::new_random(),
            plan: PlanId::new_random(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.current()
    }

    pub fn resolver(&self) -> Resolver {
        self.resolver_with(CapabilityDefaults::standard())
    }

    pub fn resolver_with(&self, defaults: CapabilityDefaults) -> Resolver {
        CapabilityResolver::new(
            self.store.clone(),
            StoredActiveSubscription::new(self.store.clone()),
            self.clock.clone(),
            defaults,
        )
    }

    /// Subscribe the organization to `plan`, started `days_ago` days before now
    pub async fn subscribe(&self, plan: PlanId, status: SubscriptionStatus, days_ago: i64) {
        self.store
            .upsert_subscription(Subscription {
                id: SubscriptionId::new_random(),
                organization_id: self.organization,
                plan_id: plan,
                status,
                started_at: self.now() - Duration::days(days_ago),
            })
            .await
            .unwrap();
    }

    pub async fn plan_value(&self, code: &str, value: impl Into<CapabilityValue>) {
        self.admin
            .assign_plan_capability(self.plan, code, value.into())
            .await
            .unwrap();
    }

    pub async fn override_value(
        &self,
        code: &str,
        value: impl Into<CapabilityValue>,
        expires_at: Option<DateTime<Utc>>,
    ) {
        self.admin
            .set_override(
                ADMIN,
                fleet_capabilities::OverrideRequest {
                    organization_id: self.organization,
                    code: code.to_string(),
                    value: value.into(),
                    reason: None,
                    expires_at,
                },
            )
            .await
            .unwrap();
    }
}
