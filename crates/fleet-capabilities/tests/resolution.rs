//! Resolution chain: override → plan → default

mod common;

use chrono::Duration;
use common::Fixture;
use fleet_capabilities::{CapabilityDefaults, CapabilitySource};
use fleet_core::effects::CapabilityStoreEffects;
use fleet_core::{CapabilityValue, FleetError, SubscriptionStatus, ValueColumns};
use fleet_effects::{OrganizationCapabilityRow, PlanCapabilityRow};

#[tokio::test]
async fn organization_override_wins_over_plan() {
    let fx = Fixture::new().await;
    fx.plan_value("max_devices", 10).await;
    fx.subscribe(fx.plan, SubscriptionStatus::Active, 30).await;
    fx.override_value("max_devices", 25, None).await;

    let resolved = fx
        .resolver()
        .get_capability(&fx.organization, "max_devices")
        .await
        .unwrap();
    assert_eq!(resolved.value, Some(CapabilityValue::Int(25)));
    assert_eq!(resolved.source, CapabilitySource::Organization);
    assert_eq!(resolved.plan_id, None);
    assert_eq!(resolved.expires_at, None);
}

#[tokio::test]
async fn plan_value_applies_once_override_is_removed() {
    let fx = Fixture::new().await;
    fx.plan_value("max_devices", 10).await;
    fx.subscribe(fx.plan, SubscriptionStatus::Active, 30).await;
    fx.override_value("max_devices", 25, None).await;
    let resolver = fx.resolver();

    assert!(fx
        .admin
        .clear_override(common::ADMIN, fx.organization, "max_devices")
        .await
        .unwrap());

    let resolved = resolver
        .get_capability(&fx.organization, "max_devices")
        .await
        .unwrap();
    assert_eq!(resolved.value, Some(CapabilityValue::Int(10)));
    assert_eq!(resolved.source, CapabilitySource::Plan);
    assert_eq!(resolved.plan_id, Some(fx.plan));
}

#[tokio::test]
async fn default_applies_without_subscription_or_override() {
    let fx = Fixture::new().await;
    fx.plan_value("max_devices", 10).await;

    let resolved = fx
        .resolver()
        .get_capability(&fx.organization, "max_devices")
        .await
        .unwrap();
    assert_eq!(resolved.value, Some(CapabilityValue::Int(1)));
    assert_eq!(resolved.source, CapabilitySource::Default);
    assert_eq!(resolved.plan_id, None);
}

#[tokio::test]
async fn expired_override_falls_through_to_plan() {
    let fx = Fixture::new().await;
    fx.plan_value("max_devices", 10).await;
    fx.subscribe(fx.plan, SubscriptionStatus::Active, 30).await;

    let capability = fx.store.capability_by_code("max_devices").await.unwrap().unwrap();
    let yesterday = fx.now() - Duration::days(1);
    fx.store
        .push_override_row(OrganizationCapabilityRow {
            organization_id: fx.organization,
            capability_id: capability.id,
            columns: ValueColumns::from_value(&CapabilityValue::Int(100)),
            reason: Some("launch promotion".to_string()),
            expires_at: Some(yesterday),
            created_at: yesterday - Duration::days(30),
            updated_at: yesterday - Duration::days(30),
        })
        .await;

    let resolved = fx
        .resolver()
        .get_capability(&fx.organization, "max_devices")
        .await
        .unwrap();
    assert_eq!(resolved.value, Some(CapabilityValue::Int(10)));
    assert_eq!(resolved.source, CapabilitySource::Plan);
}

#[tokio::test]
async fn expiry_is_evaluated_on_every_call() {
    let fx = Fixture::new().await;
    fx.plan_value("max_devices", 10).await;
    fx.subscribe(fx.plan, SubscriptionStatus::Active, 30).await;
    let expires_at = fx.now() + Duration::hours(1);
    fx.override_value("max_devices", 50, Some(expires_at)).await;
    let resolver = fx.resolver();

    let before = resolver.get_capability(&fx.organization, "max_devices").await.unwrap();
    assert_eq!(before.source, CapabilitySource::Organization);
    assert_eq!(before.expires_at, Some(expires_at));

    fx.clock.set(expires_at);
    let at_expiry = resolver.get_capability(&fx.organization, "max_devices").await.unwrap();
    assert_eq!(at_expiry.source, CapabilitySource::Organization);

    fx.clock.advance(Duration::seconds(1));
    let after = resolver.get_capability(&fx.organization, "max_devices").await.unwrap();
    assert_eq!(after.source, CapabilitySource::Plan);
    assert_eq!(after.value, Some(CapabilityValue::Int(10)));
}

#[tokio::test]
async fn uncataloged_default_is_returned_literally() {
    let fx = Fixture::new().await;
    let defaults = CapabilityDefaults::standard().with("max_drivers", CapabilityValue::Int(4));

    let resolved = fx
        .resolver_with(defaults)
        .get_capability(&fx.organization, "max_drivers")
        .await
        .unwrap();
    assert_eq!(resolved.source, CapabilitySource::Default);
    assert_eq!(resolved.value, Some(CapabilityValue::Int(4)));
    assert_eq!(resolved.declared_type, None);
}

#[tokio::test]
async fn unknown_code_resolves_to_absent_default() {
    let fx = Fixture::new().await;
    let resolver = fx.resolver();

    let resolved = resolver
        .get_capability(&fx.organization, "teleportation")
        .await
        .unwrap();
    assert_eq!(resolved.source, CapabilitySource::Default);
    assert_eq!(resolved.value, None);
    assert!(!resolver.has_capability(&fx.organization, "teleportation").await.unwrap());
    assert_eq!(resolver.get_limit(&fx.organization, "teleportation").await.unwrap(), 0);
}

#[tokio::test]
async fn empty_override_row_does_not_merge_with_plan() {
    let fx = Fixture::new().await;
    fx.plan_value("max_units", 8).await;
    fx.subscribe(fx.plan, SubscriptionStatus::Active, 3).await;

    let capability = fx.store.capability_by_code("max_units").await.unwrap().unwrap();
    fx.store
        .push_override_row(OrganizationCapabilityRow {
            organization_id: fx.organization,
            capability_id: capability.id,
            columns: ValueColumns::default(),
            reason: None,
            expires_at: None,
            created_at: fx.now(),
            updated_at: fx.now(),
        })
        .await;

    let resolver = fx.resolver();
    let resolved = resolver.get_capability(&fx.organization, "max_units").await.unwrap();
    assert_eq!(resolved.source, CapabilitySource::Organization);
    assert_eq!(resolved.value, None);
    assert_eq!(resolver.get_limit(&fx.organization, "max_units").await.unwrap(), 0);
}

#[tokio::test]
async fn malformed_plan_row_degrades_to_unlimited() {
    let fx = Fixture::new().await;
    fx.subscribe(fx.plan, SubscriptionStatus::Active, 3).await;
    let capability = fx.store.capability_by_code("max_devices").await.unwrap().unwrap();
    fx.store
        .put_plan_row(PlanCapabilityRow {
            plan_id: fx.plan,
            capability_id: capability.id,
            columns: ValueColumns::default(),
        })
        .await;

    let resolver = fx.resolver();
    let resolved = resolver.get_capability(&fx.organization, "max_devices").await.unwrap();
    assert_eq!(resolved.source, CapabilitySource::Plan);
    assert_eq!(resolved.value, None);
    assert!(resolver
        .validate_limit(&fx.organization, "max_devices", 10_000)
        .await
        .unwrap());
}

#[tokio::test]
async fn only_eligible_subscriptions_select_the_plan() {
    let fx = Fixture::new().await;
    fx.plan_value("max_devices", 10).await;
    let resolver = fx.resolver();

    fx.subscribe(fx.plan, SubscriptionStatus::Cancelled, 1).await;
    let resolved = resolver.get_capability(&fx.organization, "max_devices").await.unwrap();
    assert_eq!(resolved.source, CapabilitySource::Default);

    fx.subscribe(fx.plan, SubscriptionStatus::Trial, 5).await;
    let resolved = resolver.get_capability(&fx.organization, "max_devices").await.unwrap();
    assert_eq!(resolved.source, CapabilitySource::Plan);
}

#[tokio::test]
async fn most_recent_active_subscription_picks_the_plan() {
    let fx = Fixture::new().await;
    let old_plan = fleet_core::PlanId::new_random();
    fx.admin
        .assign_plan_capability(old_plan, "max_devices", CapabilityValue::Int(3))
        .await
        .unwrap();
    fx.plan_value("max_devices", 40).await;
    fx.subscribe(old_plan, SubscriptionStatus::Active, 400).await;
    fx.subscribe(fx.plan, SubscriptionStatus::Active, 10).await;

    let resolved = fx
        .resolver()
        .get_capability(&fx.organization, "max_devices")
        .await
        .unwrap();
    assert_eq!(resolved.plan_id, Some(fx.plan));
    assert_eq!(resolved.value, Some(CapabilityValue::Int(40)));
}

#[tokio::test]
async fn feature_and_limit_coercions() {
    let fx = Fixture::new().await;
    fx.subscribe(fx.plan, SubscriptionStatus::Active, 1).await;
    fx.plan_value("api_access", true).await;
    fx.plan_value("support_tier", "Enabled").await;
    fx.plan_value("max_units", 0).await;
    let resolver = fx.resolver();

    assert!(resolver.has_capability(&fx.organization, "api_access").await.unwrap());
    assert!(resolver.has_capability(&fx.organization, "support_tier").await.unwrap());
    assert!(!resolver.has_capability(&fx.organization, "max_units").await.unwrap());
    assert_eq!(resolver.get_limit(&fx.organization, "api_access").await.unwrap(), 1);
    assert_eq!(resolver.get_limit(&fx.organization, "support_tier").await.unwrap(), 0);
}

#[tokio::test]
async fn limit_boundary_is_strict() {
    let fx = Fixture::new().await;
    fx.subscribe(fx.plan, SubscriptionStatus::Active, 1).await;
    fx.plan_value("max_devices", 10).await;
    let resolver = fx.resolver();

    assert!(resolver.validate_limit(&fx.organization, "max_devices", 9).await.unwrap());
    assert!(!resolver.validate_limit(&fx.organization, "max_devices", 10).await.unwrap());
}

#[tokio::test]
async fn non_positive_limit_is_unlimited() {
    let fx = Fixture::new().await;
    fx.override_value("max_devices", -1, None).await;
    fx.override_value("max_units", 0, None).await;
    let resolver = fx.resolver();

    for code in ["max_devices", "max_units"] {
        assert!(resolver.validate_limit(&fx.organization, code, 999_999).await.unwrap());
    }
}

#[tokio::test]
async fn repeated_resolution_is_identical() {
    let fx = Fixture::new().await;
    fx.subscribe(fx.plan, SubscriptionStatus::Active, 1).await;
    fx.plan_value("max_devices", 10).await;
    fx.override_value("api_access", true, Some(fx.now() + Duration::days(7))).await;
    let resolver = fx.resolver();

    for code in ["max_devices", "api_access", "support_tier", "nonexistent"] {
        let first = resolver.get_capability(&fx.organization, code).await.unwrap();
        let second = resolver.get_capability(&fx.organization, code).await.unwrap();
        assert_eq!(first, second);
    }
}

#[tokio::test]
async fn all_capabilities_include_uncataloged_defaults() {
    let fx = Fixture::new().await;
    fx.subscribe(fx.plan, SubscriptionStatus::Active, 1).await;
    fx.plan_value("max_devices", 10).await;
    fx.override_value("api_access", true, None).await;

    let all = fx.resolver().get_all_capabilities(&fx.organization).await.unwrap();

    assert_eq!(all["max_devices"].source, CapabilitySource::Plan);
    assert_eq!(all["api_access"].source, CapabilitySource::Organization);
    assert_eq!(all["support_tier"].source, CapabilitySource::Default);
    // Not cataloged in the fixture, only present in the standard defaults.
    assert_eq!(all["max_geofences"].value, Some(CapabilityValue::Int(3)));
    assert_eq!(all["max_geofences"].source, CapabilitySource::Default);
    assert_eq!(all.len(), CapabilityDefaults::standard().iter().count());
}

#[tokio::test]
async fn summary_partitions_limits_and_features() {
    let fx = Fixture::new().await;
    fx.subscribe(fx.plan, SubscriptionStatus::Active, 1).await;
    fx.plan_value("max_devices", 10).await;
    fx.plan_value("support_tier", "gold").await;
    fx.override_value("api_access", true, None).await;

    let summary = fx
        .resolver()
        .get_capabilities_summary(&fx.organization)
        .await
        .unwrap();

    assert_eq!(summary.limits["max_devices"], 10);
    assert_eq!(summary.limits["max_units"], 1);
    assert_eq!(summary.limits["history_retention_days"], 7);
    assert_eq!(summary.features["api_access"], serde_json::json!(true));
    assert_eq!(summary.features["support_tier"], serde_json::json!("gold"));
    assert_eq!(summary.features["sms_alerts"], serde_json::json!(false));
    assert!(!summary.features.contains_key("max_devices"));
}

#[tokio::test]
async fn storage_failures_propagate() {
    let fx = Fixture::new().await;
    let resolver = fx.resolver();
    fx.store.set_unavailable(true);

    let err = resolver
        .get_capability(&fx.organization, "max_devices")
        .await
        .unwrap_err();
    assert!(matches!(err, FleetError::Storage { .. }));
}

#[tokio::test]
async fn clock_failures_propagate() {
    let fx = Fixture::new().await;
    fx.plan_value("max_devices", 10).await;
    let resolver = fx.resolver();
    fx.clock.set_unavailable(true);

    let err = resolver
        .get_capability(&fx.organization, "max_devices")
        .await
        .unwrap_err();
    assert!(matches!(err, FleetError::Time { .. }));
}
