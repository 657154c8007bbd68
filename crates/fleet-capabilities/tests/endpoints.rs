//! Request/response contract of the capability endpoints

mod common;

use common::Fixture;
use fleet_capabilities::{CapabilityEndpoints, ValidateLimitRequest};
use fleet_core::{FleetError, SubscriptionStatus};
use serde_json::json;

fn validate(code: &str, current_count: i64) -> ValidateLimitRequest {
    ValidateLimitRequest {
        capability_code: code.to_string(),
        current_count,
    }
}

#[tokio::test]
async fn validate_limit_reports_remaining() {
    let fx = Fixture::new().await;
    fx.subscribe(fx.plan, SubscriptionStatus::Active, 1).await;
    fx.plan_value("max_devices", 10).await;
    let resolver = fx.resolver();
    let endpoints = CapabilityEndpoints::new(&resolver);

    let response = endpoints
        .validate_limit(&fx.organization, &validate("max_devices", 7))
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({ "can_add": true, "current_count": 7, "limit": 10, "remaining": 3 })
    );

    let response = endpoints
        .validate_limit(&fx.organization, &validate("max_devices", 10))
        .await
        .unwrap();
    assert!(!response.can_add);
    assert_eq!(response.remaining, 0);
}

#[tokio::test]
async fn validate_limit_unlimited_sentinel() {
    let fx = Fixture::new().await;
    fx.override_value("max_devices", 0, None).await;
    let resolver = fx.resolver();

    let response = CapabilityEndpoints::new(&resolver)
        .validate_limit(&fx.organization, &validate("max_devices", 999_999))
        .await
        .unwrap();
    assert!(response.can_add);
    assert_eq!(response.limit, 0);
    assert_eq!(response.remaining, -1);
}

#[tokio::test]
async fn validate_limit_rejects_negative_counts() {
    let fx = Fixture::new().await;
    let resolver = fx.resolver();

    let err = CapabilityEndpoints::new(&resolver)
        .validate_limit(&fx.organization, &validate("max_devices", -3))
        .await
        .unwrap_err();
    assert!(matches!(err, FleetError::Invalid { .. }));
}

#[tokio::test]
async fn capability_view_carries_provenance() {
    let fx = Fixture::new().await;
    fx.subscribe(fx.plan, SubscriptionStatus::Active, 1).await;
    fx.plan_value("max_devices", 10).await;
    let resolver = fx.resolver();

    let view = CapabilityEndpoints::new(&resolver)
        .capability(&fx.organization, "max_devices")
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_value(&view).unwrap(),
        json!({
            "code": "max_devices",
            "value": 10,
            "source": "plan",
            "plan_id": fx.plan.to_string(),
            "expires_at": null,
        })
    );
}

#[tokio::test]
async fn check_and_summary() {
    let fx = Fixture::new().await;
    fx.override_value("api_access", true, None).await;
    let resolver = fx.resolver();
    let endpoints = CapabilityEndpoints::new(&resolver);

    let check = endpoints.check(&fx.organization, "api_access").await.unwrap();
    assert_eq!(
        serde_json::to_value(&check).unwrap(),
        json!({ "capability": "api_access", "enabled": true })
    );
    let check = endpoints.check(&fx.organization, "sms_alerts").await.unwrap();
    assert!(!check.enabled);

    let summary = serde_json::to_value(endpoints.summary(&fx.organization).await.unwrap()).unwrap();
    assert_eq!(summary["limits"]["max_devices"], json!(1));
    assert_eq!(summary["features"]["api_access"], json!(true));
    assert_eq!(summary["features"]["support_tier"], json!("standard"));
}
