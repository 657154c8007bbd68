//! Request and response shapes for the capability endpoints
//!
//! The HTTP layer itself lives outside this workspace. It authenticates the
//! caller, extracts the organization and delegates here:
//!
//! ```text
//! GET  /capabilities                  → CapabilityEndpoints::summary
//! GET  /capabilities/{code}           → CapabilityEndpoints::capability
//! POST /capabilities/validate-limit   → CapabilityEndpoints::validate_limit
//! GET  /capabilities/check/{code}     → CapabilityEndpoints::check
//! ```

use chrono::{DateTime, Utc};
use fleet_core::effects::{CapabilityStoreEffects, PhysicalTimeEffects};
use fleet_core::{CapabilityValue, FleetError, FleetResult, OrganizationId, PlanId};
use serde::{Deserialize, Serialize};

use crate::resolved::{CapabilitySource, ResolvedCapability};
use crate::resolver::{limit_allows, CapabilityResolver};
use crate::subscription::ActiveSubscriptionProvider;
use crate::summary::CapabilitySummary;

/// `remaining` value reported for unlimited capabilities
pub const UNLIMITED_REMAINING: i64 = -1;

/// Response of `GET /capabilities/{code}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityView {
    /// Capability code
    pub code: String,
    /// Effective value, null when unresolved
    pub value: Option<CapabilityValue>,
    /// Tier that produced the value
    pub source: CapabilitySource,
    /// Plan that supplied the value
    pub plan_id: Option<PlanId>,
    /// Override expiry
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<ResolvedCapability> for CapabilityView {
    fn from(resolved: ResolvedCapability) -> Self {
        Self {
            code: resolved.code,
            value: resolved.value,
            source: resolved.source,
            plan_id: resolved.plan_id,
            expires_at: resolved.expires_at,
        }
    }
}

/// Body of `POST /capabilities/validate-limit`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateLimitRequest {
    /// Limit capability to check
    pub capability_code: String,
    /// Items the organization already has
    pub current_count: i64,
}

/// Response of `POST /capabilities/validate-limit`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateLimitResponse {
    /// Whether one more item may be added
    pub can_add: bool,
    /// Echo of the request count
    pub current_count: i64,
    /// Resolved limit; zero or below means unlimited
    pub limit: i64,
    /// Items left before the limit, or -1 when unlimited
    pub remaining: i64,
}

impl ValidateLimitResponse {
    /// Build the response for a resolved limit
    pub fn for_limit(limit: i64, current_count: i64) -> Self {
        let remaining = if limit <= 0 {
            UNLIMITED_REMAINING
        } else {
            limit.saturating_sub(current_count).max(0)
        };
        Self {
            can_add: limit_allows(limit, current_count),
            current_count,
            limit,
            remaining,
        }
    }
}

/// Response of `GET /capabilities/check/{code}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityCheckResponse {
    /// Capability code
    pub capability: String,
    /// Whether the feature is enabled
    pub enabled: bool,
}

/// Endpoint facade over a resolver
#[derive(Debug)]
pub struct CapabilityEndpoints<'a, S, A, T> {
    resolver: &'a CapabilityResolver<S, A, T>,
}

impl<'a, S, A, T> CapabilityEndpoints<'a, S, A, T>
where
    S: CapabilityStoreEffects,
    A: ActiveSubscriptionProvider,
    T: PhysicalTimeEffects,
{
    /// Wrap a resolver
    pub fn new(resolver: &'a CapabilityResolver<S, A, T>) -> Self {
        Self { resolver }
    }

    /// `GET /capabilities`
    pub async fn summary(&self, organization_id: &OrganizationId) -> FleetResult<CapabilitySummary> {
        self.resolver.get_capabilities_summary(organization_id).await
    }

    /// `GET /capabilities/{code}`
    pub async fn capability(
        &self,
        organization_id: &OrganizationId,
        code: &str,
    ) -> FleetResult<CapabilityView> {
        Ok(self
            .resolver
            .get_capability(organization_id, code)
            .await?
            .into())
    }

    /// `POST /capabilities/validate-limit`
    ///
    /// A negative `current_count` is rejected as invalid input.
    pub async fn validate_limit(
        &self,
        organization_id: &OrganizationId,
        request: &ValidateLimitRequest,
    ) -> FleetResult<ValidateLimitResponse> {
        if request.current_count < 0 {
            return Err(FleetError::invalid(format!(
                "current_count must not be negative, got {}",
                request.current_count
            )));
        }
        let limit = self
            .resolver
            .get_limit(organization_id, &request.capability_code)
            .await?;
        Ok(ValidateLimitResponse::for_limit(limit, request.current_count))
    }

    /// `GET /capabilities/check/{code}`
    pub async fn check(
        &self,
        organization_id: &OrganizationId,
        code: &str,
    ) -> FleetResult<CapabilityCheckResponse> {
        Ok(CapabilityCheckResponse {
            capability: code.to_string(),
            enabled: self.resolver.has_capability(organization_id, code).await?,
        })
    }
}
