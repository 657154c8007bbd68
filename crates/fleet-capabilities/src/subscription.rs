//! Active-subscription selection
//!
//! This is the only place that decides which subscription governs an
//! organization. The capability resolver and billing summaries both go through
//! [`ActiveSubscriptionProvider`] rather than re-deriving the rule.

use async_trait::async_trait;
use fleet_core::effects::SubscriptionEffects;
use fleet_core::{FleetResult, OrganizationId, PlanId, Subscription, SubscriptionStatus};
use std::collections::BTreeSet;

/// Source of an organization's active subscription
#[async_trait]
pub trait ActiveSubscriptionProvider: Send + Sync {
    /// The subscription currently governing the organization, if any
    async fn active_subscription(
        &self,
        organization_id: &OrganizationId,
    ) -> FleetResult<Option<Subscription>>;

    /// Plan of the active subscription, if any
    async fn active_plan_id(&self, organization_id: &OrganizationId) -> FleetResult<Option<PlanId>> {
        Ok(self
            .active_subscription(organization_id)
            .await?
            .map(|subscription| subscription.plan_id))
    }
}

/// Which statuses count as active, and how to choose among them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSubscriptionPolicy {
    eligible: BTreeSet<SubscriptionStatus>,
}

impl Default for ActiveSubscriptionPolicy {
    fn default() -> Self {
        Self::new([SubscriptionStatus::Active, SubscriptionStatus::Trial])
    }
}

impl ActiveSubscriptionPolicy {
    /// Policy treating `statuses` as eligible
    pub fn new(statuses: impl IntoIterator<Item = SubscriptionStatus>) -> Self {
        Self {
            eligible: statuses.into_iter().collect(),
        }
    }

    /// Whether a status is eligible
    pub fn is_eligible(&self, status: SubscriptionStatus) -> bool {
        self.eligible.contains(&status)
    }

    /// Pick the eligible subscription with the latest `started_at`.
    ///
    /// Equal start times go to the larger subscription id so the choice is
    /// stable regardless of storage order.
    pub fn select<'a>(&self, subscriptions: &'a [Subscription]) -> Option<&'a Subscription> {
        subscriptions
            .iter()
            .filter(|subscription| self.is_eligible(subscription.status))
            .max_by(|a, b| {
                a.started_at
                    .cmp(&b.started_at)
                    .then_with(|| a.id.cmp(&b.id))
            })
    }
}

/// Canonical provider reading the subscriptions table
#[derive(Debug, Clone)]
pub struct StoredActiveSubscription<S> {
    store: S,
    policy: ActiveSubscriptionPolicy,
}

impl<S: SubscriptionEffects> StoredActiveSubscription<S> {
    /// Provider using the default policy (ACTIVE and TRIAL)
    pub fn new(store: S) -> Self {
        Self::with_policy(store, ActiveSubscriptionPolicy::default())
    }

    /// Provider using an explicit policy
    pub fn with_policy(store: S, policy: ActiveSubscriptionPolicy) -> Self {
        Self { store, policy }
    }
}

#[async_trait]
impl<S: SubscriptionEffects> ActiveSubscriptionProvider for StoredActiveSubscription<S> {
    async fn active_subscription(
        &self,
        organization_id: &OrganizationId,
    ) -> FleetResult<Option<Subscription>> {
        let subscriptions = self
            .store
            .subscriptions_for_organization(organization_id)
            .await?;
        let active = self.policy.select(&subscriptions).cloned();
        tracing::debug!(
            organization = %organization_id,
            candidates = subscriptions.len(),
            active = ?active.as_ref().map(|s| s.id),
            "selected active subscription"
        );
        Ok(active)
    }
}
