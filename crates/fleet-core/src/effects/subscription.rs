//! Subscription table effects.

use async_trait::async_trait;

use crate::effects::StorageError;
use crate::{OrganizationId, Subscription};

/// Access to an organization's subscription history
#[async_trait]
pub trait SubscriptionEffects: Send + Sync {
    /// Every subscription the organization has ever held
    async fn subscriptions_for_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Subscription>, StorageError>;

    /// Insert or replace a subscription by id
    async fn upsert_subscription(&self, subscription: Subscription) -> Result<(), StorageError>;
}
