//! Wall-clock time effects.
//!
//! Override expiry is evaluated against this clock on every resolution, so
//! handlers must never cache the value they return.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error type for time operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum TimeError {
    #[error("Clock unavailable: {reason}")]
    ClockUnavailable { reason: String },
}

#[async_trait]
pub trait PhysicalTimeEffects: Send + Sync {
    /// Current UTC instant
    async fn now(&self) -> Result<DateTime<Utc>, TimeError>;
}

/// Blanket implementation for Arc<T> where T: PhysicalTimeEffects
#[async_trait]
impl<T: PhysicalTimeEffects + ?Sized> PhysicalTimeEffects for std::sync::Arc<T> {
    async fn now(&self) -> Result<DateTime<Utc>, TimeError> {
        (**self).now().await
    }
}
