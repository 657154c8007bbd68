//! Clock handlers

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use fleet_core::effects::{PhysicalTimeEffects, TimeError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// System wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct RealTimeHandler;

impl RealTimeHandler {
    /// Create a new real time handler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PhysicalTimeEffects for RealTimeHandler {
    async fn now(&self) -> Result<DateTime<Utc>, TimeError> {
        Ok(Utc::now())
    }
}

/// Settable clock for tests and replay.
///
/// Clones share the same underlying instant.
#[derive(Debug, Clone)]
pub struct SimulatedTimeHandler {
    current: Arc<Mutex<DateTime<Utc>>>,
    unavailable: Arc<AtomicBool>,
}

impl SimulatedTimeHandler {
    /// Start the clock at `start`
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Move the clock forward (or backward, for negative durations)
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        *current += by;
    }

    /// Jump to an absolute instant
    pub fn set(&self, to: DateTime<Utc>) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }

    /// Current simulated instant
    pub fn current(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `now` fail with `TimeError::ClockUnavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl PhysicalTimeEffects for SimulatedTimeHandler {
    async fn now(&self) -> Result<DateTime<Utc>, TimeError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(TimeError::ClockUnavailable {
                reason: "simulated clock switched off".to_string(),
            });
        }
        Ok(self.current())
    }
}
