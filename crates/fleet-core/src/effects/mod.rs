//! Effect traits
//!
//! Every side-effecting dependency of the capability engine is reached through
//! one of these traits. Handlers live in `fleet-effects`; the domain crate is
//! generic over them so tests can substitute in-memory stores and simulated
//! clocks.
//!
//! # Effect Classification
//!
//! - `CapabilityStoreEffects`, `CapabilityAdminEffects`: Application effects
//!   over the capability tables
//! - `SubscriptionEffects`: Application effect over the subscriptions table
//! - `AuditLogEffects`: Append-only audit log
//! - `PhysicalTimeEffects`: Infrastructure effect, wall clock

pub mod audit;
pub mod storage;
pub mod subscription;
pub mod time;

pub use audit::AuditLogEffects;
pub use storage::{
    CapabilityAdminEffects, CapabilityStoreEffects, OverrideAudit, OverrideChange, StorageError,
};
pub use subscription::SubscriptionEffects;
pub use time::{PhysicalTimeEffects, TimeError};
