//! # Fleet Core - Layer 1: Interface
//!
//! **Purpose**: Shared vocabulary for capability resolution.
//!
//! Every other crate in the workspace depends on this one and nothing here
//! depends on them.
//!
//! # Architecture Constraints
//!
//! - YES Identifier newtypes, persisted record types, audit types
//! - YES The `CapabilityValue` sum type and its legacy column shape
//! - YES Effect traits for storage, subscriptions, audit log and time
//! - NO resolution logic (that's `fleet-capabilities`)
//! - NO handler implementations (that's `fleet-effects`)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Audit log entry types
pub mod audit;

/// Effect traits implemented by storage and clock handlers
pub mod effects;

/// Unified error type
pub mod errors;

/// Identifier newtypes
pub mod identifiers;

/// Persisted records: catalog, plan values, overrides, subscriptions
pub mod records;

/// Typed capability values and the legacy three-column encoding
pub mod value;

pub use audit::{AuditAction, AuditEntry};
pub use errors::{FleetError, FleetResult};
pub use identifiers::{AuditEntryId, CapabilityId, OrganizationId, PlanId, SubscriptionId};
pub use records::{
    Capability, OrganizationCapability, PlanCapability, Subscription, SubscriptionStatus,
};
pub use value::{CapabilityValue, ValueColumns, ValueType};
