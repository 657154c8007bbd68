//! # Fleet Capabilities - Layer 2: Domain
//!
//! **Purpose**: Compute an organization's effective limits and feature flags.
//!
//! Every capability resolves through a strict three-tier chain:
//!
//! ```text
//! non-expired organization override
//!        ↓ (absent or expired)
//! value assigned by the organization's active plan
//!        ↓ (no active plan, or plan has no value)
//! injected default table
//!        ↓ (code unknown to the table)
//! null
//! ```
//!
//! The first tier holding a row wins outright; values are never merged across
//! tiers. Nothing is cached: each call re-reads storage and the clock so new
//! overrides and expiries take effect on the next read.
//!
//! # Architecture Constraints
//!
//! - YES Resolution, coercion and summary logic
//! - YES Active-subscription selection rule (single source of truth)
//! - YES Administration of overrides and plan values with audit entries
//! - NO handler implementations (generic over `fleet_core::effects`)
//! - NO HTTP server; [`api`] only shapes requests and responses

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Override, plan value and catalog administration with audit trail
pub mod admin;

/// Request/response shapes for the capability endpoints
pub mod api;

/// Engine configuration
pub mod config;

/// Injected default table and well-known capability codes
pub mod defaults;

/// Resolution output type
pub mod resolved;

/// The resolution engine
pub mod resolver;

/// Active-subscription selection
pub mod subscription;

/// Limits/features partition
pub mod summary;

pub use admin::{CapabilityAdministration, MembershipChange, OverrideRequest, OverrideView};
pub use api::{
    CapabilityCheckResponse, CapabilityEndpoints, CapabilityView, ValidateLimitRequest,
    ValidateLimitResponse,
};
pub use config::EngineConfig;
pub use defaults::CapabilityDefaults;
pub use resolved::{CapabilitySource, ResolvedCapability};
pub use resolver::{limit_allows, CapabilityResolver};
pub use subscription::{ActiveSubscriptionPolicy, ActiveSubscriptionProvider, StoredActiveSubscription};
pub use summary::{CapabilitySummary, Classification};
