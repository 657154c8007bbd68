//! # Fleet Effects - Layer 3: Handlers
//!
//! Implementations of the `fleet_core::effects` traits.
//!
//! - [`MemoryCapabilityStore`]: every table behind one lock, so an override
//!   mutation and its audit entry commit atomically
//! - [`RealTimeHandler`] / [`SimulatedTimeHandler`]: wall clock and a settable
//!   clock for tests
//! - [`StoreSnapshot`]: JSON import/export of the tables in their relational
//!   row shape

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// In-memory capability, subscription and audit tables
pub mod memory;

/// JSON snapshot format
pub mod snapshot;

/// Clock handlers
pub mod time;

pub use memory::MemoryCapabilityStore;
pub use snapshot::{OrganizationCapabilityRow, PlanCapabilityRow, StoreSnapshot};
pub use time::{RealTimeHandler, SimulatedTimeHandler};
