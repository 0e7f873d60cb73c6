//! High-level facade over rules, alerts, mutes, and channels.
//!
//! [`AlertManager`] is the single entry point callers use: it validates
//! input, enforces lifecycle transitions, and delegates persistence to
//! the storage layer and evaluation to the engine. Storage-level types
//! (filters, statistics) are re-exported so callers rarely need the
//! storage crate directly.

pub mod error;
pub mod manager;

#[cfg(test)]
mod tests;

pub use error::ManagerError;
pub use manager::{AlertManager, ChannelParams, RuleParams};
pub use vigil_storage::{AlertFilter, AlertStatistics};
