//! Shared domain types for the vigil alerting engine.
//!
//! Everything the other crates agree on lives here: the alert/rule/mute
//! data model, the typed notification channel configs, and the Snowflake
//! ID generator.

pub mod channel;
pub mod id;
pub mod types;
