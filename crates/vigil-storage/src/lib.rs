//! Relational persistence for alert rules, alerts, notification channels
//! and mutes.
//!
//! [`Store`] is the single access layer; all methods are `async fn` over
//! SeaORM. SQLite (WAL mode) is the default backend, but any SeaORM
//! connection URL works. Schema migrations run automatically on connect.

pub mod entities;
pub mod store;


pub use store::{AlertFilter, AlertStatistics, Store};
