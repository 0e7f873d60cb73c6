use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};

pub mod alert;
pub mod channel;
pub mod mute;
pub mod rule;

pub use alert::{AlertFilter, AlertStatistics};

/// Unified access layer for the alerting database.
///
/// All methods are `async fn` over SeaORM. One `Store` is shared between
/// the evaluation engine, the dispatcher and the manager facade, so it
/// must stay cheap to clone behind an `Arc`.
pub struct Store {
    pub(crate) db: DatabaseConnection,
}

impl Store {
    /// Connect and initialize the database.
    ///
    /// `db_url` is a full SeaORM connection URL, e.g.
    /// `sqlite:///data/vigil.db?mode=rwc`. Pending migrations are applied
    /// before the store is handed out.
    pub async fn new(db_url: &str) -> Result<Self> {
        let db = Database::connect(db_url).await?;

        // WAL mode only applies to SQLite
        if db_url.starts_with("sqlite:") {
            db.execute_unprepared("PRAGMA journal_mode=WAL;").await?;
        }

        Migrator::up(&db, None).await?;
        tracing::info!(db_url = %db_url, "Initialized alert store");

        Ok(Self { db })
    }

    pub(crate) fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}
