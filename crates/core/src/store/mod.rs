//! SQLite-backed draw history.
//!
//! Persists the reconciled draw sequence, the current pool distribution
//! and a last-sync marker, with async access via tokio-rusqlite.
//!
//! Every reconciliation step reads, compares and writes inside a single
//! transaction on the one connection. Nothing guards against a second
//! process writing the same file between passes; running several syncs
//! concurrently needs an external lock.

pub mod connection;
pub mod draws;
pub mod migrations;
pub mod pool;
pub mod sync_time;

pub use crate::Error;

pub use connection::HistoryDb;
pub use draws::TrendPeriod;

use async_trait::async_trait;
use serde::Serialize;

use crate::model::{DrawRecord, PoolSnapshot};

/// Result of reconciling the draw sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum DrawSync {
    /// The table was empty or absent; this many records were inserted.
    Created(usize),
    /// The newest round was new and has been appended.
    Appended(String),
    /// The newest round was already stored.
    Unchanged,
}

/// Result of reconciling the pool snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolSync {
    Created,
    Replaced,
    Unchanged,
}

/// Durable home of the draw history.
///
/// The sync pipeline only talks to storage through this trait.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn has_table(&self, name: &str) -> Result<bool, Error>;

    async fn latest_persisted_draw(&self) -> Result<Option<DrawRecord>, Error>;

    async fn synchronize_draws(&self, draws: &[DrawRecord]) -> Result<DrawSync, Error>;

    async fn synchronize_pool(&self, snapshot: &PoolSnapshot) -> Result<PoolSync, Error>;

    async fn record_sync_time(&self, timestamp: &str) -> Result<(), Error>;
}

#[async_trait]
impl HistoryStore for HistoryDb {
    async fn has_table(&self, name: &str) -> Result<bool, Error> {
        HistoryDb::has_table(self, name).await
    }

    async fn latest_persisted_draw(&self) -> Result<Option<DrawRecord>, Error> {
        HistoryDb::latest_persisted_draw(self).await
    }

    async fn synchronize_draws(&self, draws: &[DrawRecord]) -> Result<DrawSync, Error> {
        HistoryDb::synchronize_draws(self, draws).await
    }

    async fn synchronize_pool(&self, snapshot: &PoolSnapshot) -> Result<PoolSync, Error> {
        HistoryDb::synchronize_pool(self, snapshot).await
    }

    async fn record_sync_time(&self, timestamp: &str) -> Result<(), Error> {
        HistoryDb::record_sync_time(self, timestamp).await
    }
}
