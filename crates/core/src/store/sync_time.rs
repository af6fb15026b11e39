//! Last-sync marker.

use super::connection::HistoryDb;
use crate::Error;
use tokio_rusqlite::{params, rusqlite};

impl HistoryDb {
    /// Replace the stored sync marker with `timestamp`.
    pub async fn record_sync_time(&self, timestamp: &str) -> Result<(), Error> {
        let timestamp = timestamp.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.unchecked_transaction()?;
                tx.execute("DELETE FROM sync_time", [])?;
                tx.execute("INSERT INTO sync_time (synced_at) VALUES (?1)", params![timestamp])?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Timestamp of the last completed sync, if any.
    pub async fn last_sync_time(&self) -> Result<Option<String>, Error> {
        self.conn
            .call(|conn| -> Result<Option<String>, Error> {
                match conn.query_row("SELECT synced_at FROM sync_time LIMIT 1", [], |row| row.get(0)) {
                    Ok(ts) => Ok(Some(ts)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }
}
