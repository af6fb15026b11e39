//! Pool distribution table. Holds exactly one row once created.

use super::PoolSync;
use super::connection::{HistoryDb, table_exists};
use crate::Error;
use crate::model::{BUCKET_COUNT, PoolSnapshot};
use tokio_rusqlite::{params, rusqlite};

pub(crate) const POOL_TABLE: &str = "pool";

const CREATE_POOL: &str = "CREATE TABLE pool (
    date TEXT NOT NULL CHECK (length(date) <= 20),
    lv1 INTEGER NOT NULL,
    lv2 INTEGER NOT NULL,
    lv3 INTEGER NOT NULL,
    lv4 INTEGER NOT NULL,
    lv5 INTEGER NOT NULL,
    lv6 INTEGER NOT NULL,
    lv7 INTEGER NOT NULL,
    lv8 INTEGER NOT NULL,
    lv9 INTEGER NOT NULL,
    lv10 INTEGER NOT NULL,
    lv11 INTEGER NOT NULL,
    lv12 INTEGER NOT NULL,
    lv13 INTEGER NOT NULL,
    lv14 INTEGER NOT NULL,
    total INTEGER NOT NULL
)";

const COLUMNS: &str = "date, lv1, lv2, lv3, lv4, lv5, lv6, lv7, lv8, lv9, lv10, lv11, lv12, lv13, lv14, total";

fn stored_snapshot(conn: &rusqlite::Connection) -> rusqlite::Result<Option<PoolSnapshot>> {
    let result = conn.query_row(&format!("SELECT {COLUMNS} FROM pool LIMIT 1"), [], |row| {
        let mut buckets = [0u32; BUCKET_COUNT];
        for (i, slot) in buckets.iter_mut().enumerate() {
            *slot = row.get(i + 1)?;
        }
        Ok(PoolSnapshot { date: row.get(0)?, buckets, total: row.get(BUCKET_COUNT + 1)? })
    });
    match result {
        Ok(snapshot) => Ok(Some(snapshot)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

fn insert_snapshot(conn: &rusqlite::Connection, s: &PoolSnapshot) -> rusqlite::Result<()> {
    let b = &s.buckets;
    conn.execute(
        &format!("INSERT INTO pool ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"),
        params![
            s.date, b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7], b[8], b[9], b[10], b[11], b[12], b[13], s.total
        ],
    )?;
    Ok(())
}

impl HistoryDb {
    /// The stored pool snapshot, if any.
    pub async fn latest_pool_snapshot(&self) -> Result<Option<PoolSnapshot>, Error> {
        self.conn
            .call(|conn| -> Result<Option<PoolSnapshot>, Error> {
                if !table_exists(conn, POOL_TABLE)? {
                    return Ok(None);
                }
                Ok(stored_snapshot(conn)?)
            })
            .await
            .map_err(Error::from)
    }

    /// Replace the stored snapshot when `snapshot` is from a different date.
    pub async fn synchronize_pool(&self, snapshot: &PoolSnapshot) -> Result<PoolSync, Error> {
        let snapshot = snapshot.clone();

        self.conn
            .call(move |conn| -> Result<PoolSync, Error> {
                let tx = conn.unchecked_transaction()?;

                let outcome = if !table_exists(&tx, POOL_TABLE)? {
                    tx.execute_batch(CREATE_POOL)?;
                    insert_snapshot(&tx, &snapshot)?;
                    PoolSync::Created
                } else {
                    match stored_snapshot(&tx)? {
                        Some(stored) if stored.date == snapshot.date => PoolSync::Unchanged,
                        Some(_) => {
                            tx.execute("DELETE FROM pool", [])?;
                            insert_snapshot(&tx, &snapshot)?;
                            PoolSync::Replaced
                        }
                        None => {
                            insert_snapshot(&tx, &snapshot)?;
                            PoolSync::Created
                        }
                    }
                };

                tx.commit()?;
                Ok(outcome)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(date: &str, first: u32) -> PoolSnapshot {
        PoolSnapshot {
            date: date.to_string(),
            buckets: [first, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14],
            total: 200_000,
        }
    }

    async fn row_count(db: &HistoryDb) -> i64 {
        db.conn
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM pool", [], |row| row.get(0)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_sync_creates_table() {
        let db = HistoryDb::open_in_memory().await.unwrap();
        assert!(db.latest_pool_snapshot().await.unwrap().is_none());

        let outcome = db.synchronize_pool(&snapshot("Jan 5, 2022", 1)).await.unwrap();
        assert_eq!(outcome, PoolSync::Created);
        assert_eq!(db.latest_pool_snapshot().await.unwrap(), Some(snapshot("Jan 5, 2022", 1)));
        assert_eq!(row_count(&db).await, 1);
    }

    #[tokio::test]
    async fn test_same_date_is_idempotent() {
        let db = HistoryDb::open_in_memory().await.unwrap();
        db.synchronize_pool(&snapshot("Jan 5, 2022", 1)).await.unwrap();

        // Same date with different counts still counts as the same snapshot.
        let outcome = db.synchronize_pool(&snapshot("Jan 5, 2022", 99)).await.unwrap();
        assert_eq!(outcome, PoolSync::Unchanged);
        assert_eq!(db.latest_pool_snapshot().await.unwrap(), Some(snapshot("Jan 5, 2022", 1)));
    }

    #[tokio::test]
    async fn test_new_date_replaces_row() {
        let db = HistoryDb::open_in_memory().await.unwrap();
        db.synchronize_pool(&snapshot("Jan 5, 2022", 1)).await.unwrap();

        let outcome = db.synchronize_pool(&snapshot("Jan 19, 2022", 50)).await.unwrap();
        assert_eq!(outcome, PoolSync::Replaced);
        assert_eq!(row_count(&db).await, 1);

        let stored = db.latest_pool_snapshot().await.unwrap().unwrap();
        assert_eq!(stored.date, "Jan 19, 2022");
        assert_eq!(stored.buckets[0], 50);
        assert_eq!(stored.total, 200_000);
    }
}
