//! Draw table reconciliation and queries.
//!
//! The draw table is append-only. A sync pass either populates it from
//! scratch or appends the single newest round.

use super::connection::{HistoryDb, table_exists};
use super::DrawSync;
use crate::Error;
use crate::model::{DrawRecord, ProgramScope};
use tokio_rusqlite::{params, rusqlite};

pub(crate) const DRAWS_TABLE: &str = "draws";

const CREATE_DRAWS: &str = "CREATE TABLE draws (
    round TEXT NOT NULL CHECK (length(round) <= 10),
    date TEXT NOT NULL CHECK (length(date) <= 20),
    score INTEGER NOT NULL,
    invitations INTEGER NOT NULL,
    program_scope TEXT NOT NULL
)";

const SELECT_COLUMNS: &str = "SELECT round, date, score, invitations, program_scope FROM draws";

/// How many of the most recent general draws a trend covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendPeriod {
    Month,
    Quarter,
    HalfYear,
    Annual,
    All,
}

impl TrendPeriod {
    /// Number of draws, assuming the usual two general draws per month.
    pub fn limit(&self) -> Option<usize> {
        match self {
            TrendPeriod::Month => Some(2),
            TrendPeriod::Quarter => Some(6),
            TrendPeriod::HalfYear => Some(12),
            TrendPeriod::Annual => Some(24),
            TrendPeriod::All => None,
        }
    }
}

type RawDraw = (String, String, u32, u32, String);

fn read_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawDraw> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn into_record((round, date, score, invitations, scope): RawDraw) -> Result<DrawRecord, Error> {
    let program_scope = scope.parse::<ProgramScope>().map_err(Error::CorruptRow)?;
    Ok(DrawRecord { round, date, score, invitations, program_scope })
}

fn latest_draw(conn: &rusqlite::Connection) -> Result<Option<DrawRecord>, Error> {
    let result = conn.query_row(&format!("{SELECT_COLUMNS} ORDER BY rowid DESC LIMIT 1"), [], read_raw);
    match result {
        Ok(raw) => into_record(raw).map(Some),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn insert_draw(conn: &rusqlite::Connection, draw: &DrawRecord) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO draws (round, date, score, invitations, program_scope) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![draw.round, draw.date, draw.score, draw.invitations, draw.program_scope.as_str()],
    )?;
    Ok(())
}

fn insert_all(conn: &rusqlite::Connection, draws: &[DrawRecord]) -> rusqlite::Result<DrawSync> {
    for draw in draws {
        insert_draw(conn, draw)?;
    }
    Ok(DrawSync::Created(draws.len()))
}

fn query_draws(
    conn: &rusqlite::Connection, sql: &str, bind: &[&dyn rusqlite::ToSql],
) -> Result<Vec<DrawRecord>, Error> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(bind, read_raw)?;
    let mut draws = Vec::new();
    for raw in rows {
        draws.push(into_record(raw?)?);
    }
    Ok(draws)
}

impl HistoryDb {
    /// Most recently inserted draw, or None if the table is absent or empty.
    pub async fn latest_persisted_draw(&self) -> Result<Option<DrawRecord>, Error> {
        self.conn
            .call(|conn| -> Result<Option<DrawRecord>, Error> {
                if !table_exists(conn, DRAWS_TABLE)? {
                    return Ok(None);
                }
                latest_draw(conn)
            })
            .await
            .map_err(Error::from)
    }

    /// Reconcile the full extracted sequence with the stored history.
    ///
    /// A missing (or empty) table receives every record in order. Otherwise
    /// only the newest record is considered, and it is inserted when its
    /// round differs from the stored latest.
    pub async fn synchronize_draws(&self, draws: &[DrawRecord]) -> Result<DrawSync, Error> {
        let Some(newest) = draws.last().cloned() else {
            return Ok(DrawSync::Unchanged);
        };
        let draws = draws.to_vec();

        self.conn
            .call(move |conn| -> Result<DrawSync, Error> {
                let tx = conn.unchecked_transaction()?;

                let outcome = if !table_exists(&tx, DRAWS_TABLE)? {
                    tx.execute_batch(CREATE_DRAWS)?;
                    insert_all(&tx, &draws)?
                } else {
                    match latest_draw(&tx)? {
                        None => insert_all(&tx, &draws)?,
                        Some(stored) if stored.round == newest.round => DrawSync::Unchanged,
                        Some(_) => {
                            insert_draw(&tx, &newest)?;
                            DrawSync::Appended(newest.round)
                        }
                    }
                };

                tx.commit()?;
                Ok(outcome)
            })
            .await
            .map_err(Error::from)
    }

    /// All stored draws in insertion order.
    pub async fn draws(&self) -> Result<Vec<DrawRecord>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<DrawRecord>, Error> {
                if !table_exists(conn, DRAWS_TABLE)? {
                    return Ok(Vec::new());
                }
                query_draws(conn, &format!("{SELECT_COLUMNS} ORDER BY rowid"), &[])
            })
            .await
            .map_err(Error::from)
    }

    /// The most recent general draws covered by `period`, oldest first.
    pub async fn general_draw_trend(&self, period: TrendPeriod) -> Result<Vec<DrawRecord>, Error> {
        // SQLite treats a negative LIMIT as unbounded.
        let limit = period.limit().map_or(-1, |n| n as i64);

        self.conn
            .call(move |conn| -> Result<Vec<DrawRecord>, Error> {
                if !table_exists(conn, DRAWS_TABLE)? {
                    return Ok(Vec::new());
                }
                let sql = format!("{SELECT_COLUMNS} WHERE program_scope = ?1 ORDER BY rowid DESC LIMIT ?2");
                let scope = ProgramScope::General.as_str();
                let mut draws = query_draws(conn, &sql, &[&scope, &limit])?;
                draws.reverse();
                Ok(draws)
            })
            .await
            .map_err(Error::from)
    }
}
