//! One pass of fetch, extract and reconcile.
//!
//! Both pages are fetched and extracted before the store is touched, so a
//! page that fails to parse never leaves a partial update behind.

use eedraws_core::{AppConfig, DrawSync, Error, HistoryStore, PoolSync};
use serde::Serialize;

use crate::extract::{self, combine, extract_current_round, extract_history};
use crate::fetch::PageSource;

/// Where the two round pages live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrls {
    /// Historical results, newest round first.
    pub history_url: String,
    /// Latest round with the pool distribution.
    pub pool_url: String,
}

impl From<&AppConfig> for SourceUrls {
    fn from(config: &AppConfig) -> Self {
        Self { history_url: config.history_url.clone(), pool_url: config.pool_url.clone() }
    }
}

/// What a completed pass did to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub newest_round: String,
    pub draws: DrawSync,
    pub pool: PoolSync,
    /// RFC 3339 UTC timestamp written to the store.
    pub synced_at: String,
}

/// Run a full synchronization pass.
///
/// Steps run in order and the first failure aborts the rest. The sync time
/// is only recorded once both the draws and the pool are reconciled.
pub async fn run<P, S>(source: &P, store: &S, urls: &SourceUrls) -> Result<SyncReport, Error>
where
    P: PageSource + ?Sized,
    S: HistoryStore + ?Sized,
{
    let history_html = source.fetch_page(&urls.history_url).await?;
    let history = extract_history(&history_html)?;
    let last_round = extract::last_round(&history)?.to_string();

    let pool_html = source.fetch_page(&urls.pool_url).await?;
    let current = extract_current_round(&pool_html, &last_round)?;
    let extracted = combine(history, current);

    let newest_round = extracted
        .newest()
        .map(|draw| draw.round.clone())
        .ok_or_else(|| Error::ExtractFailed("no draws to store".into()))?;

    tracing::info!(draws = extracted.draws.len(), newest = %newest_round, "extracted draw history");

    let draws = store.synchronize_draws(&extracted.draws).await?;
    tracing::info!(?draws, "draws reconciled");

    let pool = store.synchronize_pool(&extracted.pool).await?;
    tracing::info!(?pool, date = %extracted.pool.date, "pool reconciled");

    let synced_at = chrono::Utc::now().to_rfc3339();
    store.record_sync_time(&synced_at).await?;

    Ok(SyncReport { newest_round, draws, pool, synced_at })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use eedraws_core::{DrawRecord, HistoryDb, PoolSnapshot};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    const HISTORY_URL: &str = "https://www.canada.ca/history.html";
    const POOL_URL: &str = "https://www.canada.ca/pool.html";

    const HISTORY_HTML: &str = r#"
        <html><body>
        <h3>#93 – June 13, 2018</h3>
        <p>Program specified: No program specified</p>
        <p>Number of invitations issued: 3,750</p>
        <p>CRS score of lowest-ranked candidate invited: 451</p>
        <h3>#92 – May 30, 2018</h3>
        <p>Program specified: Provincial Nominee Program</p>
        <p>Number of invitations issued: 200</p>
        <p>CRS score of lowest-ranked candidate invited: 902</p>
        </body></html>
    "#;

    fn pool_html(date: &str, score: u32) -> String {
        let cells = [
            "140", "130", "9,999", "120", "110", "100", "90", "80", "7,777", "70", "60", "50", "40", "30", "20", "10",
            "200,500",
        ];
        let rows: String = cells.iter().map(|c| format!("<tr><td>{c}</td></tr>")).collect();
        format!(
            r#"<html><body>
            <p>Program specified: No program specified</p>
            <p>Number of invitations issued: 3,750</p>
            <p>Date and time of round: {date} at 13:02:11 UTC</p>
            <p>CRS score of lowest-ranked candidate invited: {score}</p>
            <table>{rows}</table>
            </body></html>"#
        )
    }

    struct StaticPages(HashMap<String, String>);

    impl StaticPages {
        fn new(pool: String) -> Self {
            Self(HashMap::from([(HISTORY_URL.to_string(), HISTORY_HTML.to_string()), (POOL_URL.to_string(), pool)]))
        }
    }

    #[async_trait]
    impl PageSource for StaticPages {
        async fn fetch_page(&self, url: &str) -> Result<String, Error> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| Error::HttpError(format!("status 404 for {url}")))
        }
    }

    fn urls() -> SourceUrls {
        SourceUrls { history_url: HISTORY_URL.to_string(), pool_url: POOL_URL.to_string() }
    }

    #[tokio::test]
    async fn test_first_run_creates_everything() {
        let db = HistoryDb::open_in_memory().await.unwrap();
        let pages = StaticPages::new(pool_html("June 27, 2018", 441));

        let report = run(&pages, &db, &urls()).await.unwrap();
        assert_eq!(report.newest_round, "94");
        assert_eq!(report.draws, DrawSync::Created(3));
        assert_eq!(report.pool, PoolSync::Created);

        let draws = db.draws().await.unwrap();
        let rounds: Vec<_> = draws.iter().map(|d| d.round.as_str()).collect();
        assert_eq!(rounds, vec!["92", "93", "94"]);
        assert_eq!(draws[2].date, "Jun 27, 2018");

        let pool = db.latest_pool_snapshot().await.unwrap().unwrap();
        assert_eq!(pool.date, "Jun 27, 2018");
        assert_eq!(pool.total, 200_500);

        assert_eq!(db.last_sync_time().await.unwrap(), Some(report.synced_at));
    }

    #[tokio::test]
    async fn test_second_run_is_unchanged() {
        let db = HistoryDb::open_in_memory().await.unwrap();
        let pages = StaticPages::new(pool_html("June 27, 2018", 441));

        run(&pages, &db, &urls()).await.unwrap();
        let report = run(&pages, &db, &urls()).await.unwrap();

        assert_eq!(report.draws, DrawSync::Unchanged);
        assert_eq!(report.pool, PoolSync::Unchanged);
        assert_eq!(db.draws().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_new_round_is_appended_and_pool_replaced() {
        let db = HistoryDb::open_in_memory().await.unwrap();
        run(&StaticPages::new(pool_html("June 27, 2018", 441)), &db, &urls()).await.unwrap();

        // Round 94 has moved to the history page; the current page holds 95.
        let later = HISTORY_HTML.replace(
            "<h3>#93",
            "<h3>#94 – June 27, 2018</h3>
            <p>Program specified: No program specified</p>
            <p>Number of invitations issued: 3,750</p>
            <p>CRS score of lowest-ranked candidate invited: 441</p>
            <h3>#93",
        );
        let mut pages = StaticPages::new(pool_html("July 11, 2018", 442));
        pages.0.insert(HISTORY_URL.to_string(), later);

        let report = run(&pages, &db, &urls()).await.unwrap();
        assert_eq!(report.draws, DrawSync::Appended("95".to_string()));
        assert_eq!(report.pool, PoolSync::Replaced);

        let draws = db.draws().await.unwrap();
        assert_eq!(draws.len(), 4);
        assert_eq!(draws[3].score, 442);
        assert_eq!(db.latest_pool_snapshot().await.unwrap().unwrap().date, "Jul 11, 2018");
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_store_untouched() {
        let db = HistoryDb::open_in_memory().await.unwrap();
        let pages = StaticPages(HashMap::from([(HISTORY_URL.to_string(), HISTORY_HTML.to_string())]));

        let err = run(&pages, &db, &urls()).await.unwrap_err();
        assert!(err.is_fetch());
        assert!(!db.has_table("draws").await.unwrap());
        assert_eq!(db.last_sync_time().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_misaligned_history_aborts_before_store() {
        let db = HistoryDb::open_in_memory().await.unwrap();
        let broken = HISTORY_HTML.replace("<p>CRS score of lowest-ranked candidate invited: 451</p>", "");
        let mut pages = StaticPages::new(pool_html("June 27, 2018", 441));
        pages.0.insert(HISTORY_URL.to_string(), broken);

        let err = run(&pages, &db, &urls()).await.unwrap_err();
        assert!(matches!(err, Error::ExtractionAlignment { .. }));
        assert!(!db.has_table("draws").await.unwrap());
        assert!(!db.has_table("pool").await.unwrap());
        assert_eq!(db.last_sync_time().await.unwrap(), None);
    }

    /// Delegates to a real database but fails the pool step.
    struct FailingPoolStore {
        db: HistoryDb,
        sync_time_recorded: AtomicBool,
    }

    #[async_trait]
    impl HistoryStore for FailingPoolStore {
        async fn has_table(&self, name: &str) -> Result<bool, Error> {
            self.db.has_table(name).await
        }

        async fn latest_persisted_draw(&self) -> Result<Option<DrawRecord>, Error> {
            self.db.latest_persisted_draw().await
        }

        async fn synchronize_draws(&self, draws: &[DrawRecord]) -> Result<DrawSync, Error> {
            self.db.synchronize_draws(draws).await
        }

        async fn synchronize_pool(&self, _snapshot: &PoolSnapshot) -> Result<PoolSync, Error> {
            Err(Error::MigrationFailed("pool table locked".into()))
        }

        async fn record_sync_time(&self, timestamp: &str) -> Result<(), Error> {
            self.sync_time_recorded.store(true, Ordering::SeqCst);
            self.db.record_sync_time(timestamp).await
        }
    }

    #[tokio::test]
    async fn test_store_failure_skips_sync_time() {
        let store = FailingPoolStore {
            db: HistoryDb::open_in_memory().await.unwrap(),
            sync_time_recorded: AtomicBool::new(false),
        };
        let pages = StaticPages::new(pool_html("June 27, 2018", 441));

        let err = run(&pages, &store, &urls()).await.unwrap_err();
        assert!(err.is_store());
        assert!(!store.sync_time_recorded.load(Ordering::SeqCst));
        assert_eq!(store.db.last_sync_time().await.unwrap(), None);
    }

    #[test]
    fn test_source_urls_from_config() {
        let config = AppConfig::default();
        let urls = SourceUrls::from(&config);
        assert_eq!(urls.history_url, config.history_url);
        assert_eq!(urls.pool_url, config.pool_url);
    }
}
