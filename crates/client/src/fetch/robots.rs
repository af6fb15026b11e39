//! robots.txt compliance.
//!
//! Both round pages live on the same host, so robots.txt is fetched once
//! and reused for 24 hours.

use robotstxt_rs::RobotsTxt;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::{Position, Url};

const ROBOTS_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const MAX_ROBOTS_SIZE: usize = 1024 * 1024;

/// Error type for robots.txt operations.
#[derive(Debug, thiserror::Error)]
pub enum RobotsError {
    #[error("robots.txt disallowed: {path} (robots_url: {robots_url})")]
    Disallowed { path: String, robots_url: String },

    #[error("failed to fetch robots.txt: {0}")]
    FetchError(String),

    #[error("robots.txt too large")]
    TooLarge,
}

struct CachedRobots {
    robots: RobotsTxt,
    fetched_at: Instant,
}

impl CachedRobots {
    fn is_expired(&self) -> bool {
        self.fetched_at.elapsed() > ROBOTS_TTL
    }
}

fn robots_url(url: &Url) -> String {
    let mut origin = format!("{}://{}", url.scheme(), url.host_str().unwrap_or(""));
    if let Some(port) = url.port() {
        origin.push_str(&format!(":{port}"));
    }
    format!("{origin}/robots.txt")
}

/// Per-host robots.txt cache.
pub struct RobotsCache {
    cache: Mutex<HashMap<String, CachedRobots>>,
    user_agent: String,
    http: reqwest::Client,
}

impl RobotsCache {
    /// Create a cache sharing the page client's user agent.
    pub fn new(user_agent: String, http: reqwest::Client) -> Self {
        Self { cache: Mutex::new(HashMap::new()), user_agent, http }
    }

    /// Fail with [`RobotsError::Disallowed`] unless `url` may be fetched.
    pub async fn check(&self, url: &Url) -> Result<(), RobotsError> {
        let robots_url = robots_url(url);
        let mut cache = self.cache.lock().await;

        let stale = cache.get(&robots_url).is_none_or(CachedRobots::is_expired);
        if stale {
            let robots = self.fetch_robots(&robots_url).await?;
            cache.insert(robots_url.clone(), CachedRobots { robots, fetched_at: Instant::now() });
        } else {
            tracing::debug!(%robots_url, "robots.txt cache hit");
        }

        // Rules match against the path and query, not the full URL.
        let target = &url[Position::BeforePath..];
        let allowed = cache
            .get(&robots_url)
            .is_some_and(|cached| cached.robots.can_fetch(&self.user_agent, target));

        if allowed {
            Ok(())
        } else {
            Err(RobotsError::Disallowed { path: url.path().to_string(), robots_url })
        }
    }

    async fn fetch_robots(&self, url: &str) -> Result<RobotsTxt, RobotsError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| RobotsError::FetchError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            if let Some(len) = response.content_length()
                && len as usize > MAX_ROBOTS_SIZE
            {
                return Err(RobotsError::TooLarge);
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| RobotsError::FetchError(e.to_string()))?;

            if bytes.len() > MAX_ROBOTS_SIZE {
                return Err(RobotsError::TooLarge);
            }

            Ok(RobotsTxt::parse(&String::from_utf8_lossy(&bytes)))
        } else if status.is_client_error() {
            tracing::debug!(url, %status, "no robots.txt, allowing all");
            Ok(RobotsTxt::parse(""))
        } else {
            Err(RobotsError::FetchError(format!("status {status}")))
        }
    }
}
