//! Page retrieval.
//!
//! [`PageSource`] is the seam the sync pipeline fetches through;
//! [`FetchClient`] is the HTTP implementation.
//!
//! ### Safety gates
//! - URL canonicalization (see [`canonicalize`])
//! - robots.txt compliance, cached per host for 24h
//! - Redirect limit and maximum body size

pub mod robots;
pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Url, header};
use std::time::{Duration, Instant};

pub use robots::{RobotsCache, RobotsError};
pub use self::url::{UrlError, canonicalize};

use eedraws_core::{AppConfig, Error};

/// Source of raw page markup.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page at `url` as text.
    async fn fetch_page(&self, url: &str) -> Result<String, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "ee-draws/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Whether to respect robots.txt (default: true)
    pub respect_robots: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "ee-draws/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
            respect_robots: true,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
            respect_robots: config.respect_robots,
        }
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The canonicalized URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    pub bytes: Bytes,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

impl FetchResponse {
    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

fn request_error(err: &reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(err.to_string())
    } else {
        Error::HttpError(format!("network error: {err}"))
    }
}

fn too_large(len: usize, max: usize) -> Error {
    Error::FetchTooLarge(format!("{len} bytes exceeds {max}"))
}

/// HTTP client for the round pages.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
    robots_cache: RobotsCache,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {e}")))?;

        let robots_cache = RobotsCache::new(config.user_agent.clone(), http.clone());

        Ok(Self { http, config, robots_cache })
    }

    /// Fetch a URL, returning raw bytes and metadata.
    ///
    /// Performs the robots.txt check and enforces redirect and size limits.
    pub async fn fetch(&self, url_str: &str) -> Result<FetchResponse, Error> {
        let start = Instant::now();
        let url = canonicalize(url_str).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        if self.config.respect_robots {
            self.robots_cache
                .check(&url)
                .await
                .map_err(|e| Error::RobotsDisallowed(e.to_string()))?;
        }

        let response = self
            .http
            .get(url.as_str())
            .header(header::ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| request_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpError(format!("status {} for {url}", status.as_u16())));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(too_large(len as usize, self.config.max_bytes));
        }

        let final_url = response.url().clone();

        let bytes = response.bytes().await.map_err(|e| request_error(&e))?;
        if bytes.len() > self.config.max_bytes {
            return Err(too_large(bytes.len(), self.config.max_bytes));
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        Ok(FetchResponse { url, final_url, bytes, fetch_ms })
    }
}

#[async_trait]
impl PageSource for FetchClient {
    async fn fetch_page(&self, url: &str) -> Result<String, Error> {
        let response = self.fetch(url).await?;
        if response.final_url != response.url {
            tracing::info!(url = %response.url, final_url = %response.final_url, "page redirected");
        }
        tracing::debug!(url = %response.url, fetch_ms = response.fetch_ms, bytes = response.bytes.len(), "fetched page");
        Ok(response.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "ee-draws/0.1");
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
        assert!(config.respect_robots);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { timeout_ms: 1_500, respect_robots: false, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.timeout, Duration::from_millis(1_500));
        assert!(!config.respect_robots);
        assert_eq!(config.user_agent, app.user_agent);
    }

    #[test]
    fn test_fetch_response_text_is_lossy() {
        let response = FetchResponse {
            url: Url::parse("https://www.canada.ca/en.html").unwrap(),
            final_url: Url::parse("https://www.canada.ca/en.html").unwrap(),
            bytes: Bytes::from_static(b"<p>Round \xff</p>"),
            fetch_ms: 10,
        };
        assert_eq!(response.text(), "<p>Round \u{fffd}</p>");
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_scheme_before_network() {
        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let err = client.fetch_page("ftp://www.canada.ca/pool.html").await.unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
        assert!(err.is_fetch());
    }
}
