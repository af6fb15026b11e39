//! Application configuration with layered loading.
//!
//! Configuration is loaded with figment from, highest precedence first:
//!
//! 1. Environment variables (EE_DRAWS_*)
//! 2. TOML config file (if EE_DRAWS_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

const HISTORY_URL: &str = "https://www.canada.ca/en/immigration-refugees-citizenship/services/immigrate-canada/\
                           express-entry/submit-profile/rounds-invitations/results-previous.html";

const POOL_URL: &str = "https://www.canada.ca/en/immigration-refugees-citizenship/services/immigrate-canada/\
                        express-entry/submit-profile/rounds-invitations.html";

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Page listing every previous round, newest first.
    ///
    /// Set via EE_DRAWS_HISTORY_URL environment variable.
    #[serde(default = "default_history_url")]
    pub history_url: String,

    /// Page describing the current round and the pool distribution.
    ///
    /// Set via EE_DRAWS_POOL_URL environment variable.
    #[serde(default = "default_pool_url")]
    pub pool_url: String,

    /// Path to the SQLite history database.
    ///
    /// Set via EE_DRAWS_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via EE_DRAWS_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per page.
    ///
    /// Set via EE_DRAWS_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via EE_DRAWS_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of redirects to follow.
    ///
    /// Set via EE_DRAWS_MAX_REDIRECTS environment variable.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Whether to respect robots.txt rules.
    ///
    /// Set via EE_DRAWS_RESPECT_ROBOTS environment variable.
    #[serde(default = "default_true")]
    pub respect_robots: bool,
}

fn default_history_url() -> String {
    HISTORY_URL.into()
}

fn default_pool_url() -> String {
    POOL_URL.into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./ee-draws.sqlite")
}

fn default_user_agent() -> String {
    "ee-draws/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_redirects() -> usize {
    5
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            history_url: default_history_url(),
            pool_url: default_pool_url(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
            respect_robots: true,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file or environment cannot be
    /// parsed, or if validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("EE_DRAWS_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("EE_DRAWS_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        Self::from_figment(figment)
    }

    /// Extract and validate a configuration from an already assembled figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./ee-draws.sqlite"));
        assert_eq!(config.user_agent, "ee-draws/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.max_redirects, 5);
        assert!(config.respect_robots);
        assert!(config.history_url.ends_with("results-previous.html"));
        assert!(config.pool_url.ends_with("rounds-invitations.html"));
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_toml_layer_overrides_defaults() {
        let figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::string("db_path = \"/tmp/draws.sqlite\"\nrespect_robots = false"));
        let config = AppConfig::from_figment(figment).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/draws.sqlite"));
        assert!(!config.respect_robots);
        assert_eq!(config.user_agent, "ee-draws/0.1");
    }

    #[test]
    fn test_from_figment_rejects_invalid_values() {
        let figment =
            Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string("timeout_ms = 10"));
        let result = AppConfig::from_figment(figment);
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }
}
