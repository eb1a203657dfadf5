//! Runtime configuration.
//!
//! Configuration comes from an optional YAML file (`--config`). Every field
//! has a default, so an empty file or no file at all yields a working setup.
//! A handful of fields can also be overridden from the command line, see
//! [`crate::cli::Cli`].

use crate::cache::StalenessPolicy;
use crate::error::ConfigError;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

pub const DEFAULT_MLH_URL: &str = "https://mlh.io/seasons/2025/events";
pub const DEFAULT_HACKEREARTH_URL: &str = "https://www.hackerearth.com/challenges/hackathon/";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Top level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP API listens on.
    pub bind: String,
    /// Path of the persisted cache snapshot.
    pub cache_file: PathBuf,
    /// Saved HackerEarth page used when the live fetch fails.
    pub fallback_snapshot: Option<PathBuf>,
    /// Local wall-clock time of the daily refresh, `HH:MM`.
    pub refresh_at: String,
    pub staleness: StalenessPolicy,
    pub fetch: FetchConfig,
    pub sources: SourcesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            cache_file: PathBuf::from("cache/hackathons_cache.json"),
            fallback_snapshot: Some(PathBuf::from("cache/hackerearth_snapshot.html")),
            refresh_at: "00:00".to_string(),
            staleness: StalenessPolicy::default(),
            fetch: FetchConfig::default(),
            sources: SourcesConfig::default(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    /// Lower bound of the random pause before every request.
    pub min_delay_secs: f64,
    /// Upper bound of the random pause before every request.
    pub max_delay_secs: f64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            min_delay_secs: 2.0,
            max_delay_secs: 5.0,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Listing pages scraped on every refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub mlh_url: String,
    pub hackerearth_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            mlh_url: DEFAULT_MLH_URL.to_string(),
            hackerearth_url: DEFAULT_HACKEREARTH_URL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or defaults when `path` is `None`.
    ///
    /// The result is validated before it is returned.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let shown = path.display().to_string();
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: shown.clone(),
                    source,
                })?;
                let config = Self::from_yaml(&raw).map_err(|source| ConfigError::Yaml {
                    path: shown.clone(),
                    source,
                })?;
                info!(path = %shown, "Loaded configuration file");
                config
            }
            None => {
                info!("No config file given; using defaults");
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML. An empty document yields the defaults.
    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fetch = &self.fetch;
        if fetch.timeout_secs == 0 {
            return Err(ConfigError::Invalid("fetch.timeout_secs must be > 0".into()));
        }
        if !(fetch.min_delay_secs >= 0.0 && fetch.min_delay_secs <= fetch.max_delay_secs) {
            return Err(ConfigError::Invalid(format!(
                "fetch delay range [{}, {}] is not a valid range",
                fetch.min_delay_secs, fetch.max_delay_secs
            )));
        }
        if let StalenessPolicy::Elapsed { window_secs } = self.staleness {
            if window_secs == 0 {
                return Err(ConfigError::Invalid("staleness.window_secs must be > 0".into()));
            }
        }
        self.refresh_time()?;
        for (key, value) in [
            ("sources.mlh_url", &self.sources.mlh_url),
            ("sources.hackerearth_url", &self.sources.hackerearth_url),
        ] {
            Url::parse(value)
                .map_err(|e| ConfigError::Invalid(format!("{key} `{value}`: {e}")))?;
        }
        Ok(())
    }

    /// The daily refresh time parsed from `refresh_at`.
    pub fn refresh_time(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(&self.refresh_at, "%H:%M").map_err(|e| {
            ConfigError::Invalid(format!("refresh_at `{}` is not HH:MM: {e}", self.refresh_at))
        })
    }
}
