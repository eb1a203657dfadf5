//! Error types for the scrape pipeline, the cache and configuration.
//!
//! Every error here except [`ConfigError`] is recoverable: the pipeline logs
//! it where it happens and degrades (zero records for a source, one dropped
//! record, or a cache miss). [`ServiceError`] is what the HTTP layer turns
//! into a 500.

use crate::models::Source;
use thiserror::Error;

/// Fetching a page failed. The source contributes zero records.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("reading {path} failed: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A required field was missing on one record. Only that record is dropped.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{origin} record is missing required field `{field}`")]
pub struct ParseFieldError {
    pub field: &'static str,
    pub origin: Source,
}

impl ParseFieldError {
    pub fn new(field: &'static str, origin: Source) -> Self {
        Self { field, origin }
    }
}

/// The snapshot file could not be read or written. Reads are treated as a
/// cache miss.
#[derive(Debug, Error)]
pub enum CacheIoError {
    #[error("cache file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache file is not a valid snapshot: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("could not encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("snapshot timestamp {0} is out of range")]
    Timestamp(f64),
}

/// Loading or validating configuration failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {path} is not valid YAML: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failure surfaced at the service boundary.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("refresh task did not complete: {0}")]
    RefreshAborted(String),
}
