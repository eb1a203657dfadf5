//! Command-line interface definitions for hackathon_feed.
//!
//! Flags override the matching fields of the YAML configuration; everything
//! else comes from the config file or its defaults.

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Serve the API with defaults
/// hackathon_feed
///
/// # Serve with a config file on another port
/// hackathon_feed -c feed.yaml -b 0.0.0.0:8080
///
/// # Scrape once and write hackathons_<timestamp>.json
/// hackathon_feed -e ./exports
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a YAML config file
    #[arg(short, long, env = "HACKATHON_FEED_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to serve the HTTP API on
    #[arg(short, long, env = "HACKATHON_FEED_BIND")]
    pub bind: Option<String>,

    /// Path of the persisted cache snapshot
    #[arg(long, env = "HACKATHON_FEED_CACHE_FILE")]
    pub cache_file: Option<PathBuf>,

    /// Write the feed to this directory once and exit instead of serving
    #[arg(short, long)]
    pub export_dir: Option<String>,
}

impl Cli {
    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(bind) = &self.bind {
            config.bind = bind.clone();
        }
        if let Some(cache_file) = &self.cache_file {
            config.cache_file = cache_file.clone();
        }
    }
}
