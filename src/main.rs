//! # hackathon_feed
//!
//! Aggregates hackathon listings from MLH and HackerEarth into one normalized
//! feed and serves it over a small JSON API backed by a freshness-gated cache.
//!
//! ## Usage
//!
//! ```sh
//! hackathon_feed                      # serve on 127.0.0.1:5000
//! hackathon_feed -c feed.yaml         # serve with a config file
//! hackathon_feed -e ./exports         # scrape once, write JSON, exit
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: Download each listing page with a polite random delay
//! 2. **Parsing**: Source-specific parsers extract records (JSON-LD preferred for HackerEarth)
//! 3. **Normalizing**: Every record is mapped onto the shared [`models::Hackathon`] schema
//! 4. **Caching**: Results live in memory and in a snapshot file until stale
//! 5. **Serving**: An axum router exposes the feed; a daily task refreshes it

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cache;
mod cli;
mod config;
mod error;
mod fetch;
mod models;
mod normalize;
mod orchestrator;
mod outputs;
mod scheduler;
mod scrapers;
mod service;
mod utils;

use cache::{FreshnessCache, SnapshotStore};
use cli::Cli;
use config::Config;
use fetch::HttpFetcher;
use orchestrator::ScrapeOrchestrator;
use outputs::json;
use service::HackathonService;
use utils::{ensure_writable_dir, truncate_for_log};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "hackathon_feed starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;
    let refresh_at = config.refresh_time()?;
    info!(
        bind = %config.bind,
        cache_file = %config.cache_file.display(),
        staleness = ?config.staleness,
        refresh_at = %config.refresh_at,
        "Configuration ready"
    );

    // ---- Pipeline ----
    let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
    let orchestrator =
        ScrapeOrchestrator::new(fetcher, &config.sources, config.fallback_snapshot.clone())?;
    let cache = FreshnessCache::new(
        config.staleness,
        SnapshotStore::new(config.cache_file.clone()),
    );
    if cache.store().should_update_cache(&cache.policy()).await {
        info!("Cache snapshot missing or stale; first read will scrape");
    } else if cache.warm().await {
        info!("Serving from persisted snapshot");
    }
    let service = Arc::new(HackathonService::new(orchestrator, cache));

    // ---- One-shot export ----
    if let Some(export_dir) = &args.export_dir {
        if let Err(e) = ensure_writable_dir(export_dir).await {
            error!(path = %export_dir, error = %e, "Export directory is not writable");
            return Err(e);
        }
        let hackathons = service.get_hackathons().await?;
        let path = json::write_feed(&hackathons, export_dir).await?;
        info!(count = hackathons.len(), path = %path.display(), "Scraped hackathons");
        match hackathons.first() {
            Some(first) => {
                let sample = serde_json::to_string_pretty(first)?;
                info!(sample = %truncate_for_log(&sample, 2000), "Sample hackathon");
            }
            None => warn!("Export is empty; every source failed"),
        }

        let elapsed = start_time.elapsed();
        info!(?elapsed, secs = elapsed.as_secs(), "Export complete");
        return Ok(());
    }

    // ---- Serve ----
    let scheduler = scheduler::spawn_daily_refresh(Arc::clone(&service), refresh_at);
    let app = api::router(Arc::clone(&service));
    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
        })
        .await;
    scheduler.abort();

    if let Err(e) = served {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), "Server stopped");
    Ok(())
}
