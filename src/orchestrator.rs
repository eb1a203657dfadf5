//! Scrape orchestration across all sources.
//!
//! One run fetches the MLH and HackerEarth pages concurrently, parses each
//! with its parser, and concatenates the results (MLH first). A failing
//! source contributes zero records; it never fails the run.
//!
//! # HackerEarth Strategy
//!
//! 1. Live page, JSON-LD events ([`StructuredDataParser`])
//! 2. Same page, challenge cards ([`HackerEarthHtmlParser`]) if step 1 found nothing
//! 3. Saved copy of the last good page, JSON-LD only, if the fetch failed
//!
//! A live page that yields JSON-LD events overwrites the saved copy, so the
//! saved copy is always the last page step 3 can use.

use crate::config::SourcesConfig;
use crate::fetch::{PageFetcher, read_saved_page};
use crate::models::Hackathon;
use crate::scrapers::SourceParser;
use crate::scrapers::hackerearth::HackerEarthHtmlParser;
use crate::scrapers::mlh::MlhParser;
use crate::scrapers::structured::StructuredDataParser;
use futures::future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;
use tracing::{info, instrument, warn};
use url::Url;

/// Runs fetch + parse for every source.
pub struct ScrapeOrchestrator {
    fetcher: Arc<dyn PageFetcher>,
    mlh_url: Url,
    hackerearth_url: Url,
    fallback_snapshot: Option<PathBuf>,
    mlh: MlhParser,
    hackerearth_ld: StructuredDataParser,
    hackerearth_html: HackerEarthHtmlParser,
}

impl ScrapeOrchestrator {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        sources: &SourcesConfig,
        fallback_snapshot: Option<PathBuf>,
    ) -> Result<Self, url::ParseError> {
        let mlh_url = Url::parse(&sources.mlh_url)?;
        let hackerearth_url = Url::parse(&sources.hackerearth_url)?;
        Ok(Self {
            fetcher,
            mlh: MlhParser::new(mlh_url.clone()),
            hackerearth_ld: StructuredDataParser::new(hackerearth_url.clone()),
            hackerearth_html: HackerEarthHtmlParser::new(hackerearth_url.clone()),
            mlh_url,
            hackerearth_url,
            fallback_snapshot,
        })
    }

    /// Scrape every source and merge the results.
    #[instrument(level = "info", skip(self))]
    pub async fn run(&self) -> Vec<Hackathon> {
        let t0 = Instant::now();
        let (mlh, hackerearth) =
            future::join(self.scrape_mlh(), self.scrape_hackerearth()).await;

        let (mlh_count, hackerearth_count) = (mlh.len(), hackerearth.len());
        let mut hackathons = mlh;
        hackathons.extend(hackerearth);

        if hackathons.is_empty() {
            warn!("No source produced any hackathons");
        }
        info!(
            total = hackathons.len(),
            mlh_count,
            hackerearth_count,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Scrape run complete"
        );
        hackathons
    }

    #[instrument(level = "info", skip(self), fields(url = %self.mlh_url))]
    async fn scrape_mlh(&self) -> Vec<Hackathon> {
        match self.fetcher.fetch(self.mlh_url.as_str()).await {
            Ok(document) => {
                let records = self.mlh.parse(&document);
                info!(source = %self.mlh.source(), count = records.len(), "Parsed events");
                records
            }
            Err(e) => {
                warn!(error = %e, "MLH fetch failed; skipping source");
                Vec::new()
            }
        }
    }

    #[instrument(level = "info", skip(self), fields(url = %self.hackerearth_url))]
    async fn scrape_hackerearth(&self) -> Vec<Hackathon> {
        match self.fetcher.fetch(self.hackerearth_url.as_str()).await {
            Ok(document) => self.parse_hackerearth(&document).await,
            Err(e) => {
                warn!(error = %e, "HackerEarth fetch failed; trying saved page");
                self.hackerearth_from_saved_page().await
            }
        }
    }

    async fn parse_hackerearth(&self, document: &str) -> Vec<Hackathon> {
        let records = self.hackerearth_ld.parse(document);
        if !records.is_empty() {
            self.save_fallback(document).await;
            info!(source = %self.hackerearth_ld.source(), count = records.len(), parser = self.hackerearth_ld.name(), "Parsed events");
            return records;
        }
        let records = self.hackerearth_html.parse(document);
        info!(count = records.len(), parser = self.hackerearth_html.name(), "No JSON-LD events; parsed challenge cards");
        records
    }

    async fn hackerearth_from_saved_page(&self) -> Vec<Hackathon> {
        let Some(path) = &self.fallback_snapshot else {
            return Vec::new();
        };
        match read_saved_page(path).await {
            Ok(document) => {
                let records = self.hackerearth_ld.parse(&document);
                info!(count = records.len(), path = %path.display(), "Parsed saved HackerEarth page");
                records
            }
            Err(e) => {
                warn!(error = %e, "No usable saved HackerEarth page");
                Vec::new()
            }
        }
    }

    async fn save_fallback(&self, document: &str) {
        let Some(path) = &self.fallback_snapshot else {
            return;
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(parent).await {
                warn!(path = %parent.display(), error = %e, "Cannot create snapshot directory");
                return;
            }
        }
        if let Err(e) = fs::write(path, document).await {
            warn!(path = %path.display(), error = %e, "Failed to save HackerEarth page");
        }
    }
}
