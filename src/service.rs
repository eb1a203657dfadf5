//! The boundary the HTTP layer and the scheduler talk to.
//!
//! [`HackathonService`] owns the orchestrator and the cache and exposes the
//! feed operations: read everything, read one source, clear, inspect, and
//! force a refresh.

use crate::cache::{FreshnessCache, StalenessPolicy};
use crate::error::ServiceError;
use crate::models::Hackathon;
use crate::orchestrator::ScrapeOrchestrator;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument};

/// Snapshot of cache state for the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStatus {
    pub populated: bool,
    pub count: usize,
    /// Whether the next read will have to look past the memory layer.
    pub stale: bool,
    pub last_update: Option<DateTime<Utc>>,
    pub staleness_window: StalenessPolicy,
    pub next_scheduled_refresh: Option<DateTime<Utc>>,
}

pub struct HackathonService {
    orchestrator: Arc<ScrapeOrchestrator>,
    cache: FreshnessCache,
    next_refresh: RwLock<Option<DateTime<Utc>>>,
}

impl HackathonService {
    pub fn new(orchestrator: ScrapeOrchestrator, cache: FreshnessCache) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            cache,
            next_refresh: RwLock::new(None),
        }
    }

    /// All hackathons, MLH first, refreshing if the cache is stale.
    #[instrument(level = "info", skip(self))]
    pub async fn get_hackathons(&self) -> Result<Vec<Hackathon>, ServiceError> {
        let entry = self.cache.get_or_refresh(self.refresh_job()).await?;
        Ok(entry.records.clone())
    }

    /// Hackathons whose source matches `source_name`, ignoring case.
    #[instrument(level = "info", skip(self))]
    pub async fn get_hackathons_by_source(
        &self,
        source_name: &str,
    ) -> Result<Vec<Hackathon>, ServiceError> {
        let entry = self.cache.get_or_refresh(self.refresh_job()).await?;
        Ok(entry
            .records
            .iter()
            .filter(|h| h.is_from(source_name))
            .cloned()
            .collect())
    }

    /// Drop both cache layers; the next read scrapes again.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    pub async fn cache_status(&self) -> CacheStatus {
        let current = self.cache.current().await;
        CacheStatus {
            populated: current.is_some(),
            count: current.as_ref().map_or(0, |e| e.records.len()),
            stale: self.cache.is_stale().await,
            last_update: current.map(|e| e.captured_at),
            staleness_window: self.cache.policy(),
            next_scheduled_refresh: *self.next_refresh.read().await,
        }
    }

    /// Scrape now, ignoring freshness. Returns the number of records stored.
    #[instrument(level = "info", skip(self))]
    pub async fn refresh_now(&self) -> Result<usize, ServiceError> {
        let entry = self.cache.force_refresh(self.refresh_job()).await?;
        info!(count = entry.records.len(), "Forced refresh complete");
        Ok(entry.records.len())
    }

    pub async fn set_next_refresh(&self, at: Option<DateTime<Utc>>) {
        *self.next_refresh.write().await = at;
    }

    fn refresh_job(&self) -> impl FnOnce() -> BoxFuture<'static, Vec<Hackathon>> + Send + 'static {
        let orchestrator = Arc::clone(&self.orchestrator);
        move || async move { orchestrator.run().await }.boxed()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::cache::SnapshotStore;
    use crate::config::{DEFAULT_HACKEREARTH_URL, DEFAULT_MLH_URL, SourcesConfig};
    use crate::fetch::testing::StaticFetcher;
    use crate::scrapers::mlh::fixtures as mlh;
    use crate::scrapers::structured::fixtures::{event_json, ld_block, page};
    use tempfile::TempDir;

    pub fn mlh_page() -> String {
        mlh::page(&[mlh::event("HackTX", "hacktx"), mlh::event("PennApps", "pennapps")].concat())
    }

    pub fn hackerearth_page() -> String {
        page(&ld_block(&event_json("Climate Hack", "climate-hack")), "")
    }

    /// Service over in-memory pages; also returns the fetcher and temp dir.
    pub fn service(dir: &TempDir) -> (HackathonService, Arc<StaticFetcher>) {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .with_page(DEFAULT_MLH_URL, &mlh_page())
                .with_page(DEFAULT_HACKEREARTH_URL, &hackerearth_page()),
        );
        let orchestrator =
            ScrapeOrchestrator::new(fetcher.clone(), &SourcesConfig::default(), None).unwrap();
        let cache = FreshnessCache::new(
            StalenessPolicy::default(),
            SnapshotStore::new(dir.path().join("hackathons_cache.json")),
        );
        (HackathonService::new(orchestrator, cache), fetcher)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::service;
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_get_hackathons_scrapes_once() {
        let dir = TempDir::new().unwrap();
        let (svc, fetcher) = service(&dir);

        let first = svc.get_hackathons().await.unwrap();
        let second = svc.get_hackathons().await.unwrap();

        let names: Vec<_> = first.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, ["HackTX", "PennApps", "Climate Hack"]);
        assert_eq!(first, second);
        assert_eq!(fetcher.calls(), 2, "one fetch per source");
    }

    #[tokio::test]
    async fn test_filter_by_source_ignores_case() {
        let dir = TempDir::new().unwrap();
        let (svc, _) = service(&dir);

        let lower = svc.get_hackathons_by_source("mlh").await.unwrap();
        let upper = svc.get_hackathons_by_source("MLH").await.unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower.len(), 2);

        let he = svc.get_hackathons_by_source("hackerEARTH").await.unwrap();
        assert_eq!(he.len(), 1);
        assert!(svc.get_hackathons_by_source("devpost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_then_status_is_empty() {
        let dir = TempDir::new().unwrap();
        let (svc, _) = service(&dir);
        svc.get_hackathons().await.unwrap();

        let status = svc.cache_status().await;
        assert!(status.populated);
        assert_eq!(status.count, 3);
        assert!(!status.stale);
        assert!(status.last_update.is_some());

        svc.clear_cache().await;
        let status = svc.cache_status().await;
        assert!(!status.populated);
        assert_eq!(status.count, 0);
        assert!(status.stale);
        assert_eq!(status.last_update, None);
    }

    #[tokio::test]
    async fn test_cleared_cache_repopulates_on_next_read() {
        let dir = TempDir::new().unwrap();
        let (svc, fetcher) = service(&dir);
        svc.get_hackathons().await.unwrap();
        svc.clear_cache().await;

        let again = svc.get_hackathons().await.unwrap();
        assert_eq!(again.len(), 3);
        assert_eq!(fetcher.calls(), 4);
        assert!(svc.cache_status().await.populated);
    }

    #[tokio::test]
    async fn test_refresh_now_ignores_freshness() {
        let dir = TempDir::new().unwrap();
        let (svc, fetcher) = service(&dir);
        svc.get_hackathons().await.unwrap();
        assert_eq!(svc.refresh_now().await.unwrap(), 3);
        assert_eq!(fetcher.calls(), 4);
    }

    #[tokio::test]
    async fn test_status_reports_schedule_and_policy() {
        let dir = TempDir::new().unwrap();
        let (svc, _) = service(&dir);
        let at = Utc::now();
        svc.set_next_refresh(Some(at)).await;

        let status = svc.cache_status().await;
        assert_eq!(status.next_scheduled_refresh, Some(at));
        assert_eq!(status.staleness_window, StalenessPolicy::default());

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["staleness_window"]["policy"], "elapsed");
        assert_eq!(json["staleness_window"]["window_secs"], 86_400);
        assert!(json["last_update"].is_null());
    }
}
