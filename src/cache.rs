//! Two-layer, freshness-gated cache for the merged hackathon feed.
//!
//! # Layers
//!
//! - **memory**: the current [`CacheEntry`] behind an `RwLock`. Entries are
//!   immutable and swapped whole, so a reader always sees either the old or
//!   the new list.
//! - **persisted**: a [`SnapshotStore`] holding the same entry as
//!   `{"timestamp": <unix seconds>, "data": [...]}` so a restart does not force
//!   a scrape.
//!
//! Both layers are judged by the same [`StalenessPolicy`]. A read checks
//! memory first, then the snapshot file, and only runs the refresh function
//! when both are stale or missing.
//!
//! # Refreshes
//!
//! At most one refresh runs at a time. The refresh runs in its own task that
//! owns the refresh lock, so it completes and lands in the cache even when
//! the caller that started it goes away. [`FreshnessCache::clear`] does not
//! take the lock: clearing during a refresh empties the cache immediately
//! and the refresh result still lands afterwards.

use crate::error::{CacheIoError, ServiceError};
use crate::models::{CacheSnapshot, Hackathon};
use chrono::{DateTime, Local, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, instrument, warn};

const DEFAULT_WINDOW_SECS: u64 = 24 * 60 * 60;

fn default_window_secs() -> u64 {
    DEFAULT_WINDOW_SECS
}

/// When a cached entry is too old to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum StalenessPolicy {
    /// Stale once `window_secs` have elapsed since capture.
    Elapsed {
        #[serde(default = "default_window_secs")]
        window_secs: u64,
    },
    /// Stale once the local calendar day has changed since capture.
    CalendarDay,
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        StalenessPolicy::Elapsed {
            window_secs: DEFAULT_WINDOW_SECS,
        }
    }
}

impl StalenessPolicy {
    /// An entry captured after `now` is always stale.
    pub fn is_stale_at(&self, captured_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        if captured_at > now {
            return true;
        }
        match *self {
            StalenessPolicy::Elapsed { window_secs } => {
                let window = TimeDelta::seconds(i64::try_from(window_secs).unwrap_or(i64::MAX));
                now.signed_duration_since(captured_at) >= window
            }
            StalenessPolicy::CalendarDay => {
                captured_at.with_timezone(&Local).date_naive()
                    < now.with_timezone(&Local).date_naive()
            }
        }
    }

    pub fn is_stale(&self, captured_at: DateTime<Utc>) -> bool {
        self.is_stale_at(captured_at, Utc::now())
    }
}

/// One captured feed.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub captured_at: DateTime<Utc>,
    pub records: Vec<Hackathon>,
}

impl CacheEntry {
    pub fn new(records: Vec<Hackathon>) -> Self {
        Self {
            captured_at: Utc::now(),
            records,
        }
    }

    fn to_snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            timestamp: self.captured_at.timestamp_micros() as f64 / 1_000_000.0,
            data: self.records.clone(),
        }
    }

    fn from_snapshot(snapshot: CacheSnapshot) -> Result<Self, CacheIoError> {
        let ts = snapshot.timestamp;
        let captured_at = ts
            .is_finite()
            .then(|| DateTime::from_timestamp_micros((ts * 1_000_000.0).round() as i64))
            .flatten()
            .ok_or(CacheIoError::Timestamp(ts))?;
        Ok(Self {
            captured_at,
            records: snapshot.data,
        })
    }
}

/// The cache file on disk.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. A missing file is `Ok(None)`.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<Option<CacheEntry>, CacheIoError> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot: CacheSnapshot =
            serde_json::from_slice(&raw).map_err(CacheIoError::Decode)?;
        CacheEntry::from_snapshot(snapshot).map(Some)
    }

    /// Replace the snapshot with `entry`.
    ///
    /// Writes a sibling temp file and renames it over the target.
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display(), count = entry.records.len()))]
    pub async fn save(&self, entry: &CacheEntry) -> Result<(), CacheIoError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let json =
            serde_json::to_vec_pretty(&entry.to_snapshot()).map_err(CacheIoError::Encode)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!("Saved cache snapshot");
        Ok(())
    }

    /// Delete the snapshot. A missing file is not an error.
    pub async fn remove(&self) -> Result<(), CacheIoError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether the snapshot is missing, unreadable, or stale under `policy`.
    pub async fn should_update_cache(&self, policy: &StalenessPolicy) -> bool {
        match self.load().await {
            Ok(Some(entry)) => policy.is_stale(entry.captured_at),
            Ok(None) => true,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unreadable cache snapshot; treating as stale");
                true
            }
        }
    }
}

/// Memory + file cache with a single-flight refresh.
///
/// Cloning is cheap; clones share the same state.
#[derive(Debug, Clone)]
pub struct FreshnessCache {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    policy: StalenessPolicy,
    store: SnapshotStore,
    memory: RwLock<Option<Arc<CacheEntry>>>,
    refresh_lock: Arc<Mutex<()>>,
}

impl FreshnessCache {
    pub fn new(policy: StalenessPolicy, store: SnapshotStore) -> Self {
        Self {
            inner: Arc::new(Inner {
                policy,
                store,
                memory: RwLock::new(None),
                refresh_lock: Arc::new(Mutex::new(())),
            }),
        }
    }

    pub fn policy(&self) -> StalenessPolicy {
        self.inner.policy
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.inner.store
    }

    /// The entry currently held in memory, fresh or not.
    pub async fn current(&self) -> Option<Arc<CacheEntry>> {
        self.inner.memory.read().await.clone()
    }

    /// Whether a read right now would need to look past the memory layer.
    pub async fn is_stale(&self) -> bool {
        self.fresh_memory().await.is_none()
    }

    /// Load a fresh snapshot from disk into memory. Returns whether it did.
    #[instrument(level = "info", skip(self))]
    pub async fn warm(&self) -> bool {
        if self.fresh_memory().await.is_some() {
            return true;
        }
        match self.load_fresh_snapshot().await {
            Some(entry) => {
                info!(count = entry.records.len(), captured_at = %entry.captured_at, "Warmed cache from snapshot");
                true
            }
            None => false,
        }
    }

    /// Serve cached records, running `refresh` only if both layers are stale.
    #[instrument(level = "info", skip_all)]
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<Arc<CacheEntry>, ServiceError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Vec<Hackathon>> + Send + 'static,
    {
        if let Some(entry) = self.fresh_memory().await {
            debug!("Memory cache hit");
            return Ok(entry);
        }

        let guard = self.inner.refresh_lock.clone().lock_owned().await;

        // another caller may have refreshed while we waited
        if let Some(entry) = self.fresh_memory().await {
            debug!("Memory cache filled while waiting");
            return Ok(entry);
        }
        if let Some(entry) = self.load_fresh_snapshot().await {
            info!(count = entry.records.len(), "Serving from cache snapshot");
            return Ok(entry);
        }

        info!("Cache stale; refreshing");
        self.spawn_refresh(guard, refresh).await
    }

    /// Refresh regardless of staleness, waiting for any refresh in flight.
    #[instrument(level = "info", skip_all)]
    pub async fn force_refresh<F, Fut>(&self, refresh: F) -> Result<Arc<CacheEntry>, ServiceError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Vec<Hackathon>> + Send + 'static,
    {
        let guard = self.inner.refresh_lock.clone().lock_owned().await;
        self.spawn_refresh(guard, refresh).await
    }

    /// Replace both layers with `records`.
    #[instrument(level = "info", skip_all, fields(count = records.len()))]
    pub async fn store_records(&self, records: Vec<Hackathon>) -> Arc<CacheEntry> {
        let entry = Arc::new(CacheEntry::new(records));
        *self.inner.memory.write().await = Some(entry.clone());
        if let Err(e) = self.inner.store.save(&entry).await {
            warn!(path = %self.inner.store.path().display(), error = %e, "Failed to persist cache snapshot");
        }
        entry
    }

    /// Empty both layers. Does not wait for an in-flight refresh.
    #[instrument(level = "info", skip(self))]
    pub async fn clear(&self) {
        *self.inner.memory.write().await = None;
        if let Err(e) = self.inner.store.remove().await {
            warn!(path = %self.inner.store.path().display(), error = %e, "Failed to delete cache snapshot");
        }
        info!("Cache cleared");
    }

    async fn fresh_memory(&self) -> Option<Arc<CacheEntry>> {
        self.current()
            .await
            .filter(|entry| !self.inner.policy.is_stale(entry.captured_at))
    }

    async fn load_fresh_snapshot(&self) -> Option<Arc<CacheEntry>> {
        let entry = match self.inner.store.load().await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable cache snapshot");
                return None;
            }
        };
        if self.inner.policy.is_stale(entry.captured_at) {
            debug!(captured_at = %entry.captured_at, "Cache snapshot is stale");
            return None;
        }
        let entry = Arc::new(entry);
        *self.inner.memory.write().await = Some(entry.clone());
        Some(entry)
    }

    async fn spawn_refresh<F, Fut>(
        &self,
        guard: OwnedMutexGuard<()>,
        refresh: F,
    ) -> Result<Arc<CacheEntry>, ServiceError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Vec<Hackathon>> + Send + 'static,
    {
        let cache = self.clone();
        let task = tokio::spawn(async move {
            let _guard = guard;
            let records = refresh().await;
            cache.store_records(records).await
        });
        task.await.map_err(|e| ServiceError::RefreshAborted(e.to_string()))
    }
}
