use amagi_common::{EventEmitter, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::cache::{Cache, CacheKind};
use crate::memory::MemoryCache;
use crate::storage::StorageCache;

/// Default location of the durable cache file.
pub const DEFAULT_STORAGE_PATH: &str = ".cache/amagi.json";

/// Cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable cache. Default: false
    pub enabled: bool,
    /// Backend. Default: memory
    #[serde(rename = "type")]
    pub kind: CacheKind,
    /// Seconds between full cache sweeps. Non-positive never sweeps.
    /// Default: -1
    pub timeout: i64,
    /// File backing the storage backend.
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            kind: CacheKind::Memory,
            timeout: -1,
            path: PathBuf::from(DEFAULT_STORAGE_PATH),
        }
    }
}

impl CacheConfig {
    pub fn memory() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    pub fn storage(path: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            kind: CacheKind::Storage,
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, seconds: i64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Interval of the background sweep, if any.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout as u64))
    }
}

/// Owns the configured cache backend and its sweep task.
///
/// A disabled manager still holds an (always empty) memory cache so status
/// reporting has something to count; the configured backend is only opened
/// when caching is enabled.
pub struct CacheManager {
    cache: Arc<dyn Cache>,
    config: CacheConfig,
    sweeper: Option<tokio::task::JoinHandle<()>>,
}

impl CacheManager {
    pub fn new(config: CacheConfig, events: EventEmitter) -> Result<Self> {
        let cache: Arc<dyn Cache> = match (config.enabled, config.kind) {
            (true, CacheKind::Storage) => {
                Arc::new(StorageCache::open(config.path.clone(), events.clone())?)
            }
            _ => Arc::new(MemoryCache::new(events.clone())),
        };

        Ok(Self::with_cache(config, cache, events))
    }

    /// Uses a caller-provided backend instead of the built-in ones.
    pub fn with_cache(config: CacheConfig, cache: Arc<dyn Cache>, events: EventEmitter) -> Self {
        let sweeper = match config.sweep_interval() {
            Some(period) if config.enabled => Self::spawn_sweeper(cache.clone(), period, events),
            _ => None,
        };

        Self {
            cache,
            config,
            sweeper,
        }
    }

    fn spawn_sweeper(
        cache: Arc<dyn Cache>,
        period: Duration,
        events: EventEmitter,
    ) -> Option<tokio::task::JoinHandle<()>> {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No tokio runtime available, cache timeout of {:?} disabled", period);
                return None;
            }
        };

        info!("Cache will be cleared every {:?}", period);
        Some(handle.spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);

            loop {
                interval.tick().await;
                match cache.clear() {
                    Ok(()) => events.debug("Cache cleared"),
                    Err(e) => warn!("Failed to clear cache: {}", e),
                }
            }
        }))
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn total(&self) -> usize {
        self.cache.total()
    }

    pub fn has_sweeper(&self) -> bool {
        self.sweeper.is_some()
    }
}

impl Drop for CacheManager {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}
