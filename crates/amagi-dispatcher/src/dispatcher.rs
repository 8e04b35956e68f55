use amagi_cache::CacheManager;
use amagi_common::{
    AmagiError, EventEmitter, EventListener, NodeConfig, Result, SearchOptions, SearchQuery,
    SearchResult, CACHE_NODE,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::AmagiOptions;
use crate::node::NodeClient;
use crate::pool::NodePool;
use crate::status::{Status, StatusReporter};

/// Search dispatcher.
///
/// Resolves queries to lookup keys, serves them from the cache when possible
/// and otherwise sends them to a random node, failing over to other nodes on
/// transport errors and rate limits.
pub struct Amagi {
    node_configs: Vec<NodeConfig>,
    options: AmagiOptions,
    pool: OnceCell<NodePool>,
    cache: CacheManager,
    events: EventEmitter,
}

impl Amagi {
    /// Creates the dispatcher, opens the cache and loads plugins. Nodes are
    /// contacted by [`init`](Self::init) only.
    pub fn new(nodes: Vec<NodeConfig>, options: AmagiOptions) -> Result<Self> {
        Self::with_events(nodes, options, EventEmitter::new())
    }

    /// Like [`new`](Self::new), with listeners already attached so they see
    /// the events emitted during construction.
    pub fn with_events(
        nodes: Vec<NodeConfig>,
        options: AmagiOptions,
        events: EventEmitter,
    ) -> Result<Self> {
        let cache = CacheManager::new(options.cache.clone(), events.clone())?;
        let amagi = Self {
            node_configs: nodes,
            options,
            pool: OnceCell::new(),
            cache,
            events,
        };

        for plugin in &amagi.options.plugins {
            info!("Loading plugin {}", plugin.name());
            plugin.load(&amagi);
        }

        Ok(amagi)
    }

    /// Validates the configured nodes. Runs once; later calls return
    /// immediately. A failed attempt leaves the dispatcher uninitialized and
    /// may be retried.
    pub async fn init(&self) -> Result<()> {
        self.pool
            .get_or_try_init(|| {
                NodePool::initialize(
                    self.node_configs.clone(),
                    &self.options.request,
                    self.options.ignore_dead_node,
                    &self.events,
                )
            })
            .await?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.pool.initialized()
    }

    /// Searches `query`, or loads it directly when it is a URL.
    ///
    /// Results whose `node_used` is [`CACHE_NODE`] came from the cache.
    pub async fn search(&self, query: &str, options: SearchOptions) -> Result<SearchResult> {
        let pool = self.pool.get().ok_or(AmagiError::NotInitialized)?;

        let engine = options
            .engine
            .unwrap_or_else(|| self.options.default_engine.clone());
        let key = SearchQuery::resolve(query, engine).lookup_key();

        if self.cache.enabled() {
            if let Some(mut cached) = self.cache.cache().get(&key) {
                self.events.debug(format!("Cache hit for {}", key));
                cached.node_used = CACHE_NODE.to_string();
                return Ok(self.apply_track_modifier(cached));
            }
        }

        let result = self.dispatch(pool, &key).await?;

        if self.cache.enabled() {
            // The value stays readable from memory even when persisting fails
            if let Err(e) = self.store(&key, result.clone()).await {
                warn!("Failed to persist cache entry {}: {}", key, e);
                self.events
                    .debug(format!("Failed to persist cache entry {}: {}", key, e));
            }
        }

        Ok(self.apply_track_modifier(result))
    }

    /// Writes to the cache on the blocking pool. The storage backend syncs
    /// the file on every write.
    async fn store(&self, key: &str, result: SearchResult) -> Result<()> {
        let cache = self.cache.cache().clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || cache.set(&key, result))
            .await
            .map_err(|e| AmagiError::Persistence(format!("cache write task failed: {}", e)))?
    }

    /// Sends `key` to nodes until one answers with a usable result.
    ///
    /// Transport failures exclude the node for the rest of the call and count
    /// against the retry budget. Rate-limited answers take the node out of
    /// rotation and do not count.
    async fn dispatch(&self, pool: &NodePool, key: &str) -> Result<SearchResult> {
        let budget = self.retry_budget(pool);
        let mut failed: HashSet<String> = HashSet::new();
        let mut attempts = 0;

        loop {
            if attempts > 0 && attempts >= budget {
                warn!("Search for {} failed after {} attempts", key, attempts);
                return Err(AmagiError::NoResults { attempts });
            }

            let node = match pool.select(&failed) {
                Ok(node) => node,
                Err(_) if attempts > 0 => return Err(AmagiError::NoResults { attempts }),
                Err(e) => return Err(e),
            };

            match node.load_tracks(key).await {
                Ok(result) if result.is_rate_limited() => {
                    if node.mark_rate_limited() {
                        warn!(node = %node.name(), "Node rate limited");
                        self.events.rate_limited(node.name());
                    }
                    self.events.debug(format!(
                        "{} rate limited, using another node...",
                        node.name()
                    ));
                }
                Ok(result) => {
                    debug!(node = %node.name(), "Loaded {} ({:?})", key, result.load_type);
                    return Ok(result.with_node_used(node.name()));
                }
                Err(e) => {
                    attempts += 1;
                    warn!(
                        node = %node.name(),
                        "Search attempt {}/{} failed: {}",
                        attempts, budget, e
                    );
                    self.events.debug(format!(
                        "Search on {} failed (attempt {}/{}): {}",
                        node.name(),
                        attempts,
                        budget,
                        e
                    ));
                    failed.insert(node.name().to_string());
                }
            }
        }
    }

    fn retry_budget(&self, pool: &NodePool) -> usize {
        match self.options.request.retry {
            Some(retry) => retry.clamp(1, pool.len().max(1)),
            None => pool.available_count(),
        }
    }

    fn apply_track_modifier(&self, mut result: SearchResult) -> SearchResult {
        if let Some(modifier) = &self.options.modify_tracks {
            result.tracks = std::mem::take(&mut result.tracks)
                .into_iter()
                .filter_map(|track| modifier(track))
                .collect();
        }
        result
    }

    /// Probes every node and reports the cache state.
    pub async fn get_status(&self) -> Status {
        StatusReporter::snapshot(self.pool.get(), &self.cache).await
    }

    pub fn subscribe(&self, listener: impl EventListener + 'static) {
        self.events.subscribe(listener);
    }

    pub fn events(&self) -> &EventEmitter {
        &self.events
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn options(&self) -> &AmagiOptions {
        &self.options
    }

    /// Nodes of the pool; empty before `init()` succeeds.
    pub fn nodes(&self) -> &[Arc<NodeClient>] {
        self.pool.get().map(NodePool::all).unwrap_or(&[])
    }

    pub fn node(&self, name: &str) -> Option<Arc<NodeClient>> {
        self.pool.get().and_then(|pool| pool.get(name))
    }
}

impl Drop for Amagi {
    fn drop(&mut self) {
        for plugin in &self.options.plugins {
            debug!("Unloading plugin {}", plugin.name());
            plugin.unload(self);
        }
    }
}

impl std::fmt::Debug for Amagi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Amagi")
            .field("nodes", &self.node_configs.len())
            .field("initialized", &self.is_initialized())
            .field("options", &self.options)
            .finish()
    }
}
