use amagi_cache::CacheConfig;
use amagi_common::{AmagiError, NodeConfig, Result, SearchEngine, Track};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::plugin::Plugin;

/// Default per-request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Rewrites or drops a returned track. Runs on every result handed back to
/// the caller, cached or not.
pub type TrackModifier = Arc<dyn Fn(Track) -> Option<Track> + Send + Sync>;

/// Settings for requests sent to the nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Timeout of one HTTP exchange, in milliseconds. Default: 10000
    #[serde(rename = "timeout")]
    pub timeout_ms: u64,
    /// Node attempts per search. `None` tries every node that is not rate
    /// limited; a value is clamped to `1..=node count`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<usize>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retry: None,
        }
    }
}

impl RequestConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_retry(mut self, retry: usize) -> Self {
        self.retry = Some(retry);
        self
    }
}

/// Options for [`Amagi`](crate::Amagi).
#[derive(Clone, Default)]
pub struct AmagiOptions {
    /// Engine used when a search does not pick one. Default: YouTube
    pub default_engine: SearchEngine,
    /// Keep nodes that fail validation instead of failing `init()`.
    pub ignore_dead_node: bool,
    pub cache: CacheConfig,
    pub request: RequestConfig,
    pub modify_tracks: Option<TrackModifier>,
    pub plugins: Vec<Arc<dyn Plugin>>,
}

impl AmagiOptions {
    pub fn with_default_engine(mut self, engine: impl Into<SearchEngine>) -> Self {
        self.default_engine = engine.into();
        self
    }

    pub fn with_ignore_dead_node(mut self, ignore: bool) -> Self {
        self.ignore_dead_node = ignore;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_request(mut self, request: RequestConfig) -> Self {
        self.request = request;
        self
    }

    pub fn with_track_modifier<F>(mut self, modifier: F) -> Self
    where
        F: Fn(Track) -> Option<Track> + Send + Sync + 'static,
    {
        self.modify_tracks = Some(Arc::new(modifier));
        self
    }

    pub fn with_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }
}

impl fmt::Debug for AmagiOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AmagiOptions")
            .field("default_engine", &self.default_engine)
            .field("ignore_dead_node", &self.ignore_dead_node)
            .field("cache", &self.cache)
            .field("request", &self.request)
            .field("modify_tracks", &self.modify_tracks.is_some())
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Serializable dispatcher configuration, as read from a JSON file.
///
/// ```json
/// {
///   "nodes": [{ "identifier": "main", "host": "localhost:2333", "auth": "youshallnotpass" }],
///   "cache": { "enabled": true, "type": "memory", "timeout": 3600 },
///   "request": { "timeout": 5000, "retry": 2 },
///   "defaultEngine": "soundcloud",
///   "ignoreDeadNode": true
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AmagiConfig {
    pub nodes: Vec<NodeConfig>,
    pub cache: CacheConfig,
    pub request: RequestConfig,
    pub default_engine: SearchEngine,
    pub ignore_dead_node: bool,
}

impl AmagiConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AmagiError::InvalidConfig(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| AmagiError::InvalidConfig(format!("{}: {}", path.display(), e)))
    }

    /// Splits into the node list and the options for [`Amagi::new`](crate::Amagi::new).
    pub fn into_parts(self) -> (Vec<NodeConfig>, AmagiOptions) {
        let options = AmagiOptions {
            default_engine: self.default_engine,
            ignore_dead_node: self.ignore_dead_node,
            cache: self.cache,
            request: self.request,
            ..Default::default()
        };
        (self.nodes, options)
    }
}
