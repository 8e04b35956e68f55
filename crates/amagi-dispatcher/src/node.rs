use amagi_common::{AmagiError, EventEmitter, NodeConfig, RequestEvent, Result, SearchResult};
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// `User-Agent` sent with every request.
pub const AMAGI_USER_AGENT: &str = "Amagi/1.0";

/// Status the root endpoint answers when the node is alive and the
/// credentials were accepted.
pub const HEALTH_PROBE_STATUS: u16 = 400;

/// Status reported for a health probe that never got an answer.
const UNREACHABLE_STATUS: u16 = 500;

const UNVALIDATED: u8 = 0;
const HEALTHY: u8 = 1;
const DEAD: u8 = 2;

/// Health of a node as seen by the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeHealth {
    /// Created, validation not run yet
    Unvalidated,
    /// Passed validation
    Healthy,
    /// Failed validation but kept because dead nodes are ignored
    Dead,
    /// Reported upstream throttling; out of rotation until `enable()`
    RateLimited,
}

/// Health probe result for one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub identifier: String,
    pub status: NodeStatusReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatusReport {
    pub rate_limited: bool,
    pub dead: bool,
    /// Round trip of the probe in milliseconds
    pub latency: u64,
}

/// Status code and body of a node response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Client for one search node.
///
/// The validation state and the rate-limit flag are atomics: selection reads
/// them without locking while concurrent searches may flip them.
pub struct NodeClient {
    config: NodeConfig,
    http: reqwest::Client,
    timeout: Duration,
    state: AtomicU8,
    rate_limited: AtomicBool,
    events: EventEmitter,
}

impl NodeClient {
    pub fn new(
        config: NodeConfig,
        http: reqwest::Client,
        timeout: Duration,
        events: EventEmitter,
    ) -> Self {
        Self {
            config,
            http,
            timeout,
            state: AtomicU8::new(UNVALIDATED),
            rate_limited: AtomicBool::new(false),
            events,
        }
    }

    /// Identifier of the node, falling back to its host.
    pub fn name(&self) -> &str {
        self.config.name()
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn health(&self) -> NodeHealth {
        if self.is_rate_limited() {
            return NodeHealth::RateLimited;
        }
        match self.state.load(Ordering::Acquire) {
            HEALTHY => NodeHealth::Healthy,
            DEAD => NodeHealth::Dead,
            _ => NodeHealth::Unvalidated,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.rate_limited.load(Ordering::Acquire)
    }

    /// Takes the node out of rotation. Returns `true` if this call flipped
    /// the flag, `false` if the node was already rate limited.
    pub fn mark_rate_limited(&self) -> bool {
        !self.rate_limited.swap(true, Ordering::AcqRel)
    }

    /// Puts a rate limited node back in rotation, e.g. once the upstream
    /// block has been lifted. Returns whether the node was rate limited.
    pub fn enable(&self) -> bool {
        self.rate_limited.swap(false, Ordering::AcqRel)
    }

    /// Builds the request URL. Parameters keep their order and values are
    /// percent-encoded. Without parameters the URL carries no query.
    pub fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let base = format!("{}{}", self.config.base_url(), path);
        let url = if params.is_empty() {
            Url::parse(&base)
        } else {
            Url::parse_with_params(&base, params)
        };
        url.map_err(|e| AmagiError::InvalidConfig(format!("{}: invalid URL {}: {}", self.name(), base, e)))
    }

    /// Sends an authenticated request and reads the whole body.
    ///
    /// The exchange runs under the node timeout. On expiry the request future
    /// is dropped, which aborts the connection.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<RawResponse> {
        let url = self.url(path, params)?;
        let start = Instant::now();

        let exchange = async {
            let response = self
                .http
                .request(method.clone(), url.clone())
                .header(USER_AGENT, AMAGI_USER_AGENT)
                .header(AUTHORIZATION, self.config.auth.as_str())
                .send()
                .await?;
            let status = response.status().as_u16();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body.to_vec()))
        };

        let (status, body) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| AmagiError::Timeout(self.timeout.as_millis() as u64))?
            .map_err(|e| AmagiError::Request(format!("{} {}: {}", method, url, e)))?;

        self.events.request(RequestEvent {
            method: method.to_string(),
            path: path.to_string(),
            url: url.to_string(),
            status,
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
        });

        Ok(RawResponse { status, body })
    }

    /// GET `path` and decode the JSON body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        let response = self.request(Method::GET, path, params).await?;
        if !(200..300).contains(&response.status) {
            return Err(AmagiError::Request(format!(
                "{} answered HTTP {} for {}",
                self.name(),
                response.status,
                path
            )));
        }

        serde_json::from_slice(&response.body)
            .map_err(|e| AmagiError::Decode(format!("{} {}: {}", self.name(), path, e)))
    }

    /// Runs `/loadtracks` for a lookup key.
    pub async fn load_tracks(&self, identifier: &str) -> Result<SearchResult> {
        self.get("/loadtracks", &[("identifier", identifier)]).await
    }

    /// Checks that the node is alive and accepts our credentials.
    ///
    /// With `ignore_dead_node` a failing node is marked dead but kept, and
    /// searches may still be sent to it.
    pub async fn validate(&self, ignore_dead_node: bool) -> Result<()> {
        let reason = match self.request(Method::GET, "/", &[]).await {
            Ok(response) if response.status == HEALTH_PROBE_STATUS => {
                self.state.store(HEALTHY, Ordering::Release);
                self.events.debug(format!("Node {} validated", self.name()));
                return Ok(());
            }
            Ok(response) => format!("health probe answered HTTP {}", response.status),
            Err(e) => e.to_string(),
        };

        if ignore_dead_node {
            self.state.store(DEAD, Ordering::Release);
            warn!(node = %self.name(), "Ignoring dead node: {}", reason);
            self.events
                .debug(format!("Node {} is dead ({}), ignoring", self.name(), reason));
            return Ok(());
        }

        Err(AmagiError::InvalidNode {
            node: self.name().to_string(),
            reason,
        })
    }

    /// Probes the node. Never fails: an unreachable node reports HTTP 500
    /// and comes back as dead.
    pub async fn status(&self) -> NodeStatus {
        let start = Instant::now();
        let status = match self.request(Method::GET, "/", &[]).await {
            Ok(response) => response.status,
            Err(e) => {
                debug!(node = %self.name(), "Health probe failed: {}", e);
                UNREACHABLE_STATUS
            }
        };

        NodeStatus {
            identifier: self.name().to_string(),
            status: NodeStatusReport {
                rate_limited: self.is_rate_limited(),
                dead: status != HEALTH_PROBE_STATUS,
                latency: start.elapsed().as_millis() as u64,
            },
        }
    }
}

impl std::fmt::Debug for NodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeClient")
            .field("name", &self.name())
            .field("host", &self.config.host)
            .field("health", &self.health())
            .finish()
    }
}
