use amagi_cache::{CacheKind, CacheManager};
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::node::NodeStatus;
use crate::pool::NodePool;

/// Point-in-time view of the nodes and the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub nodes: Vec<NodeStatus>,
    pub cache: CacheStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatus {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: CacheKind,
    /// Sweep interval in seconds as configured; non-positive means never.
    pub timeout: i64,
    /// Entries currently cached.
    pub total: usize,
}

impl CacheStatus {
    pub fn of(cache: &CacheManager) -> Self {
        let config = cache.config();
        Self {
            enabled: config.enabled,
            kind: config.kind,
            timeout: config.timeout,
            total: cache.total(),
        }
    }
}

/// Builds [`Status`] snapshots. Read only: probing a node never changes its
/// rate-limit flag or validation state.
pub struct StatusReporter;

impl StatusReporter {
    /// Probes every node concurrently. A pool that is not initialized yet
    /// reports no nodes.
    pub async fn snapshot(pool: Option<&NodePool>, cache: &CacheManager) -> Status {
        let nodes = match pool {
            Some(pool) => join_all(pool.all().iter().map(|node| node.status())).await,
            None => Vec::new(),
        };

        Status {
            nodes,
            cache: CacheStatus::of(cache),
        }
    }
}
