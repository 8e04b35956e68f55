use amagi_common::{AmagiError, EventEmitter, NodeConfig, Result};
use futures::future::join_all;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use crate::config::RequestConfig;
use crate::node::NodeClient;

/// Fixed set of validated nodes.
///
/// Membership never changes after [`initialize`](NodePool::initialize); only
/// the per-node rate-limit flags move.
#[derive(Debug)]
pub struct NodePool {
    nodes: Vec<Arc<NodeClient>>,
}

impl NodePool {
    /// Builds clients for `configs` and validates them concurrently.
    ///
    /// Fails on the first invalid node unless `ignore_dead_node` is set.
    pub async fn initialize(
        configs: Vec<NodeConfig>,
        request: &RequestConfig,
        ignore_dead_node: bool,
        events: &EventEmitter,
    ) -> Result<Self> {
        {
            let mut seen = HashSet::new();
            for config in &configs {
                if !seen.insert(config.name()) {
                    return Err(AmagiError::InvalidConfig(format!(
                        "duplicate node name: {}",
                        config.name()
                    )));
                }
            }
        }

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AmagiError::InvalidConfig(format!("failed to build HTTP client: {}", e)))?;

        let nodes: Vec<Arc<NodeClient>> = configs
            .into_iter()
            .map(|config| {
                Arc::new(NodeClient::new(
                    config,
                    http.clone(),
                    request.timeout(),
                    events.clone(),
                ))
            })
            .collect();

        events.debug("Validating nodes...");
        let results = join_all(nodes.iter().map(|node| node.validate(ignore_dead_node))).await;
        if let Some(err) = results.into_iter().find_map(Result::err) {
            return Err(err);
        }

        info!("{} nodes loaded", nodes.len());
        events.debug(format!("{} nodes loaded", nodes.len()));
        Ok(Self { nodes })
    }

    /// Wraps already constructed clients without validating them.
    pub fn from_clients(nodes: Vec<Arc<NodeClient>>) -> Self {
        Self { nodes }
    }

    /// Picks a random node that is neither rate limited nor in `excluding`.
    pub fn select(&self, excluding: &HashSet<String>) -> Result<Arc<NodeClient>> {
        let candidates: Vec<&Arc<NodeClient>> = self
            .nodes
            .iter()
            .filter(|node| !node.is_rate_limited() && !excluding.contains(node.name()))
            .collect();

        candidates
            .choose(&mut rand::thread_rng())
            .map(|node| Arc::clone(*node))
            .ok_or(AmagiError::NoNodesAvailable)
    }

    pub fn all(&self) -> &[Arc<NodeClient>] {
        &self.nodes
    }

    pub fn get(&self, name: &str) -> Option<Arc<NodeClient>> {
        self.nodes.iter().find(|node| node.name() == name).cloned()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes currently in rotation.
    pub fn available_count(&self) -> usize {
        self.nodes.iter().filter(|node| !node.is_rate_limited()).count()
    }
}
