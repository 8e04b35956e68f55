// Copyright 2025 Amagi Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use amagi_common::{NodeConfig, SearchEngine, SearchOptions, SearchResult};
use amagi_dispatcher::{Amagi, AmagiConfig, Status};
use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;

/// Node and request settings shared by the subcommands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectOptions {
    /// JSON config file, loaded first
    pub config: Option<PathBuf>,
    /// `auth@host` specs, appended to the configured nodes
    pub nodes: Vec<String>,
    /// Use https for the `nodes` specs
    pub secure: bool,
    pub timeout_ms: Option<u64>,
    pub retry: Option<usize>,
    pub ignore_dead_node: bool,
}

/// Parses an `auth@host` node spec. The host is everything after the last
/// `@`, so passwords may contain `@`.
pub fn parse_node(spec: &str, secure: bool) -> Result<NodeConfig> {
    let (auth, host) = spec
        .rsplit_once('@')
        .ok_or_else(|| anyhow!("Invalid node '{}': expected auth@host", spec))?;

    if host.is_empty() {
        bail!("Invalid node '{}': missing host", spec);
    }
    if host.starts_with("http://") || host.starts_with("https://") {
        bail!(
            "Invalid node '{}': host must not include a scheme, use --secure for https",
            spec
        );
    }

    Ok(NodeConfig::new(host, auth).with_secure(secure))
}

/// Merges the config file and the command line flags. Flags win.
pub fn resolve_config(options: &ConnectOptions) -> Result<AmagiConfig> {
    let mut config = match &options.config {
        Some(path) => AmagiConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AmagiConfig::default(),
    };

    for spec in &options.nodes {
        config.nodes.push(parse_node(spec, options.secure)?);
    }
    if let Some(timeout_ms) = options.timeout_ms {
        config.request.timeout_ms = timeout_ms;
    }
    if let Some(retry) = options.retry {
        config.request.retry = Some(retry);
    }
    if options.ignore_dead_node {
        config.ignore_dead_node = true;
    }

    if config.nodes.is_empty() {
        bail!("No nodes configured. Use --node auth@host or a config file with a \"nodes\" list");
    }
    Ok(config)
}

async fn connect(config: AmagiConfig) -> Result<Amagi> {
    let (nodes, options) = config.into_parts();
    let amagi = Amagi::new(nodes, options)?;
    amagi.init().await?;
    Ok(amagi)
}

/// Runs one search. `engine` overrides the configured default engine.
pub async fn search(
    config: AmagiConfig,
    query: &str,
    engine: Option<SearchEngine>,
) -> Result<SearchResult> {
    let amagi = connect(config).await?;
    let result = amagi.search(query, SearchOptions { engine }).await?;
    tracing::info!("{} track(s) from {}", result.tracks.len(), result.node_used);
    Ok(result)
}

/// Probes every node. Dead nodes are reported, never fatal.
pub async fn status(mut config: AmagiConfig) -> Result<Status> {
    config.ignore_dead_node = true;
    let amagi = connect(config).await?;
    Ok(amagi.get_status().await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_node() {
        let node = parse_node("youshallnotpass@localhost:2333", false).unwrap();
        assert_eq!(node.host, "localhost:2333");
        assert_eq!(node.auth, "youshallnotpass");
        assert!(!node.secure);
        assert_eq!(node.name(), "localhost:2333");
    }

    #[test]
    fn test_parse_node_password_with_at() {
        let node = parse_node("p@ss@lava.example:443", true).unwrap();
        assert_eq!(node.auth, "p@ss");
        assert_eq!(node.host, "lava.example:443");
        assert!(node.secure);
    }

    #[test]
    fn test_parse_node_errors() {
        assert!(parse_node("localhost:2333", false).is_err());
        assert!(parse_node("pw@", false).is_err());
        assert!(parse_node("pw@http://localhost:2333", false).is_err());
    }

    #[test]
    fn test_resolve_config_requires_nodes() {
        let err = resolve_config(&ConnectOptions::default()).unwrap_err();
        assert!(err.to_string().contains("No nodes configured"));
    }

    #[test]
    fn test_resolve_config_flags_override_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"{
                "nodes": [{"identifier": "main", "host": "localhost:2333", "auth": "pw"}],
                "request": {"timeout": 5000, "retry": 3},
                "defaultEngine": "soundcloud"
            }"#,
        )
        .unwrap();

        let config = resolve_config(&ConnectOptions {
            config: Some(file.path().to_path_buf()),
            nodes: vec!["pw2@backup:2333".to_string()],
            timeout_ms: Some(750),
            ignore_dead_node: true,
            ..Default::default()
        })
        .unwrap();

        assert_eq!(config.nodes.len(), 2);
        assert_eq!(config.nodes[0].name(), "main");
        assert_eq!(config.nodes[1].name(), "backup:2333");
        assert_eq!(config.request.timeout_ms, 750);
        assert_eq!(config.request.retry, Some(3));
        assert_eq!(config.default_engine, SearchEngine::SoundCloud);
        assert!(config.ignore_dead_node);
    }

    #[test]
    fn test_resolve_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_config(&ConnectOptions {
            config: Some(dir.path().join("missing.json")),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }
}
