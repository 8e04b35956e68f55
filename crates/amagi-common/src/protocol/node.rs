//! Node configuration.

use serde::{Deserialize, Serialize};

/// Connection details for one search backend.
///
/// A node is identified by its `identifier`, falling back to `host` when no
/// identifier is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// The name of the node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// The node's host, `domain:port`.
    pub host: String,
    /// The node's password, sent verbatim in the `authorization` header.
    pub auth: String,
    /// Use `https` instead of `http`.
    #[serde(default)]
    pub secure: bool,
}

impl NodeConfig {
    pub fn new(host: impl Into<String>, auth: impl Into<String>) -> Self {
        Self {
            identifier: None,
            host: host.into(),
            auth: auth.into(),
            secure: false,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Identifier of the node, or its host when none was configured.
    pub fn name(&self) -> &str {
        self.identifier.as_deref().unwrap_or(&self.host)
    }

    /// Base URL of the node, without a trailing slash.
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}", scheme, self.host)
    }
}
