use thiserror::Error;

#[derive(Error, Debug)]
pub enum AmagiError {
    #[error("Nodes not loaded, call init() first")]
    NotInitialized,

    #[error("Invalid node {node}: {reason}")]
    InvalidNode { node: String, reason: String },

    #[error("No nodes available")]
    NoNodesAvailable,

    #[error("No results after {attempts} attempt(s)")]
    NoResults { attempts: usize },

    #[error("Request error: {0}")]
    Request(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Cache persistence error: {0}")]
    Persistence(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),
}

impl AmagiError {
    /// Failures of a single node that the dispatcher recovers from by
    /// trying another node.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AmagiError::Request(_) | AmagiError::Timeout(_) | AmagiError::Decode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AmagiError>;
