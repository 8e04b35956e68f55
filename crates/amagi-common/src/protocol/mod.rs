pub mod error;
pub mod node;
pub mod search;
pub mod track;

#[cfg(test)]
mod tests;

pub use error::{AmagiError, Result};
pub use node::NodeConfig;
pub use search::{
    is_url, LoadException, LoadType, PlaylistInfo, SearchEngine, SearchOptions, SearchQuery,
    SearchResult, CACHE_NODE,
};
pub use track::{Track, TrackInfo};
