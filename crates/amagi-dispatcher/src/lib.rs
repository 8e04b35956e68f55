//! Amagi Search Dispatcher
//!
//! Distributes track searches across a pool of search nodes.
//!
//! # Flow
//!
//! 1. [`Amagi::init`] validates every node concurrently (`GET /` must answer
//!    HTTP 400).
//! 2. [`Amagi::search`] resolves the query to a lookup key, checks the cache,
//!    then sends `GET /loadtracks` to a random node in rotation.
//! 3. Transport failures fail over to another node until the retry budget is
//!    spent. Rate-limited answers take the node out of rotation and fail over
//!    without spending budget.
//!
//! # Example
//!
//! ```no_run
//! use amagi_dispatcher::{Amagi, AmagiOptions};
//! use amagi_common::{NodeConfig, SearchOptions};
//!
//! # async fn run() -> amagi_common::Result<()> {
//! let amagi = Amagi::new(
//!     vec![NodeConfig::new("localhost:2333", "youshallnotpass")],
//!     AmagiOptions::default(),
//! )?;
//! amagi.init().await?;
//!
//! let result = amagi.search("never gonna give you up", SearchOptions::default()).await?;
//! println!("{} tracks from {}", result.tracks.len(), result.node_used);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatcher;
pub mod node;
pub mod plugin;
pub mod pool;
pub mod status;

pub use config::{AmagiConfig, AmagiOptions, RequestConfig, TrackModifier, DEFAULT_TIMEOUT_MS};
pub use dispatcher::Amagi;
pub use node::{NodeClient, NodeHealth, NodeStatus, NodeStatusReport, RawResponse};
pub use plugin::Plugin;
pub use pool::NodePool;
pub use status::{CacheStatus, Status, StatusReporter};
