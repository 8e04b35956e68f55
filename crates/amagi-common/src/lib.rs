//! Amagi Common Types
//!
//! This crate provides the protocol definitions, error taxonomy and event
//! plumbing shared by the Amagi search dispatcher crates.
//!
//! # Overview
//!
//! Amagi distributes track searches across a pool of Lavalink-style search
//! nodes. Nodes are plain HTTP servers exposing two endpoints:
//!
//! - `GET /`: health probe, answers HTTP 400 when the credentials are accepted
//! - `GET /loadtracks?identifier=<key>`: search, answers a JSON [`SearchResult`]
//!
//! # Components
//!
//! - [`protocol`] - Track/search payloads, node configuration, search engines, errors
//! - [`events`] - Observer-style telemetry ([`AmagiEvent`], [`EventEmitter`])
//!
//! # Example
//!
//! ```
//! use amagi_common::{SearchEngine, SearchQuery};
//!
//! let query = SearchQuery::resolve("never gonna give you up", SearchEngine::YouTube);
//! assert_eq!(query.lookup_key(), "ytsearch:never gonna give you up");
//! ```

pub mod events;
pub mod protocol;

pub use events::{AmagiEvent, EventEmitter, EventListener, RequestEvent};
pub use protocol::*;
