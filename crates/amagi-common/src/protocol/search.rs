//! Search requests and results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::track::Track;

/// `nodeUsed` value of a result served from the cache.
pub const CACHE_NODE: &str = "cache";

/// Lower-cased fragments that backends put in exception messages when they
/// are being throttled upstream.
const RATE_LIMIT_MARKERS: [&str; 3] = ["429", "rate limit", "too many requests"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadType {
    TrackLoaded,
    PlaylistLoaded,
    SearchResult,
    NoMatches,
    LoadFailed,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_track: Option<i64>,
}

/// Exception attached to a `LOAD_FAILED` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadException {
    pub message: String,
    pub severity: String,
    /// Upstream HTTP status, for backends that report one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl LoadException {
    pub fn new(message: impl Into<String>, severity: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: severity.into(),
            status: None,
        }
    }

    /// Whether the exception reports upstream throttling.
    ///
    /// A structured `status` wins; the message is only inspected when the
    /// backend did not send one.
    pub fn is_rate_limit(&self) -> bool {
        if let Some(status) = self.status {
            return status == 429;
        }
        let message = self.message.to_ascii_lowercase();
        RATE_LIMIT_MARKERS.iter().any(|marker| message.contains(marker))
    }
}

/// Result of a `/loadtracks` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub load_type: LoadType,
    #[serde(default)]
    pub playlist_info: PlaylistInfo,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<LoadException>,
    /// Node that produced the result, or [`CACHE_NODE`].
    #[serde(default)]
    pub node_used: String,
}

impl SearchResult {
    pub fn new(load_type: LoadType, tracks: Vec<Track>) -> Self {
        Self {
            load_type,
            playlist_info: PlaylistInfo::default(),
            tracks,
            exception: None,
            node_used: String::new(),
        }
    }

    pub fn failed(exception: LoadException) -> Self {
        Self {
            exception: Some(exception),
            ..Self::new(LoadType::LoadFailed, Vec::new())
        }
    }

    pub fn with_node_used(mut self, node: impl Into<String>) -> Self {
        self.node_used = node.into();
        self
    }

    /// `LOAD_FAILED` because the serving node is throttled upstream.
    pub fn is_rate_limited(&self) -> bool {
        self.load_type == LoadType::LoadFailed
            && self
                .exception
                .as_ref()
                .is_some_and(LoadException::is_rate_limit)
    }
}

/// Backend search mode, selected by a query prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SearchEngine {
    #[default]
    YouTube,
    YouTubeMusic,
    SoundCloud,
    /// Any other prefix, used verbatim.
    Custom(String),
}

impl SearchEngine {
    pub fn prefix(&self) -> &str {
        match self {
            SearchEngine::YouTube => "ytsearch:",
            SearchEngine::YouTubeMusic => "ytmsearch:",
            SearchEngine::SoundCloud => "scsearch:",
            SearchEngine::Custom(prefix) => prefix,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SearchEngine::YouTube => "youtube",
            SearchEngine::YouTubeMusic => "youtubeMusic",
            SearchEngine::SoundCloud => "soundcloud",
            SearchEngine::Custom(prefix) => prefix,
        }
    }
}

impl From<&str> for SearchEngine {
    fn from(value: &str) -> Self {
        match value {
            "youtube" => SearchEngine::YouTube,
            "youtubeMusic" | "youtube_music" => SearchEngine::YouTubeMusic,
            "soundcloud" => SearchEngine::SoundCloud,
            other => SearchEngine::Custom(other.to_string()),
        }
    }
}

impl From<String> for SearchEngine {
    fn from(value: String) -> Self {
        SearchEngine::from(value.as_str())
    }
}

impl From<SearchEngine> for String {
    fn from(engine: SearchEngine) -> Self {
        engine.name().to_string()
    }
}

impl FromStr for SearchEngine {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SearchEngine::from(s))
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-call search options.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Overrides the dispatcher's default engine.
    pub engine: Option<SearchEngine>,
}

impl SearchOptions {
    pub fn with_engine(engine: impl Into<SearchEngine>) -> Self {
        Self {
            engine: Some(engine.into()),
        }
    }
}

/// A user query resolved against a search engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub raw: String,
    /// `None` for URL queries, which are passed through.
    pub engine: Option<SearchEngine>,
}

impl SearchQuery {
    pub fn resolve(raw: impl Into<String>, engine: SearchEngine) -> Self {
        let raw = raw.into();
        let engine = if is_url(&raw) { None } else { Some(engine) };
        Self { raw, engine }
    }

    pub fn is_url(&self) -> bool {
        self.engine.is_none()
    }

    /// Identifier sent to `/loadtracks`, also the cache key.
    pub fn lookup_key(&self) -> String {
        match &self.engine {
            Some(engine) => format!("{}{}", engine.prefix(), self.raw),
            None => self.raw.clone(),
        }
    }
}

/// Absolute `http://` or `https://` URL.
pub fn is_url(query: &str) -> bool {
    query.starts_with("http://") || query.starts_with("https://")
}
