//! Track payloads as served by `/loadtracks`.

use serde::{Deserialize, Serialize};

/// A playable track.
///
/// `track` is the backend's opaque encoded payload; it is handed back to the
/// player untouched. `info` carries the decoded metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub track: String,
    pub info: TrackInfo,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub identifier: String,
    #[serde(default)]
    pub is_seekable: bool,
    #[serde(default)]
    pub author: String,
    /// Duration in milliseconds.
    #[serde(default)]
    pub length: u64,
    #[serde(default)]
    pub is_stream: bool,
    /// Playback position in milliseconds.
    #[serde(default)]
    pub position: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub source_name: String,
}

impl Track {
    pub fn new(track: impl Into<String>, info: TrackInfo) -> Self {
        Self {
            track: track.into(),
            info,
        }
    }
}
