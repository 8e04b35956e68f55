//! Integration tests for the protocol module
//!
//! These tests cover the backend JSON shapes, lookup key composition and
//! rate-limit detection.

#[cfg(test)]
mod tests {
    use super::super::*;
    use serde_json::json;

    fn sample_track(id: &str) -> serde_json::Value {
        json!({
            "track": format!("QAAA{}", id),
            "info": {
                "identifier": id,
                "isSeekable": true,
                "author": "Rick Astley",
                "length": 212000,
                "isStream": false,
                "position": 0,
                "title": "Never Gonna Give You Up",
                "uri": format!("https://www.youtube.com/watch?v={}", id),
                "sourceName": "youtube"
            }
        })
    }

    #[test]
    fn test_decode_search_result() {
        let body = json!({
            "loadType": "SEARCH_RESULT",
            "playlistInfo": {},
            "tracks": [sample_track("dQw4w9WgXcQ")]
        });

        let result: SearchResult = serde_json::from_value(body).unwrap();
        assert_eq!(result.load_type, LoadType::SearchResult);
        assert_eq!(result.tracks.len(), 1);
        assert_eq!(result.tracks[0].info.identifier, "dQw4w9WgXcQ");
        assert_eq!(result.tracks[0].info.length, 212000);
        assert!(result.tracks[0].info.is_seekable);
        assert_eq!(result.tracks[0].info.source_name, "youtube");
        assert!(result.exception.is_none());
        assert!(result.node_used.is_empty());
    }

    #[test]
    fn test_decode_playlist_info() {
        let body = json!({
            "loadType": "PLAYLIST_LOADED",
            "playlistInfo": {"name": "Mix", "selectedTrack": 3},
            "tracks": []
        });

        let result: SearchResult = serde_json::from_value(body).unwrap();
        assert_eq!(result.load_type, LoadType::PlaylistLoaded);
        assert_eq!(result.playlist_info.name.as_deref(), Some("Mix"));
        assert_eq!(result.playlist_info.selected_track, Some(3));
    }

    #[test]
    fn test_decode_missing_optional_fields() {
        let result: SearchResult = serde_json::from_value(json!({"loadType": "NO_MATCHES"})).unwrap();
        assert_eq!(result.load_type, LoadType::NoMatches);
        assert!(result.tracks.is_empty());
        assert_eq!(result.playlist_info, PlaylistInfo::default());
    }

    #[test]
    fn test_decode_unknown_load_type_fails() {
        let result = serde_json::from_value::<SearchResult>(json!({"loadType": "SOMETHING"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_encode_uses_backend_field_names() {
        let result = SearchResult::new(LoadType::NoMatches, vec![]).with_node_used("node-1");
        let body = serde_json::to_value(&result).unwrap();
        assert_eq!(body["loadType"], "NO_MATCHES");
        assert_eq!(body["nodeUsed"], "node-1");
        assert!(body.get("exception").is_none());
    }

    #[test]
    fn test_lookup_key_prefixes_plain_queries() {
        let query = SearchQuery::resolve("never gonna give you up", SearchEngine::YouTube);
        assert!(!query.is_url());
        assert_eq!(query.lookup_key(), "ytsearch:never gonna give you up");

        let query = SearchQuery::resolve("lofi", SearchEngine::SoundCloud);
        assert_eq!(query.lookup_key(), "scsearch:lofi");

        let query = SearchQuery::resolve("lofi", SearchEngine::Custom("spsearch:".into()));
        assert_eq!(query.lookup_key(), "spsearch:lofi");
    }

    #[test]
    fn test_lookup_key_passes_urls_through() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "http://example.com/track.mp3",
        ] {
            let query = SearchQuery::resolve(url, SearchEngine::YouTubeMusic);
            assert!(query.is_url());
            assert_eq!(query.lookup_key(), url);
        }

        // Only absolute http(s) URLs skip the prefix
        let query = SearchQuery::resolve("ftp://example.com/a", SearchEngine::YouTube);
        assert_eq!(query.lookup_key(), "ytsearch:ftp://example.com/a");
    }

    #[test]
    fn test_search_engine_from_name() {
        assert_eq!(SearchEngine::from("youtube"), SearchEngine::YouTube);
        assert_eq!(SearchEngine::from("youtubeMusic"), SearchEngine::YouTubeMusic);
        assert_eq!(SearchEngine::from("youtube_music"), SearchEngine::YouTubeMusic);
        assert_eq!(SearchEngine::from("soundcloud"), SearchEngine::SoundCloud);
        assert_eq!(
            SearchEngine::from("amsearch:"),
            SearchEngine::Custom("amsearch:".to_string())
        );
        assert_eq!(SearchEngine::default(), SearchEngine::YouTube);
    }

    #[test]
    fn test_search_engine_serde_by_name() {
        let engine: SearchEngine = serde_json::from_value(json!("soundcloud")).unwrap();
        assert_eq!(engine, SearchEngine::SoundCloud);
        assert_eq!(serde_json::to_value(SearchEngine::YouTubeMusic).unwrap(), json!("youtubeMusic"));
    }

    #[test]
    fn test_rate_limit_detected_from_message() {
        let result = SearchResult::failed(LoadException::new(
            "Received unexpected response from YouTube: HTTP error 429",
            "SUSPICIOUS",
        ));
        assert!(result.is_rate_limited());

        let result = SearchResult::failed(LoadException::new("Too Many Requests", "COMMON"));
        assert!(result.is_rate_limited());
    }

    #[test]
    fn test_rate_limit_structured_status_wins() {
        let mut exception = LoadException::new("HTTP error 429", "COMMON");
        exception.status = Some(500);
        assert!(!SearchResult::failed(exception.clone()).is_rate_limited());

        exception.status = Some(429);
        exception.message = "upstream refused".to_string();
        assert!(SearchResult::failed(exception).is_rate_limited());
    }

    #[test]
    fn test_rate_limit_requires_load_failed() {
        let mut result = SearchResult::failed(LoadException::new("HTTP error 429", "COMMON"));
        result.load_type = LoadType::NoMatches;
        assert!(!result.is_rate_limited());

        let result = SearchResult::failed(LoadException::new("Video unavailable", "COMMON"));
        assert!(!result.is_rate_limited());
    }

    #[test]
    fn test_node_config_name_defaults_to_host() {
        let config = NodeConfig::new("localhost:2333", "youshallnotpass");
        assert_eq!(config.name(), "localhost:2333");
        assert_eq!(config.base_url(), "http://localhost:2333");

        let config = config.with_identifier("main").with_secure(true);
        assert_eq!(config.name(), "main");
        assert_eq!(config.base_url(), "https://localhost:2333");
    }

    #[test]
    fn test_node_config_deserialize() {
        let config: NodeConfig =
            serde_json::from_value(json!({"host": "lava.example:443", "auth": "pw", "secure": true}))
                .unwrap();
        assert!(config.identifier.is_none());
        assert!(config.secure);
        assert_eq!(config.name(), "lava.example:443");
    }

    #[test]
    fn test_transport_error_classification() {
        assert!(AmagiError::Request("refused".into()).is_transport());
        assert!(AmagiError::Timeout(10).is_transport());
        assert!(AmagiError::Decode("eof".into()).is_transport());
        assert!(!AmagiError::NoNodesAvailable.is_transport());
        assert!(!AmagiError::NotInitialized.is_transport());
    }
}
