//! Mock search node shared by the integration tests.

#![allow(dead_code)]

use amagi_common::{AmagiEvent, LoadException, LoadType, NodeConfig, SearchResult, Track, TrackInfo};
use amagi_dispatcher::Amagi;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const AUTH: &str = "youshallnotpass";

/// What `/loadtracks` answers.
#[derive(Debug, Clone)]
pub enum Reply {
    /// A song and a live stream, both titled after the node
    Tracks,
    Result(SearchResult),
    /// `LOAD_FAILED` with a throttling message
    RateLimited,
    /// Truncated JSON
    Malformed,
    Status(u16),
    /// Answers `Tracks` after the delay
    Hang(Duration),
}

struct MockState {
    name: String,
    probe_status: AtomicU16,
    reply: Mutex<Reply>,
    probe_calls: AtomicUsize,
    search_calls: AtomicUsize,
    identifiers: Mutex<Vec<String>>,
    headers: Mutex<Vec<HeaderMap>>,
}

/// A search node served by axum on an ephemeral port.
pub struct MockNode {
    addr: SocketAddr,
    state: Arc<MockState>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockNode {
    pub async fn start(name: &str) -> Self {
        let state = Arc::new(MockState {
            name: name.to_string(),
            probe_status: AtomicU16::new(400),
            reply: Mutex::new(Reply::Tracks),
            probe_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
            identifiers: Mutex::new(Vec::new()),
            headers: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/", get(handle_probe))
            .route("/loadtracks", get(handle_load_tracks))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock node");
        let addr = listener.local_addr().expect("mock node address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub async fn with_reply(name: &str, reply: Reply) -> Self {
        let node = Self::start(name).await;
        node.set_reply(reply);
        node
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    pub fn config(&self) -> NodeConfig {
        NodeConfig::new(self.addr(), AUTH).with_identifier(self.name())
    }

    pub fn set_reply(&self, reply: Reply) {
        *self.state.reply.lock() = reply;
    }

    pub fn set_probe_status(&self, status: u16) {
        self.state.probe_status.store(status, Ordering::SeqCst);
    }

    pub fn probe_calls(&self) -> usize {
        self.state.probe_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.state.search_calls.load(Ordering::SeqCst)
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.state.identifiers.lock().clone()
    }

    pub fn last_headers(&self) -> Option<HeaderMap> {
        self.state.headers.lock().last().cloned()
    }
}

impl Drop for MockNode {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle_probe(State(state): State<Arc<MockState>>, headers: HeaderMap) -> StatusCode {
    state.probe_calls.fetch_add(1, Ordering::SeqCst);
    state.headers.lock().push(headers);
    StatusCode::from_u16(state.probe_status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn handle_load_tracks(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.search_calls.fetch_add(1, Ordering::SeqCst);
    state.headers.lock().push(headers);
    if let Some(identifier) = params.get("identifier") {
        state.identifiers.lock().push(identifier.clone());
    }

    let reply = state.reply.lock().clone();
    match reply {
        Reply::Tracks => Json(tracks_from(&state.name)).into_response(),
        Reply::Result(result) => Json(result).into_response(),
        Reply::RateLimited => Json(SearchResult::failed(LoadException::new(
            "Received HTTP 429 Too Many Requests from upstream",
            "SUSPICIOUS",
        )))
        .into_response(),
        Reply::Malformed => (StatusCode::OK, r#"{"loadType": "SEARCH_RES"#).into_response(),
        Reply::Status(code) => StatusCode::from_u16(code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
        Reply::Hang(delay) => {
            tokio::time::sleep(delay).await;
            Json(tracks_from(&state.name)).into_response()
        }
    }
}

/// The answer of a node serving [`Reply::Tracks`].
pub fn tracks_from(node: &str) -> SearchResult {
    let song = TrackInfo {
        identifier: format!("{}-song", node),
        title: format!("{}: song", node),
        author: "Rick Astley".to_string(),
        length: 213_000,
        is_seekable: true,
        source_name: "youtube".to_string(),
        ..Default::default()
    };
    let live = TrackInfo {
        identifier: format!("{}-live", node),
        title: format!("{}: live", node),
        is_stream: true,
        source_name: "youtube".to_string(),
        ..Default::default()
    };

    SearchResult::new(
        LoadType::SearchResult,
        vec![Track::new("QAAAjQIAJVJpY2sgQXN0bGV5", song), Track::new("QAAAWAIAD2xpdmU", live)],
    )
}

/// Address nothing listens on.
pub async fn closed_addr() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}

pub fn configs(nodes: &[&MockNode]) -> Vec<NodeConfig> {
    nodes.iter().map(|node| node.config()).collect()
}

/// Collects every event emitted by `amagi`.
pub fn record_events(amagi: &Amagi) -> Arc<Mutex<Vec<AmagiEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    amagi.subscribe(move |event: &AmagiEvent| sink.lock().push(event.clone()));
    seen
}

pub fn debug_messages(events: &Mutex<Vec<AmagiEvent>>) -> Vec<String> {
    events
        .lock()
        .iter()
        .filter_map(|event| match event {
            AmagiEvent::Debug(message) => Some(message.clone()),
            _ => None,
        })
        .collect()
}
