//! Telemetry events.
//!
//! Events are fire-and-forget notifications for observers. Nothing in the
//! dispatcher reads them back, so removing every listener never changes
//! search behaviour. Every event is also logged through `tracing` at debug
//! level.

use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// An event emitted by the dispatcher, the node clients or the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum AmagiEvent {
    Debug(String),
    /// A node reported upstream throttling and was taken out of rotation.
    RateLimited { node: String },
    Request(RequestEvent),
}

/// One HTTP exchange with a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestEvent {
    pub method: String,
    pub path: String,
    pub url: String,
    pub status: u16,
    pub elapsed_ms: f64,
}

impl fmt::Display for RequestEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}) -> {} in {:.3}ms",
            self.method, self.path, self.url, self.status, self.elapsed_ms
        )
    }
}

/// Receives events. Implemented for any `Fn(&AmagiEvent)` closure.
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &AmagiEvent);
}

impl<F> EventListener for F
where
    F: Fn(&AmagiEvent) + Send + Sync,
{
    fn on_event(&self, event: &AmagiEvent) {
        self(event)
    }
}

/// Shared fan-out point for events. Cloning yields a handle to the same
/// listener list.
#[derive(Clone, Default)]
pub struct EventEmitter {
    listeners: Arc<RwLock<Vec<Arc<dyn EventListener>>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl EventListener + 'static) {
        self.subscribe_arc(Arc::new(listener));
    }

    pub fn subscribe_arc(&self, listener: Arc<dyn EventListener>) {
        self.listeners.write().push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn emit(&self, event: AmagiEvent) {
        match &event {
            AmagiEvent::Debug(message) => tracing::debug!("{}", message),
            AmagiEvent::RateLimited { node } => tracing::debug!(node = %node, "node rate limited"),
            AmagiEvent::Request(request) => tracing::debug!("{}", request),
        }

        // Snapshot so listeners may subscribe from inside a callback
        let listeners = self.listeners.read().clone();
        for listener in listeners {
            listener.on_event(&event);
        }
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.emit(AmagiEvent::Debug(message.into()));
    }

    pub fn rate_limited(&self, node: impl Into<String>) {
        self.emit(AmagiEvent::RateLimited { node: node.into() });
    }

    pub fn request(&self, request: RequestEvent) {
        self.emit(AmagiEvent::Request(request));
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
