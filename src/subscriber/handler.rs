//! Event handlers and the per-connection handler registry.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

/// Callback invoked for every message on a subscribed event name.
///
/// Handlers run sequentially on the connection's dispatch task.
pub trait EventHandler: Send + 'static {
    /// Handles one message delivered under `event`.
    fn handle(&mut self, event: &str, payload: &Value);
}

impl<F> EventHandler for F
where
    F: FnMut(&str, &Value) + Send + 'static,
{
    fn handle(&mut self, event: &str, payload: &Value) {
        self(event, payload);
    }
}

/// Diagnostic handler: logs each message as received, without acking,
/// transforming or forwarding it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogHandler;

impl LogHandler {
    /// Text logged for a message: the payload's JSON, unchanged.
    #[must_use]
    pub fn record(payload: &Value) -> String {
        payload.to_string()
    }
}

impl EventHandler for LogHandler {
    fn handle(&mut self, event: &str, payload: &Value) {
        tracing::info!(event, payload = %Self::record(payload), "event received");
    }
}

/// Maps event names to their handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Vec<Box<dyn EventHandler>>>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (event, handlers) in &self.handlers {
            map.entry(event, &handlers.len());
        }
        map.finish()
    }
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `event`.
    pub fn register(&mut self, event: &str, handler: impl EventHandler) {
        self.handlers
            .entry(event.to_string())
            .or_default()
            .push(Box::new(handler));
    }

    /// Invokes every handler registered for `event` once, in registration
    /// order. Returns the number of handlers invoked.
    pub fn dispatch(&mut self, event: &str, payload: &Value) -> usize {
        let Some(handlers) = self.handlers.get_mut(event) else {
            tracing::trace!(event, "no handler for event");
            return 0;
        };
        for handler in handlers.iter_mut() {
            handler.handle(event, payload);
        }
        handlers.len()
    }

    /// Number of handlers registered for `event`.
    #[must_use]
    pub fn count(&self, event: &str) -> usize {
        self.handlers.get(event).map_or(0, Vec::len)
    }

    /// Event names with at least one handler.
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}
