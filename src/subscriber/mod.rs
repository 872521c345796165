//! Event subscriber: one connection, named-event handlers.
//!
//! ```text
//! Endpoint::from_origin("http://host:5000")
//!     │
//!     ├── connect(&endpoint)        Disconnected → Connected
//!     ├── connection.on_event("plots", LogHandler)
//!     └── connection.run()          dispatch until the transport ends
//! ```
//!
//! The connection is never re-established: once [`Connection::run`]
//! returns, the connection stays [`ConnectionState::Disconnected`].

pub mod connection;
pub mod endpoint;
pub mod handler;

pub use connection::{Connection, ConnectionState, DisconnectReason, connect};
pub use endpoint::Endpoint;
pub use handler::{EventHandler, HandlerRegistry, LogHandler};

use crate::protocol::ProtocolError;

/// Errors raised by the subscriber.
#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    /// The origin string is not a usable `http(s)://host[:port]` URL.
    #[error("invalid origin {origin:?}: {reason}")]
    InvalidOrigin {
        /// Origin as given.
        origin: String,
        /// Why it was rejected.
        reason: String,
    },

    /// WebSocket transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// A frame could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The server did not complete the handshake as expected.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The server refused the namespace connection.
    #[error("namespace {namespace} refused: {message}")]
    ConnectRefused {
        /// Refused namespace.
        namespace: String,
        /// Server-provided message.
        message: String,
    },

    /// The connection has already ended.
    #[error("connection is not connected")]
    NotConnected,
}
