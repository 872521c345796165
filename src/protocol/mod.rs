//! Wire framing for the real-time event transport.
//!
//! The dashboard speaks Socket.IO (protocol v5) on top of Engine.IO
//! (protocol v4) over a WebSocket. Each WebSocket text frame carries exactly
//! one [`EnginePacket`]; Engine.IO `message` packets carry one
//! [`SocketPacket`].
//!
//! Only the text encoding is supported. Binary attachments are rejected.

pub mod engine;
pub mod socket;

pub use engine::{EnginePacket, OpenPayload};
pub use socket::SocketPacket;

/// Engine.IO protocol revision sent in the `EIO` query parameter.
pub const ENGINE_IO_VERSION: u8 = 4;

/// Default Engine.IO mount path on the server.
pub const DEFAULT_ENGINE_PATH: &str = "/socket.io/";

/// Default Socket.IO namespace.
pub const DEFAULT_NAMESPACE: &str = "/";

/// Event name carrying plot payloads.
pub const PLOTS_EVENT: &str = "plots";

/// Framing errors raised while decoding packets.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The frame was empty.
    #[error("empty packet")]
    Empty,

    /// The leading type digit is not a known packet type.
    #[error("unknown {layer} packet type: {found:?}")]
    UnknownType {
        /// Protocol layer (`engine.io` or `socket.io`).
        layer: &'static str,
        /// Offending type character.
        found: char,
    },

    /// Binary event or ack packets are not supported.
    #[error("binary packets are not supported")]
    UnsupportedBinary,

    /// The JSON body failed to parse.
    #[error("invalid packet payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// The ack id could not be parsed.
    #[error("invalid ack id: {0}")]
    InvalidAckId(String),

    /// An event packet did not start with a string event name.
    #[error("event packet without a name")]
    MissingEventName,
}
