//! Engine.IO v4 packets.
//!
//! A packet is a single type digit followed by an optional payload:
//!
//! | Type | Name    | Payload                  |
//! |------|---------|--------------------------|
//! | `0`  | open    | handshake JSON           |
//! | `1`  | close   | none                     |
//! | `2`  | ping    | optional probe string    |
//! | `3`  | pong    | optional probe string    |
//! | `4`  | message | Socket.IO packet         |
//! | `5`  | upgrade | none                     |
//! | `6`  | noop    | none                     |

use serde::{Deserialize, Serialize};

use super::ProtocolError;

/// Handshake payload sent by the server in the `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPayload {
    /// Engine.IO session id.
    pub sid: String,
    /// Transports the session may upgrade to. Always empty over WebSocket.
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server heartbeats.
    pub ping_interval: u64,
    /// Milliseconds the peer waits for a heartbeat reply.
    pub ping_timeout: u64,
    /// Largest accepted packet, in bytes.
    #[serde(default)]
    pub max_payload: u64,
}

/// A decoded Engine.IO packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePacket {
    /// Session handshake.
    Open(OpenPayload),
    /// Transport close request.
    Close,
    /// Heartbeat (server to client in v4).
    Ping(Option<String>),
    /// Heartbeat reply.
    Pong(Option<String>),
    /// Application payload, a Socket.IO packet.
    Message(String),
    /// Transport upgrade.
    Upgrade,
    /// No operation.
    Noop,
}

impl EnginePacket {
    /// Encodes the packet to its text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidPayload`] if the handshake payload
    /// fails to serialize.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        let text = match self {
            Self::Open(payload) => format!("0{}", serde_json::to_string(payload)?),
            Self::Close => "1".to_string(),
            Self::Ping(probe) => format!("2{}", probe.as_deref().unwrap_or_default()),
            Self::Pong(probe) => format!("3{}", probe.as_deref().unwrap_or_default()),
            Self::Message(body) => format!("4{body}"),
            Self::Upgrade => "5".to_string(),
            Self::Noop => "6".to_string(),
        };
        Ok(text)
    }

    /// Decodes a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] on an empty frame, an unknown type digit,
    /// or a malformed handshake payload.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let mut chars = text.chars();
        let kind = chars.next().ok_or(ProtocolError::Empty)?;
        let rest = chars.as_str();
        let probe = || (!rest.is_empty()).then(|| rest.to_string());

        match kind {
            '0' => Ok(Self::Open(serde_json::from_str(rest)?)),
            '1' => Ok(Self::Close),
            '2' => Ok(Self::Ping(probe())),
            '3' => Ok(Self::Pong(probe())),
            '4' => Ok(Self::Message(rest.to_string())),
            '5' => Ok(Self::Upgrade),
            '6' => Ok(Self::Noop),
            other => Err(ProtocolError::UnknownType {
                layer: "engine.io",
                found: other,
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn decodes_open_handshake() {
        let frame = r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
        let Ok(EnginePacket::Open(open)) = EnginePacket::decode(frame) else {
            panic!("expected open packet");
        };
        assert_eq!(open.sid, "abc");
        assert_eq!(open.ping_interval, 25_000);
        assert_eq!(open.ping_timeout, 20_000);
        assert_eq!(open.max_payload, 1_000_000);
    }

    #[test]
    fn encodes_open_in_camel_case() {
        let packet = EnginePacket::Open(OpenPayload {
            sid: "s1".to_string(),
            upgrades: vec![],
            ping_interval: 100,
            ping_timeout: 50,
            max_payload: 10,
        });
        let Ok(text) = packet.encode() else {
            panic!("encode failed");
        };
        assert!(text.starts_with('0'));
        assert!(text.contains("\"pingInterval\":100"));
        assert!(text.contains("\"maxPayload\":10"));
    }

    #[test]
    fn heartbeat_frames() {
        assert_eq!(EnginePacket::decode("2").ok(), Some(EnginePacket::Ping(None)));
        assert_eq!(
            EnginePacket::decode("3probe").ok(),
            Some(EnginePacket::Pong(Some("probe".to_string())))
        );
        assert_eq!(EnginePacket::Pong(None).encode().ok().as_deref(), Some("3"));
    }

    #[test]
    fn message_keeps_body_verbatim() {
        let Ok(packet) = EnginePacket::decode(r#"42["plots",{"a":1}]"#) else {
            panic!("decode failed");
        };
        assert_eq!(packet, EnginePacket::Message(r#"2["plots",{"a":1}]"#.to_string()));
    }

    #[test]
    fn rejects_empty_and_unknown() {
        assert!(matches!(EnginePacket::decode(""), Err(ProtocolError::Empty)));
        assert!(matches!(
            EnginePacket::decode("9"),
            Err(ProtocolError::UnknownType { found: '9', .. })
        ));
    }

    #[test]
    fn rejects_malformed_handshake() {
        assert!(matches!(
            EnginePacket::decode("0{not json"),
            Err(ProtocolError::InvalidPayload(_))
        ));
    }
}
