//! Socket.IO v5 packets carried inside Engine.IO `message` packets.
//!
//! Text form: `<type>[<namespace>,][<ack id>][<json>]`. The default
//! namespace `/` is left out of the encoding.

use serde_json::Value;

use super::{DEFAULT_NAMESPACE, ProtocolError};

/// A decoded Socket.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    /// Namespace connect request (client) or acknowledgement (server).
    Connect {
        /// Target namespace.
        namespace: String,
        /// Auth data from the client or `{"sid": ...}` from the server.
        data: Option<Value>,
    },
    /// Namespace disconnect.
    Disconnect {
        /// Namespace being left.
        namespace: String,
    },
    /// Named event: `data[0]` is the event name, the rest are arguments.
    Event {
        /// Namespace the event belongs to.
        namespace: String,
        /// Acknowledgement id requested by the sender.
        id: Option<u64>,
        /// Event name followed by its arguments.
        data: Vec<Value>,
    },
    /// Acknowledgement of an event.
    Ack {
        /// Namespace of the acknowledged event.
        namespace: String,
        /// Id of the acknowledged event.
        id: u64,
        /// Acknowledgement arguments.
        data: Vec<Value>,
    },
    /// Namespace connection refused by the server.
    ConnectError {
        /// Refused namespace.
        namespace: String,
        /// Error details, usually `{"message": ...}`.
        data: Option<Value>,
    },
}

impl SocketPacket {
    /// Builds an event packet with a single argument.
    #[must_use]
    pub fn event(namespace: &str, name: &str, payload: Value) -> Self {
        Self::Event {
            namespace: namespace.to_string(),
            id: None,
            data: vec![Value::String(name.to_string()), payload],
        }
    }

    /// Returns the event name for [`SocketPacket::Event`] packets.
    #[must_use]
    pub fn event_name(&self) -> Option<&str> {
        match self {
            Self::Event { data, .. } => data.first().and_then(Value::as_str),
            _ => None,
        }
    }

    /// Returns the event arguments (everything after the name).
    #[must_use]
    pub fn event_args(&self) -> &[Value] {
        match self {
            Self::Event { data, .. } => data.get(1..).unwrap_or_default(),
            _ => &[],
        }
    }

    /// Returns the namespace the packet is addressed to.
    #[must_use]
    pub fn namespace(&self) -> &str {
        match self {
            Self::Connect { namespace, .. }
            | Self::Disconnect { namespace }
            | Self::Event { namespace, .. }
            | Self::Ack { namespace, .. }
            | Self::ConnectError { namespace, .. } => namespace,
        }
    }

    /// Encodes the packet to its text form (without the Engine.IO prefix).
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidPayload`] if a JSON body fails to
    /// serialize.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        let (kind, id, body) = match self {
            Self::Connect { data, .. } => ('0', None, data.as_ref().map(serde_json::to_string)),
            Self::Disconnect { .. } => ('1', None, None),
            Self::Event { id, data, .. } => ('2', *id, Some(serde_json::to_string(data))),
            Self::Ack { id, data, .. } => ('3', Some(*id), Some(serde_json::to_string(data))),
            Self::ConnectError { data, .. } => {
                ('4', None, data.as_ref().map(serde_json::to_string))
            }
        };

        let mut out = String::new();
        out.push(kind);
        let namespace = self.namespace();
        if namespace != DEFAULT_NAMESPACE {
            out.push_str(namespace);
            out.push(',');
        }
        if let Some(id) = id {
            out.push_str(&id.to_string());
        }
        if let Some(body) = body {
            out.push_str(&body?);
        }
        Ok(out)
    }

    /// Decodes a Socket.IO packet.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] for empty input, unknown or binary packet
    /// types, invalid ack ids, malformed JSON and nameless events.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let mut chars = text.chars();
        let kind = chars.next().ok_or(ProtocolError::Empty)?;
        let mut rest = chars.as_str();

        if matches!(kind, '5' | '6') {
            return Err(ProtocolError::UnsupportedBinary);
        }
        if !matches!(kind, '0'..='4') {
            return Err(ProtocolError::UnknownType {
                layer: "socket.io",
                found: kind,
            });
        }

        let namespace = if rest.starts_with('/') {
            let (ns, tail) = rest.split_once(',').unwrap_or((rest, ""));
            rest = tail;
            ns.to_string()
        } else {
            DEFAULT_NAMESPACE.to_string()
        };

        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (id_str, body) = rest.split_at(digits);
        let id = if id_str.is_empty() {
            None
        } else {
            Some(
                id_str
                    .parse::<u64>()
                    .map_err(|_| ProtocolError::InvalidAckId(id_str.to_string()))?,
            )
        };

        let json = |body: &str| -> Result<Option<Value>, ProtocolError> {
            if body.is_empty() {
                Ok(None)
            } else {
                Ok(Some(serde_json::from_str(body)?))
            }
        };
        let array = |body: &str| -> Result<Vec<Value>, ProtocolError> {
            match json(body)? {
                Some(Value::Array(items)) => Ok(items),
                Some(other) => Ok(vec![other]),
                None => Ok(Vec::new()),
            }
        };

        match kind {
            '0' => Ok(Self::Connect {
                namespace,
                data: json(body)?,
            }),
            '1' => Ok(Self::Disconnect { namespace }),
            '2' => {
                let data = array(body)?;
                if !data.first().is_some_and(Value::is_string) {
                    return Err(ProtocolError::MissingEventName);
                }
                Ok(Self::Event {
                    namespace,
                    id,
                    data,
                })
            }
            '3' => Ok(Self::Ack {
                namespace,
                id: id.ok_or_else(|| ProtocolError::InvalidAckId(String::new()))?,
                data: array(body)?,
            }),
            _ => Ok(Self::ConnectError {
                namespace,
                data: json(body)?,
            }),
        }
    }
}
