//! A single Socket.IO connection and its dispatch loop.
//!
//! [`connect`] performs the Engine.IO handshake and joins the endpoint's
//! namespace. [`Connection::run`] then reads frames until the transport
//! ends, answering heartbeats and handing each event to the handlers
//! registered through [`Connection::on_event`].

use std::fmt;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::error::{Error as WsError, ProtocolError as WsProtocolError};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::{Endpoint, EventHandler, HandlerRegistry, SubscriberError};
use crate::protocol::{EnginePacket, OpenPayload, SocketPacket};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection lifecycle. There is no transition back to `Connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not (or no longer) connected.
    Disconnected,
    /// Handshake complete, namespace joined.
    Connected,
}

/// Why the dispatch loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The server left the namespace (Socket.IO `DISCONNECT`).
    ServerDisconnect,
    /// The server closed the Engine.IO session.
    EngineClose,
    /// The WebSocket closed or the stream ended.
    TransportClosed,
    /// No heartbeat within `pingInterval + pingTimeout`.
    PingTimeout,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ServerDisconnect => "server disconnect",
            Self::EngineClose => "engine close",
            Self::TransportClosed => "transport closed",
            Self::PingTimeout => "ping timeout",
        };
        f.write_str(s)
    }
}

/// A logical link to one [`Endpoint`].
pub struct Connection {
    endpoint: Endpoint,
    session: OpenPayload,
    socket_id: Option<String>,
    state: ConnectionState,
    stream: Option<WsStream>,
    handlers: HandlerRegistry,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .field("sid", &self.session.sid)
            .field("socket_id", &self.socket_id)
            .field("state", &self.state)
            .field("handlers", &self.handlers)
            .finish()
    }
}

/// Opens a connection to `endpoint` and joins its namespace.
///
/// No retry is attempted.
///
/// # Errors
///
/// Returns [`SubscriberError::Transport`] if the endpoint is unreachable,
/// [`SubscriberError::Handshake`] if the server does not open an Engine.IO
/// session, and [`SubscriberError::ConnectRefused`] if the namespace is
/// refused.
pub async fn connect(endpoint: &Endpoint) -> Result<Connection, SubscriberError> {
    let url = endpoint.websocket_url();
    tracing::debug!(%url, "opening connection");
    let (mut stream, _) = connect_async(url.as_str()).await?;

    let session = match next_engine_packet(&mut stream).await? {
        Some(EnginePacket::Open(open)) => open,
        Some(other) => {
            return Err(SubscriberError::Handshake(format!(
                "expected open packet, got {other:?}"
            )));
        }
        None => {
            return Err(SubscriberError::Handshake(
                "transport closed before open".to_string(),
            ));
        }
    };

    let namespace = endpoint.namespace().to_string();
    send_socket(
        &mut stream,
        &SocketPacket::Connect {
            namespace: namespace.clone(),
            data: None,
        },
    )
    .await?;

    let socket_id = loop {
        match next_engine_packet(&mut stream).await? {
            Some(EnginePacket::Ping(probe)) => {
                send_engine(&mut stream, &EnginePacket::Pong(probe)).await?;
            }
            Some(EnginePacket::Message(body)) => match SocketPacket::decode(&body) {
                Err(e) => tracing::warn!(error = %e, "dropping undecodable packet"),
                Ok(SocketPacket::Connect { namespace: ns, data }) if ns == namespace => {
                    break data
                        .as_ref()
                        .and_then(|d| d.get("sid"))
                        .and_then(Value::as_str)
                        .map(str::to_string);
                }
                Ok(SocketPacket::ConnectError { namespace: ns, data }) if ns == namespace => {
                    let message = data
                        .as_ref()
                        .and_then(|d| d.get("message"))
                        .and_then(Value::as_str)
                        .unwrap_or("connection refused")
                        .to_string();
                    return Err(SubscriberError::ConnectRefused { namespace, message });
                }
                Ok(other) => tracing::debug!(?other, "ignoring packet before namespace ack"),
            },
            Some(EnginePacket::Close) | None => {
                return Err(SubscriberError::Handshake(
                    "closed before namespace ack".to_string(),
                ));
            }
            Some(_) => {}
        }
    };

    tracing::info!(endpoint = %endpoint, sid = %session.sid, "connected");

    Ok(Connection {
        endpoint: endpoint.clone(),
        session,
        socket_id,
        state: ConnectionState::Connected,
        stream: Some(stream),
        handlers: HandlerRegistry::new(),
    })
}

impl Connection {
    /// Registers `handler` for every message on `event` for the lifetime
    /// of this connection.
    pub fn on_event(&mut self, event: &str, handler: impl EventHandler) {
        self.handlers.register(event, handler);
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Endpoint this connection targets.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Engine.IO handshake data.
    #[must_use]
    pub const fn session(&self) -> &OpenPayload {
        &self.session
    }

    /// Namespace socket id assigned by the server, if any.
    #[must_use]
    pub fn socket_id(&self) -> Option<&str> {
        self.socket_id.as_deref()
    }

    /// Registered handlers.
    #[must_use]
    pub const fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Dispatches incoming events until the transport ends.
    ///
    /// The connection is left [`ConnectionState::Disconnected`] afterwards
    /// and is not re-established.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriberError::NotConnected`] if the connection already
    /// ended, and [`SubscriberError::Transport`] on a WebSocket failure.
    pub async fn run(&mut self) -> Result<DisconnectReason, SubscriberError> {
        let Some(mut stream) = self.stream.take() else {
            return Err(SubscriberError::NotConnected);
        };

        let result = self.dispatch(&mut stream).await;
        self.state = ConnectionState::Disconnected;

        if !matches!(result, Ok(DisconnectReason::TransportClosed)) {
            let _ = stream.close(None).await;
        }

        match &result {
            Ok(reason) => tracing::info!(endpoint = %self.endpoint, %reason, "disconnected"),
            Err(e) => tracing::warn!(endpoint = %self.endpoint, error = %e, "connection failed"),
        }
        result
    }

    async fn dispatch(&mut self, stream: &mut WsStream) -> Result<DisconnectReason, SubscriberError> {
        let heartbeat = Duration::from_millis(
            self.session
                .ping_interval
                .saturating_add(self.session.ping_timeout),
        );
        let namespace = self.endpoint.namespace().to_string();

        loop {
            let Ok(next) = tokio::time::timeout(heartbeat, next_engine_packet(stream)).await
            else {
                return Ok(DisconnectReason::PingTimeout);
            };

            match next? {
                None => return Ok(DisconnectReason::TransportClosed),
                Some(EnginePacket::Close) => return Ok(DisconnectReason::EngineClose),
                Some(EnginePacket::Ping(probe)) => {
                    send_engine(stream, &EnginePacket::Pong(probe)).await?;
                }
                Some(EnginePacket::Message(body)) => {
                    let packet = match SocketPacket::decode(&body) {
                        Ok(packet) => packet,
                        Err(e) => {
                            tracing::warn!(error = %e, "dropping undecodable packet");
                            continue;
                        }
                    };
                    if packet.namespace() != namespace {
                        continue;
                    }
                    match &packet {
                        SocketPacket::Event { .. } => {
                            let Some(name) = packet.event_name() else {
                                continue;
                            };
                            let payload = event_payload(packet.event_args());
                            self.handlers.dispatch(name, &payload);
                        }
                        SocketPacket::Disconnect { .. } => {
                            return Ok(DisconnectReason::ServerDisconnect);
                        }
                        _ => {}
                    }
                }
                Some(_) => {}
            }
        }
    }
}

/// Collapses event arguments into the single message handed to handlers.
fn event_payload(args: &[Value]) -> Value {
    match args {
        [] => Value::Null,
        [single] => single.clone(),
        many => Value::Array(many.to_vec()),
    }
}

/// Reads the next Engine.IO packet, skipping non-text and undecodable
/// frames.
///
/// `Ok(None)` means the transport ended.
async fn next_engine_packet(stream: &mut WsStream) -> Result<Option<EnginePacket>, SubscriberError> {
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => match EnginePacket::decode(text.as_str()) {
                Ok(packet) => return Ok(Some(packet)),
                Err(e) => tracing::warn!(error = %e, "dropping undecodable packet"),
            },
            Some(Ok(Message::Close(_))) | None => return Ok(None),
            Some(Ok(Message::Binary(_))) => {
                tracing::debug!("ignoring binary frame");
            }
            Some(Ok(_)) => {}
            Some(Err(
                WsError::ConnectionClosed
                | WsError::AlreadyClosed
                | WsError::Protocol(WsProtocolError::ResetWithoutClosingHandshake),
            )) => return Ok(None),
            Some(Err(e)) => return Err(e.into()),
        }
    }
}

async fn send_engine(stream: &mut WsStream, packet: &EnginePacket) -> Result<(), SubscriberError> {
    stream.send(Message::text(packet.encode()?)).await?;
    Ok(())
}

async fn send_socket(stream: &mut WsStream, packet: &SocketPacket) -> Result<(), SubscriberError> {
    send_engine(stream, &EnginePacket::Message(packet.encode()?)).await
}
