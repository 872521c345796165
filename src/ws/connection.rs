//! Server side of one Engine.IO WebSocket session.
//!
//! The session opens with the Engine.IO handshake, waits for the client
//! to join the default namespace, replays the current plots and then
//! forwards every plot published on the bus as a `plots` event. The
//! server drives the heartbeat: a ping every `ping_interval`, and the
//! session ends when no pong arrives within `ping_timeout`.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::EngineSettings;
use crate::domain::{Plot, PlotId};
use crate::protocol::{
    DEFAULT_NAMESPACE, EnginePacket, OpenPayload, PLOTS_EVENT, ProtocolError, SocketPacket,
};
use crate::service::PlotService;
use crate::ws::SessionGuard;

/// Everything a session needs, captured before the upgrade.
#[derive(Debug)]
pub struct SessionContext {
    /// Plots published after the upgrade request.
    pub plot_rx: broadcast::Receiver<Arc<Plot>>,
    /// Source of the replayed snapshot.
    pub plot_service: Arc<PlotService>,
    /// Heartbeat and payload limits.
    pub engine: EngineSettings,
    /// Keeps the session counted as active.
    pub guard: SessionGuard,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    ClientClose,
    TransportClosed,
    PingTimeout,
    PayloadTooLarge,
    BusClosed,
    SendFailed,
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ClientClose => "client close",
            Self::TransportClosed => "transport closed",
            Self::PingTimeout => "ping timeout",
            Self::PayloadTooLarge => "payload too large",
            Self::BusClosed => "plot bus closed",
            Self::SendFailed => "send failed",
        };
        f.write_str(s)
    }
}

/// Ids of replayed plots whose bus copy has not arrived yet.
///
/// The first bus plot outside the set means the bus has moved past the
/// replay, so the remaining ids are dropped.
#[derive(Debug, Default)]
struct ReplayFilter {
    pending: HashSet<PlotId>,
}

impl ReplayFilter {
    fn record(&mut self, id: PlotId) {
        self.pending.insert(id);
    }

    /// True when `id` was already sent by the replay.
    fn is_duplicate(&mut self, id: &PlotId) -> bool {
        if self.pending.remove(id) {
            return true;
        }
        self.pending.clear();
        false
    }
}

/// Write half plus the per-session namespace state.
struct Session {
    sid: String,
    tx: SplitSink<WebSocket, Message>,
    joined: Option<String>,
    replayed: ReplayFilter,
}

impl Session {
    async fn send_engine(&mut self, packet: &EnginePacket) -> Result<(), SessionEnd> {
        let text = packet.encode().map_err(|e| {
            tracing::error!(sid = %self.sid, error = %e, "failed to encode packet");
            SessionEnd::SendFailed
        })?;
        self.tx
            .send(Message::text(text))
            .await
            .map_err(|_| SessionEnd::SendFailed)
    }

    async fn send_socket(&mut self, packet: &SocketPacket) -> Result<(), SessionEnd> {
        let body = packet.encode().map_err(|e| {
            tracing::error!(sid = %self.sid, error = %e, "failed to encode packet");
            SessionEnd::SendFailed
        })?;
        self.send_engine(&EnginePacket::Message(body)).await
    }

    async fn send_plot(&mut self, plot: &Plot) -> Result<(), SessionEnd> {
        let payload = match serde_json::to_value(plot) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(sid = %self.sid, plot_id = %plot.id, error = %e, "plot not serializable");
                return Ok(());
            }
        };
        let packet = SocketPacket::event(DEFAULT_NAMESPACE, PLOTS_EVENT, payload);
        self.send_socket(&packet).await
    }

    /// Handles a namespace join: accept `/`, refuse anything else.
    async fn join(&mut self, namespace: String, service: &PlotService) -> Result<(), SessionEnd> {
        if namespace != DEFAULT_NAMESPACE {
            tracing::debug!(sid = %self.sid, %namespace, "namespace refused");
            let refusal = SocketPacket::ConnectError {
                namespace,
                data: Some(serde_json::json!({ "message": "Invalid namespace" })),
            };
            return self.send_socket(&refusal).await;
        }

        let socket_id = uuid::Uuid::new_v4().to_string();
        let ack = SocketPacket::Connect {
            namespace: namespace.clone(),
            data: Some(serde_json::json!({ "sid": socket_id })),
        };
        self.send_socket(&ack).await?;
        self.joined = Some(socket_id);
        tracing::info!(sid = %self.sid, %namespace, "namespace joined");

        let snapshot = service.snapshot().await;
        for plot in &snapshot {
            self.replayed.record(plot.id);
            self.send_plot(plot).await?;
        }
        tracing::debug!(sid = %self.sid, plots = snapshot.len(), "snapshot replayed");
        Ok(())
    }

    /// Handles a decoded Socket.IO packet from the client.
    async fn on_socket_packet(
        &mut self,
        packet: SocketPacket,
        service: &PlotService,
    ) -> Result<(), SessionEnd> {
        match packet {
            SocketPacket::Connect { namespace, .. } => self.join(namespace, service).await,
            SocketPacket::Disconnect { namespace } => {
                if namespace == DEFAULT_NAMESPACE {
                    self.joined = None;
                    tracing::info!(sid = %self.sid, "namespace left");
                }
                Ok(())
            }
            SocketPacket::Event { namespace, id, data } => {
                let name = data.first().and_then(Value::as_str).unwrap_or_default();
                tracing::debug!(sid = %self.sid, %namespace, event = name, "client event ignored");
                match id {
                    Some(id) if self.joined.is_some() => {
                        let ack = SocketPacket::Ack {
                            namespace,
                            id,
                            data: Vec::new(),
                        };
                        self.send_socket(&ack).await
                    }
                    _ => Ok(()),
                }
            }
            SocketPacket::Ack { .. } | SocketPacket::ConnectError { .. } => Ok(()),
        }
    }
}

/// Runs one session until the client leaves, the heartbeat fails or the
/// plot bus shuts down.
pub async fn run_connection(socket: WebSocket, ctx: SessionContext) {
    let SessionContext {
        mut plot_rx,
        plot_service,
        engine,
        guard,
    } = ctx;
    let engine = engine.normalized();

    let (tx, mut rx) = socket.split();
    let mut session = Session {
        sid: uuid::Uuid::new_v4().to_string(),
        tx,
        joined: None,
        replayed: ReplayFilter::default(),
    };

    let open = EnginePacket::Open(OpenPayload {
        sid: session.sid.clone(),
        upgrades: Vec::new(),
        ping_interval: duration_millis(engine.ping_interval),
        ping_timeout: duration_millis(engine.ping_timeout),
        max_payload: engine.max_payload,
    });
    if session.send_engine(&open).await.is_err() {
        tracing::debug!(sid = %session.sid, "client gone before handshake");
        return;
    }
    tracing::info!(sid = %session.sid, "engine.io session opened");

    let mut heartbeat =
        tokio::time::interval_at(Instant::now() + engine.ping_interval, engine.ping_interval);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut pong_deadline: Option<Instant> = None;

    let end = loop {
        let step = tokio::select! {
            frame = rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if text.len() as u64 > engine.max_payload {
                        Err(SessionEnd::PayloadTooLarge)
                    } else {
                        on_text(&mut session, text.as_str(), &plot_service, &mut pong_deadline).await
                    }
                }
                Some(Ok(Message::Binary(_))) => {
                    tracing::warn!(sid = %session.sid, "binary frame ignored");
                    Ok(())
                }
                Some(Ok(Message::Close(_))) | None => Err(SessionEnd::TransportClosed),
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => Ok(()),
                Some(Err(e)) => {
                    tracing::debug!(sid = %session.sid, error = %e, "websocket error");
                    Err(SessionEnd::TransportClosed)
                }
            },
            plot = plot_rx.recv() => match plot {
                Ok(plot) => {
                    if session.joined.is_none() || session.replayed.is_duplicate(&plot.id) {
                        Ok(())
                    } else {
                        session.send_plot(&plot).await
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(sid = %session.sid, lagged = n, "session lagged behind plot bus");
                    Ok(())
                }
                Err(broadcast::error::RecvError::Closed) => Err(SessionEnd::BusClosed),
            },
            _ = heartbeat.tick() => {
                if pong_deadline.is_none() {
                    pong_deadline = Some(Instant::now() + engine.ping_timeout);
                }
                session.send_engine(&EnginePacket::Ping(None)).await
            }
            () = wait_until(pong_deadline) => Err(SessionEnd::PingTimeout),
        };
        if let Err(end) = step {
            break end;
        }
    };

    if end != SessionEnd::SendFailed && end != SessionEnd::TransportClosed {
        let _ = session.send_engine(&EnginePacket::Close).await;
        let _ = session.tx.close().await;
    }
    drop(guard);
    tracing::info!(sid = %session.sid, reason = %end, "engine.io session closed");
}

/// Handles one text frame from the client.
async fn on_text(
    session: &mut Session,
    text: &str,
    service: &PlotService,
    pong_deadline: &mut Option<Instant>,
) -> Result<(), SessionEnd> {
    let packet = match EnginePacket::decode(text) {
        Ok(packet) => packet,
        Err(e) => {
            warn_undecodable(&session.sid, text, &e);
            return Ok(());
        }
    };
    match packet {
        EnginePacket::Pong(_) => {
            *pong_deadline = None;
            Ok(())
        }
        EnginePacket::Ping(probe) => session.send_engine(&EnginePacket::Pong(probe)).await,
        EnginePacket::Close => Err(SessionEnd::ClientClose),
        EnginePacket::Message(body) => match SocketPacket::decode(&body) {
            Ok(packet) => session.on_socket_packet(packet, service).await,
            Err(e) => {
                warn_undecodable(&session.sid, &body, &e);
                Ok(())
            }
        },
        EnginePacket::Open(_) | EnginePacket::Upgrade | EnginePacket::Noop => Ok(()),
    }
}

fn warn_undecodable(sid: &str, text: &str, error: &ProtocolError) {
    tracing::warn!(sid, frame = %text, %error, "undecodable packet skipped");
}

/// Resolves at `deadline`, never when there is none.
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn duration_millis(d: std::time::Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
