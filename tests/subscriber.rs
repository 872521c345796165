//! Subscriber integration tests
//!
//! Runs the subscriber against the real dashboard and against scripted
//! Socket.IO servers built on `tokio-tungstenite`.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use wanlog_dashboard::app_state::AppState;
use wanlog_dashboard::build_app;
use wanlog_dashboard::config::EngineSettings;
use wanlog_dashboard::domain::{Plot, PlotBus, PlotRegistry};
use wanlog_dashboard::service::PlotService;
use wanlog_dashboard::subscriber::{
    ConnectionState, DisconnectReason, Endpoint, SubscriberError, connect,
};

const OPEN: &str = r#"0{"sid":"scripted","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;

// ============================================================================
// Test Fixtures
// ============================================================================

async fn start_dashboard() -> (SocketAddr, Arc<PlotService>) {
    let service = PlotService::new(Arc::new(PlotRegistry::new()), PlotBus::new(64));
    service.publish(Plot::demo()).await.unwrap();

    let state = AppState::new(service, EngineSettings::default());
    let service = Arc::clone(&state.plot_service);
    let app = build_app(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, service)
}

/// Scripted server: counts WebSocket handshakes, acks the namespace join,
/// sends `frames` and closes the session.
async fn start_scripted(frames: Vec<&'static str>) -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepted);

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let Ok(mut ws) = accept_async(stream).await else {
                continue;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            let frames = frames.clone();
            tokio::spawn(async move {
                ws.send(Message::text(OPEN)).await.unwrap();
                while let Some(Ok(msg)) = ws.next().await {
                    if matches!(&msg, Message::Text(t) if t.as_str().starts_with("40")) {
                        break;
                    }
                }
                ws.send(Message::text(r#"40{"sid":"socket"}"#)).await.unwrap();
                for frame in frames {
                    ws.send(Message::text(frame)).await.unwrap();
                }
                let _ = ws.close(None).await;
            });
        }
    });
    (addr, accepted)
}

fn endpoint(addr: SocketAddr) -> Endpoint {
    Endpoint::from_origin(&format!("http://{addr}")).unwrap()
}

// ============================================================================
// Against the dashboard
// ============================================================================

#[tokio::test]
async fn test_subscriber_receives_replayed_and_live_plots() {
    let (addr, service) = start_dashboard().await;

    let mut connection = connect(&endpoint(addr)).await.unwrap();
    assert_eq!(connection.state(), ConnectionState::Connected);
    assert!(connection.socket_id().is_some());

    let (tx, mut rx) = mpsc::unbounded_channel();
    connection.on_event("plots", move |_: &str, payload: &Value| {
        let _ = tx.send(payload.clone());
    });
    tokio::spawn(async move { connection.run().await });

    let demo = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(demo["title"], "Demo");

    let mut live = Plot::demo();
    live.title = "Live".to_string();
    service.publish(live).await.unwrap();

    let received = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(received["title"], "Live");
}

// ============================================================================
// Against scripted servers
// ============================================================================

#[tokio::test]
async fn test_only_subscribed_event_reaches_handler() {
    let (addr, _) = start_scripted(vec![
        r#"42["status",{"ok":true}]"#,
        r#"42["plots",{"a":1}]"#,
        r#"42/other,["plots",{"b":2}]"#,
        "41",
    ])
    .await;

    let mut connection = connect(&endpoint(addr)).await.unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    connection.on_event("plots", move |event: &str, payload: &Value| {
        let _ = tx.send((event.to_string(), payload.clone()));
    });

    let reason = connection.run().await.unwrap();
    assert_eq!(reason, DisconnectReason::ServerDisconnect);

    let mut seen = Vec::new();
    while let Ok(item) = rx.try_recv() {
        seen.push(item);
    }
    assert_eq!(seen, vec![("plots".to_string(), json!({"a": 1}))]);
}

#[tokio::test]
async fn test_malformed_frames_are_skipped() {
    let (addr, _) = start_scripted(vec!["9garbage", "42not json", r#"42["plots","ok"]"#, "1"]).await;

    let mut connection = connect(&endpoint(addr)).await.unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    connection.on_event("plots", move |_: &str, payload: &Value| {
        let _ = tx.send(payload.clone());
    });

    let reason = connection.run().await.unwrap();
    assert_eq!(reason, DisconnectReason::EngineClose);
    assert_eq!(rx.try_recv().ok(), Some(json!("ok")));
}

#[tokio::test]
async fn test_malformed_frames_before_ack_are_skipped() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::text(OPEN)).await.unwrap();
        let _join = ws.next().await;
        for frame in ["42not json", "4x", r#"40{"sid":"socket"}"#, "1"] {
            ws.send(Message::text(frame)).await.unwrap();
        }
        let _ = ws.next().await;
    });

    let mut connection = connect(&endpoint(addr)).await.unwrap();
    assert_eq!(connection.socket_id(), Some("socket"));
    assert_eq!(connection.run().await.unwrap(), DisconnectReason::EngineClose);
}

#[tokio::test]
async fn test_no_reconnect_after_server_closes() {
    let (addr, accepted) = start_scripted(vec![r#"42["plots",1]"#]).await;

    let mut connection = connect(&endpoint(addr)).await.unwrap();
    let reason = connection.run().await.unwrap();
    assert_eq!(reason, DisconnectReason::TransportClosed);
    assert_eq!(connection.state(), ConnectionState::Disconnected);

    // A second run does not dial again.
    assert!(matches!(
        connection.run().await,
        Err(SubscriberError::NotConnected)
    ));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_refused_namespace_fails_connect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::text(OPEN)).await.unwrap();
        let _join = ws.next().await;
        ws.send(Message::text(r#"44{"message":"not allowed"}"#))
            .await
            .unwrap();
        let _ = ws.next().await;
    });

    let result = connect(&endpoint(addr)).await;
    let Err(SubscriberError::ConnectRefused { namespace, message }) = result else {
        panic!("expected namespace refusal");
    };
    assert_eq!(namespace, "/");
    assert_eq!(message, "not allowed");
}

#[tokio::test]
async fn test_unreachable_dashboard_is_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    assert!(matches!(
        connect(&endpoint(addr)).await,
        Err(SubscriberError::Transport(_))
    ));
}

// ============================================================================
// Heartbeat
// ============================================================================

#[tokio::test]
async fn test_ping_is_answered_and_silence_times_out() {
    const FAST_OPEN: &str = r#"0{"sid":"scripted","upgrades":[],"pingInterval":100,"pingTimeout":100,"maxPayload":1000000}"#;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (replies_tx, mut replies) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::text(FAST_OPEN)).await.unwrap();
        let _join = ws.next().await;
        ws.send(Message::text(r#"40{"sid":"socket"}"#)).await.unwrap();
        ws.send(Message::text("2")).await.unwrap();
        // Stay silent, recording what the client sends until it leaves.
        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Text(text) = msg {
                let _ = replies_tx.send(text.as_str().to_string());
            }
        }
    });

    let mut connection = connect(&endpoint(addr)).await.unwrap();
    let reason = tokio::time::timeout(Duration::from_secs(2), connection.run())
        .await
        .expect("run should end on its own")
        .unwrap();
    assert_eq!(reason, DisconnectReason::PingTimeout);
    assert_eq!(connection.state(), ConnectionState::Disconnected);

    let first = tokio::time::timeout(Duration::from_secs(1), replies.recv())
        .await
        .unwrap();
    assert_eq!(first.as_deref(), Some("3"));
}
