//! wanlog-subscriber: follows a dashboard's plot feed and logs every
//! message.
//!
//! Opens exactly one connection to `DASHBOARD_ORIGIN`, registers a
//! [`LogHandler`] for `SUBSCRIBER_EVENT` and dispatches until the
//! transport ends. A failed connect is reported once; nothing is retried.

use anyhow::Context;
use wanlog_dashboard::config::SubscriberConfig;
use wanlog_dashboard::init_tracing;
use wanlog_dashboard::subscriber::{LogHandler, connect};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = SubscriberConfig::from_env();
    init_tracing(config.json_logs);

    let endpoint = config.endpoint()?;
    tracing::info!(%endpoint, event = %config.event, "starting wanlog-subscriber");

    let mut connection = connect(&endpoint)
        .await
        .with_context(|| format!("failed to connect to {endpoint}"))?;
    connection.on_event(&config.event, LogHandler);

    let reason = connection.run().await?;
    tracing::info!(%reason, "subscriber finished");
    Ok(())
}
