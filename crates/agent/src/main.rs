//! `nsca-agent` -- passive-check submitter for NSCA-ng servers.
//!
//! Samples host load, memory and disk usage, classifies each sample
//! against warning/critical thresholds and pushes the results to an
//! NSCA-ng server over PSK-TLS on a fixed interval.
//!
//! # Environment variables
//!
//! | Variable              | Required | Default | Description                         |
//! |-----------------------|----------|---------|-------------------------------------|
//! | `NSCA_SERVER`         | yes      | --      | Server address, e.g. `monitor:5668` |
//! | `NSCA_PSK_IDENTITY`   | yes      | --      | PSK identity                        |
//! | `NSCA_PSK_KEY`        | yes      | --      | PSK key                             |
//! | `CHECK_INTERVAL_SECS` | no       | `60`    | Seconds between submissions         |
//!
//! See [`AgentConfig::from_env`](nsca_agent::config::AgentConfig::from_env)
//! for the full list.

use nsca_agent::collector::MetricsCollector;
use nsca_agent::config::AgentConfig;
use nsca_agent::sender;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nsca_agent=info,nsca_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AgentConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    tracing::info!(
        server = %config.server,
        identity = config.credentials.identity(),
        interval_secs = config.interval.as_secs(),
        await_reply = config.session.await_handshake_reply,
        "Starting nsca-agent",
    );

    let collector = MetricsCollector::new(config.hostname.clone());

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    };

    sender::run(config, collector, shutdown).await;
}
