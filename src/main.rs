//! Main entry point for the Gen Routing Gateway
//!
//! Reads newline-delimited JSON generation requests from stdin and writes one
//! JSON response per line to stdout. Logs go to stderr.

use gen_routing_gateway::{api, config::Settings, Gateway};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config_path =
        std::env::var("GEN_GATEWAY_CONFIG").unwrap_or_else(|_| "config/gateway.yaml".to_string());
    let settings = Settings::load_from_path(&config_path)?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    let registry = tracing_subscriber::registry().with(filter);
    if settings.logging.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    }

    info!(config = %config_path, "Starting Gen Routing Gateway");
    if settings.get_enabled_providers().is_empty() {
        warn!("No providers enabled; every request will fail with NOT_FOUND");
    }

    let gateway = Gateway::from_settings(settings)?;
    gateway.start_health_checks();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = api::generate_json(&gateway, &line).await;
        let mut encoded = serde_json::to_vec(&response)?;
        encoded.push(b'\n');
        stdout.write_all(&encoded).await?;
        stdout.flush().await?;
    }

    for stats in gateway.provider_stats() {
        info!(
            provider = %stats.provider,
            attempts = stats.attempts,
            successes = stats.successes,
            failures = stats.failures,
            fallback_successes = stats.fallback_successes,
            "Provider routing stats"
        );
    }
    info!("Input closed, shutting down");
    Ok(())
}
