//! # team-pty
//!
//! Drives a team of remote agent terminals from one console.
//!
//! ## Overview
//!
//! The binary reads operator commands from stdin and prints the team
//! transcript to stdout. Logs go to stderr.
//!
//! ## Architecture
//!
//! This is Layer 3 - the binary that ties together:
//! - team-pty-core: Core types and configuration
//! - team-pty-protocol: Wire envelopes
//! - team-pty-classifier: Output classification
//! - team-pty-session: Session lifecycle

use anyhow::Context;
use team_pty_core::RuntimeConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .iter()
        .position(|arg| arg == "--config")
        .and_then(|idx| args.get(idx + 1));

    let config = match config_path {
        Some(path) => RuntimeConfig::from_file(path)
            .with_context(|| format!("failed to load config from {path}"))?,
        None => RuntimeConfig::default(),
    }
    .with_env_overrides();
    config.validate()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        "team-pty v{} starting: ws={}, api={}",
        env!("CARGO_PKG_VERSION"),
        config.server.ws_url,
        config.server.api_base_url
    );

    team_pty::run(config).await?;

    tracing::info!("team-pty shutting down");

    Ok(())
}
