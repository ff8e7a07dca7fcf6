//! Nova Relay - Outbound voice-call relay backend
//!
//! Accepts call task requests, dispatches them to the Vapi calling API, and
//! fans provider webhook events out to live WebSocket subscribers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nova_relay::api::{build_app, AppState};
use nova_relay::config::RelayConfig;
use nova_relay::dispatch::CallDispatcher;
use nova_relay::updates::SubscriberRegistry;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "nova-relay")]
#[command(version)]
#[command(about = "Outbound voice-call relay for the Vapi calling API")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1", env = "NOVA_RELAY_HOST")]
        host: String,

        /// Port to listen on
        #[arg(long, default_value = "8000", env = "NOVA_RELAY_PORT")]
        port: u16,
    },

    /// Print the effective configuration (credentials redacted)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("nova_relay={},tower_http=debug", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RelayConfig::from_env();

    match cli.command {
        Commands::Serve { host, port } => {
            serve(config, &host, port).await?;
        }
        Commands::Config => {
            print_config(&config)?;
        }
    }

    Ok(())
}

async fn serve(config: RelayConfig, host: &str, port: u16) -> Result<()> {
    if config.provider.api_key.is_none() {
        tracing::warn!("VAPI_API_KEY is not set; call dispatch will fail until configured");
    }
    if config.provider.phone_number_id.is_none() {
        tracing::warn!("VAPI_PHONE_NUMBER_ID is not set; call dispatch will fail until configured");
    }

    let dispatcher = Arc::new(
        CallDispatcher::new(config.provider.clone())
            .context("failed to build provider HTTP client")?,
    );
    let registry = Arc::new(SubscriberRegistry::new());
    let app = build_app(
        AppState {
            dispatcher,
            registry,
        },
        &config.cors_origins,
    );

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("nova-relay listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}

fn print_config(config: &RelayConfig) -> Result<()> {
    let mut redacted = config.clone();
    if redacted.provider.api_key.is_some() {
        redacted.provider.api_key = Some("***".to_string());
    }
    println!("{}", serde_json::to_string_pretty(&redacted)?);
    Ok(())
}
