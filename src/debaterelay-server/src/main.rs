//! DebateRelay - AI debate opponent over HTTP
//!
//! Accepts a recorded argument, answers with a spoken AI rebuttal, and keeps
//! the running debate in memory.

use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use debaterelay_core::{ApiKeys, Config, TurnOrchestrator};
use debaterelay_server::{AppState, create_router};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;

#[derive(Parser)]
#[command(
    name = "debaterelay",
    version,
    about = "AI Debate Relay - Speak an argument, hear an AI rebuttal",
    long_about = "An HTTP server that answers recorded debate arguments with generated, synthesized rebuttals."
)]
struct Cli {
    /// Host to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "debaterelay_server=info,debaterelay_core=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match cli
        .config
        .or_else(|| std::env::var_os("DEBATERELAY_CONFIG").map(PathBuf::from))
    {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            Config::load(&path)?
        }
        None => Config::default(),
    };
    info!(
        model = %config.generator.model,
        voice = %config.synthesizer.voice_model,
        "Configuration loaded"
    );

    let keys = ApiKeys::from_env();
    let orchestrator = TurnOrchestrator::from_config(&config, &keys)?;
    let app = create_router(AppState::new(orchestrator));

    let host = cli.host.unwrap_or_else(host_from_env_or_default);
    let port = cli.port.unwrap_or_else(port_from_env_or_default);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn host_from_env_or_default() -> String {
    match std::env::var("DEBATERELAY_HOST") {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().to_string(),
        Ok(_) => {
            warn!("Empty DEBATERELAY_HOST, falling back to {}", DEFAULT_HOST);
            DEFAULT_HOST.to_string()
        }
        Err(_) => DEFAULT_HOST.to_string(),
    }
}

fn port_from_env_or_default() -> u16 {
    match std::env::var("DEBATERELAY_PORT") {
        Ok(raw) => raw.trim().parse::<u16>().unwrap_or_else(|_| {
            warn!(
                "Invalid DEBATERELAY_PORT='{}', falling back to {}",
                raw, DEFAULT_PORT
            );
            DEFAULT_PORT
        }),
        Err(_) => DEFAULT_PORT,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
