use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::eyre;
use shamba_console::{Config, Session, api};
use shamba_oracle::{GeminiBackend, OracleClient};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Time allowed for background tasks to exit after shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "shamba-console")]
#[command(about = "Shamba field console")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "shamba.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        "tracing=info,shamba_console=info,shamba_oracle=info,shamba_telemetry=info".to_owned()
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let cli = Cli::parse();

    let config = if cli.config.exists() {
        info!(path = ?cli.config, "Loading configuration");
        Config::load(&cli.config)?
    } else {
        info!("No configuration file found, using defaults");
        Config::default()
    };

    let api_key = std::env::var(&config.oracle.api_key_env).map_err(|_| {
        eyre!(
            "environment variable {} must hold the AI service API key",
            config.oracle.api_key_env
        )
    })?;

    let backend = GeminiBackend::with_options(
        api_key,
        config.oracle.endpoint.as_str(),
        config.oracle.request_timeout(),
    )?;
    let oracle = OracleClient::new(backend)
        .with_policy(config.oracle.retry_policy())
        .with_models(config.oracle.model_routes());

    info!(
        plan = %config.session.plan,
        http_addr = %config.server.http_addr,
        endpoint = %config.oracle.endpoint,
        "Starting shamba-console"
    );

    let session = Session::start(&config, oracle);
    let app = api::router(session.handle());

    let http_addr = config.server.http_addr;
    let listener = TcpListener::bind(http_addr).await?;
    info!(%http_addr, "HTTP server listening");

    let shutdown = CancellationToken::new();
    let shutdown_for_http = shutdown.clone();

    tokio::select! {
        result = axum::serve(listener, app).with_graceful_shutdown(async move {
            shutdown_for_http.cancelled().await;
        }) => {
            if let Err(e) = result {
                error!(error = ?e, "HTTP server error");
            }
            info!("HTTP server shut down");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            shutdown.cancel();
        }
    }

    session.end_within(SHUTDOWN_GRACE).await;

    info!("shamba-console shut down complete");
    Ok(())
}
