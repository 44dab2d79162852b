//! Ball Game Client
//!
//! Entry point: loads configuration, picks the MessagePack backend, then runs
//! the session against the relay until Ctrl+C or SIGTERM.

use tracing::{info, info_span, Instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ball_game_client::app::{run, Session};
use ball_game_client::config::{Config, LogFormat};
use ball_game_client::game::PhysicsSystem;
use ball_game_client::render::TraceRenderer;
use ball_game_client::util::time::SystemClock;
use ball_game_client::ws::codec::{select_codec, CodecAdapter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    init_tracing(&config.log_level, config.log_format);

    info!("Starting Ball Game Client");
    info!(url = %config.server_url, render_fps = config.render_fps, "Relay");

    // Codec first: it must be settled before any timer or socket starts
    let codec = CodecAdapter::new(select_codec(config.codec_backend));

    let mut session = Session::new(
        codec,
        PhysicsSystem::new(config.peer_dead_reckoning),
        Box::new(TraceRenderer::new(config.render_fps)),
        Box::new(SystemClock),
    );

    let span = info_span!("session", session_id = %session.id());
    run(&config, &mut session, shutdown_signal())
        .instrument(span)
        .await?;

    info!("Client shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str, format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Logs go to stderr, the terminal is also the pointer input
    match format {
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
