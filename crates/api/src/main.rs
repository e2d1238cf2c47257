use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tipline_api::config::ServerConfig;
use tipline_api::router::build_app_router;
use tipline_api::state::AppState;
use tipline_events::{HeartbeatScheduler, SubscriberRegistry};
use tipline_stripe::StripeClient;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tipline_api=debug,tipline_events=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().unwrap_or_else(|e| panic!("Invalid configuration: {e}"));
    tracing::info!(host = %config.host, port = config.port, "Loaded server configuration");
    if config.stripe_webhook_secret.is_none() {
        tracing::warn!("STRIPE_WEBHOOK_SECRET is not set; every webhook will be rejected");
    }

    // --- Subscriber registry ---
    let registry = Arc::new(SubscriberRegistry::new());

    // --- Heartbeat ---
    let heartbeat_cancel = CancellationToken::new();
    let heartbeat_handle =
        HeartbeatScheduler::new(Arc::clone(&registry), config.heartbeat_interval())
            .spawn(heartbeat_cancel.clone());

    // --- Payment processor ---
    let stripe = StripeClient::new(config.stripe_secret.clone(), config.stripe_api_base.clone())
        .expect("Failed to build payment processor client");
    tracing::info!(api_base = %config.stripe_api_base, "Payment processor client ready");

    // --- App state + router ---
    let state = AppState::new(config.clone(), Arc::clone(&registry), Arc::new(stripe));
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(config.host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    let shutdown = {
        let registry = Arc::clone(&registry);
        let heartbeat_cancel = heartbeat_cancel.clone();
        async move {
            shutdown_signal().await;
            heartbeat_cancel.cancel();
            // Open streams never finish on their own; end them so the
            // server can drain.
            registry.shutdown_all();
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    let _ = tokio::time::timeout(Duration::from_secs(5), heartbeat_handle).await;
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
