//! Alert Relay web server.
//!
//! Receives TradingView webhooks and places the corresponding orders on
//! Binance (testnet or live, depending on `TESTNET_MODE`).

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use relay::{router, AppState, BinanceClient, Config};

/// Structured JSON logs; `RUST_LOG` overrides the default filter.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!(version = env!("CARGO_PKG_VERSION"), "relay_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        mode = config.mode(),
        exchange_base_url = %config.exchange_base_url,
        api_key_set = config.binance_api_key.is_some(),
        api_secret_set = config.binance_api_secret.is_some(),
        require_signature = config.require_signature,
        exchange_timeout_ms = config.exchange_timeout_ms,
        "config_loaded"
    );

    if config.uses_placeholder_secret() {
        warn!("webhook_secret_is_placeholder");
    }
    if !config.require_signature {
        warn!("unsigned_webhooks_accepted");
    }

    // Create exchange client
    let exchange =
        BinanceClient::from_config(&config).context("Failed to create exchange client")?;
    info!(base_url = exchange.base_url(), "exchange_client_created");

    let port = config.port;
    let mode = config.mode();
    let state = AppState::new(config, Arc::new(exchange));
    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "relay_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(mode))
        .await
        .context("Server error")?;

    info!(mode = mode, "relay_shutdown_complete");

    Ok(())
}

/// Resolves on SIGINT or SIGTERM. In-flight webhooks finish before exit,
/// so an order already sent to the exchange still gets its response.
async fn shutdown_signal(mode: &'static str) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "sigint_handler_failed");
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
                warn!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal_name = tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    };

    info!(signal = signal_name, mode = mode, "relay_shutting_down");
}
