//! Configuration module for environment variable parsing.
//!
//! Everything is read once at startup; there is no hot reload.

use std::env;
use tracing::warn;

/// Secret used when `WEBHOOK_SECRET` is not set.
pub const PLACEHOLDER_WEBHOOK_SECRET: &str = "your-webhook-secret";

/// Binance spot REST endpoint for live trading.
pub const LIVE_BASE_URL: &str = "https://api.binance.com";

/// Binance spot REST endpoint for the testnet sandbox.
pub const TESTNET_BASE_URL: &str = "https://testnet.binance.vision";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Shared secret for the `X-Tradingview-Signature` HMAC
    pub webhook_secret: String,

    /// Reject webhooks that arrive without a signature header
    pub require_signature: bool,

    /// Binance API key
    pub binance_api_key: Option<String>,

    /// Binance API secret
    pub binance_api_secret: Option<String>,

    /// Trade against the testnet instead of the live exchange
    pub testnet_mode: bool,

    /// Exchange REST base URL (derived from `testnet_mode` unless overridden)
    pub exchange_base_url: String,

    /// Outbound exchange request timeout in milliseconds
    pub exchange_timeout_ms: u64,

    /// Validity window for signed exchange requests in milliseconds
    pub recv_window_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let testnet_mode = parse_bool("TESTNET_MODE", true);

        let exchange_base_url = env::var("BINANCE_BASE_URL")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default_base_url(testnet_mode).to_string());

        Config {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),

            webhook_secret: env::var("WEBHOOK_SECRET")
                .unwrap_or_else(|_| PLACEHOLDER_WEBHOOK_SECRET.to_string()),

            require_signature: parse_bool("REQUIRE_SIGNATURE", false),

            binance_api_key: parse_secret("BINANCE_API_KEY"),

            binance_api_secret: parse_secret("BINANCE_API_SECRET"),

            testnet_mode,

            exchange_base_url,

            exchange_timeout_ms: env::var("EXCHANGE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),

            recv_window_ms: env::var("BINANCE_RECV_WINDOW_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
        }
    }

    /// Human-readable trading mode, as reported by the health endpoint.
    pub fn mode(&self) -> &'static str {
        if self.testnet_mode {
            "testnet"
        } else {
            "live"
        }
    }

    /// Whether the webhook secret is still the built-in placeholder.
    pub fn uses_placeholder_secret(&self) -> bool {
        self.webhook_secret == PLACEHOLDER_WEBHOOK_SECRET
    }
}

/// Base URL for the given trading mode.
pub fn default_base_url(testnet_mode: bool) -> &'static str {
    if testnet_mode {
        TESTNET_BASE_URL
    } else {
        LIVE_BASE_URL
    }
}

/// Parse a boolean flag. Only a case-insensitive "true" enables it.
fn parse_bool(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(raw) => {
            let value = raw.trim().to_lowercase();
            if value != "true" && value != "false" {
                warn!(env_var = name, value = %raw, "non_boolean_flag_treated_as_false");
            }
            value == "true"
        }
        Err(_) => default,
    }
}

/// Read an optional credential, treating blank values as unset.
fn parse_secret(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
