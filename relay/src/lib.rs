//! Alert Relay - TradingView webhook to Binance order relay.
//!
//! ## Flow
//!
//! ```text
//! TradingView alert → POST /webhook → verify signature → parse alert → place order → Binance
//! ```
//!
//! Each request is handled independently. Nothing is persisted and nothing
//! is retried; the alert sender owns its retry policy on non-2xx responses.

pub mod alert;
pub mod config;
pub mod error;
pub mod exchange;
pub mod order;
pub mod web;

// Re-export commonly used types
pub use alert::{parse_alert, Alert};
pub use config::Config;
pub use error::{AlertError, ExchangeError, OrderError};
pub use exchange::{BinanceClient, Exchange};
pub use order::{normalize_symbol, OrderSubmitter, PlacedOrder};
pub use web::{router, AppState};
