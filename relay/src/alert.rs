//! TradingView alert parsing.
//!
//! Alerts arrive as a small JSON object. Every field is optional; missing
//! fields fall back to defaults so that a bare `{"symbol":"BTC"}` is a valid
//! market buy of the default quantity.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::error::AlertError;

/// Exchange prefix TradingView puts in front of tickers.
pub const EXCHANGE_PREFIX: &str = "BINANCE:";

/// Default signal and side.
pub const DEFAULT_SIDE: &str = "BUY";

/// Default order quantity (0.001).
pub fn default_quantity() -> Decimal {
    Decimal::new(1, 3)
}

/// Normalized alert, created per webhook call and discarded afterwards.
#[derive(Debug, Clone)]
pub struct Alert {
    /// Ticker with the exchange prefix removed
    pub symbol: String,
    /// Strategy signal, informational only
    pub signal: String,
    /// Order side, passed to the exchange as-is
    pub side: String,
    /// Order quantity; not validated locally
    pub quantity: Decimal,
    /// Limit price, if the alert carried one
    pub price: Option<Decimal>,
    /// Requested order type (`MARKET` when absent)
    pub order_type: Option<String>,
    /// When this alert was parsed
    pub timestamp: DateTime<Utc>,
}

/// Wire shape of an alert.
///
/// A missing key takes its default. An explicit `null` is only accepted for
/// `price` and `order_type`; anywhere else it fails the decode.
#[derive(Debug, Deserialize)]
struct AlertPayload {
    #[serde(default, deserialize_with = "present")]
    symbol: Option<String>,
    #[serde(default, deserialize_with = "present")]
    signal: Option<String>,
    #[serde(default, deserialize_with = "present")]
    side: Option<String>,
    #[serde(default, deserialize_with = "present")]
    quantity: Option<Decimal>,
    #[serde(default)]
    price: Option<Decimal>,
    #[serde(default)]
    order_type: Option<String>,
}

/// Deserialize a field that, when present, must hold a real value.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl Alert {
    /// Build an alert from an already-decoded JSON value.
    ///
    /// Only objects are accepted; a JSON string holding more JSON is not
    /// decoded again.
    pub fn from_value(value: Value) -> Result<Self, AlertError> {
        if !value.is_object() {
            return Err(AlertError::NotAnObject);
        }

        let payload: AlertPayload = serde_json::from_value(value)?;

        Ok(Alert {
            symbol: strip_exchange_prefix(payload.symbol.as_deref().unwrap_or_default()),
            signal: payload.signal.unwrap_or_else(|| DEFAULT_SIDE.to_string()),
            side: payload.side.unwrap_or_else(|| DEFAULT_SIDE.to_string()),
            quantity: payload.quantity.unwrap_or_else(default_quantity),
            price: payload.price,
            order_type: payload.order_type,
            timestamp: Utc::now(),
        })
    }
}

/// Parse a raw webhook body into an alert.
pub fn parse_alert(raw: &[u8]) -> Result<Alert, AlertError> {
    let value: Value = serde_json::from_slice(raw).map_err(|e| {
        warn!(error = %e, body_length = raw.len(), "alert_parse_failed");
        AlertError::from(e)
    })?;

    Alert::from_value(value).map_err(|e| {
        warn!(error = %e, "alert_decode_failed");
        e
    })
}

/// Remove every `BINANCE:` occurrence from a ticker.
fn strip_exchange_prefix(symbol: &str) -> String {
    symbol.replace(EXCHANGE_PREFIX, "")
}
