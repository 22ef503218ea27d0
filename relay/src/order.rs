//! Order submission.
//!
//! Turns an alert into an exchange order. There is no retry and no
//! idempotency key: a duplicate webhook delivery places a duplicate order.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info};

use crate::alert::Alert;
use crate::error::OrderError;
use crate::exchange::{Exchange, OrderKind, OrderRequest, TimeInForce};

/// Quote currency appended to bare tickers.
pub const QUOTE_SUFFIX: &str = "USDT";

/// Order type used when the alert does not name one.
pub const DEFAULT_ORDER_TYPE: &str = "MARKET";

/// An order the exchange accepted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedOrder {
    pub order_id: u64,
    pub symbol: String,
    pub side: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    pub status: String,
}

/// Append the quote currency unless the symbol already ends with it.
///
/// Idempotent: an already-suffixed symbol is returned unchanged.
pub fn normalize_symbol(symbol: &str) -> String {
    if symbol.ends_with(QUOTE_SUFFIX) {
        symbol.to_string()
    } else {
        format!("{}{}", symbol.to_uppercase(), QUOTE_SUFFIX)
    }
}

/// Places orders on the configured exchange. Clone is cheap.
#[derive(Clone)]
pub struct OrderSubmitter {
    exchange: Arc<dyn Exchange>,
}

impl OrderSubmitter {
    pub fn new(exchange: Arc<dyn Exchange>) -> Self {
        Self { exchange }
    }

    /// Submit an order for a parsed alert.
    pub async fn submit_alert(&self, alert: &Alert) -> Result<PlacedOrder, OrderError> {
        self.submit(
            &alert.symbol,
            &alert.side,
            alert.quantity,
            alert.order_type.as_deref().unwrap_or(DEFAULT_ORDER_TYPE),
            alert.price,
        )
        .await
    }

    /// Submit an order.
    ///
    /// `MARKET` places a market order; `LIMIT` with a price places a GTC
    /// limit order. Anything else fails with `InvalidOrderType`. Exchange
    /// failures come back as `OrderError::Exchange`.
    pub async fn submit(
        &self,
        symbol: &str,
        side: &str,
        quantity: Decimal,
        order_type: &str,
        price: Option<Decimal>,
    ) -> Result<PlacedOrder, OrderError> {
        let symbol = normalize_symbol(symbol);

        let kind = match (order_type.to_uppercase().as_str(), price) {
            ("MARKET", _) => OrderKind::Market,
            ("LIMIT", Some(price)) => OrderKind::Limit {
                price,
                time_in_force: TimeInForce::Gtc,
            },
            _ => {
                let err = OrderError::InvalidOrderType(order_type.to_string());
                error!(symbol = %symbol, error = %err, "order_failed");
                return Err(err);
            }
        };

        info!(
            exchange = self.exchange.id(),
            symbol = %symbol,
            side = %side,
            quantity = %quantity,
            order_type = kind.as_str(),
            "order_placing"
        );

        let request = OrderRequest {
            symbol,
            side: side.to_string(),
            quantity,
            kind,
        };

        match self.exchange.place_order(&request).await {
            Ok(ack) => {
                info!(
                    symbol = %request.symbol,
                    order_id = ack.order_id,
                    status = %ack.status,
                    "order_placed"
                );
                Ok(PlacedOrder {
                    order_id: ack.order_id,
                    symbol: request.symbol,
                    side: request.side,
                    quantity: request.quantity,
                    status: ack.status,
                })
            }
            Err(e) => {
                let err = OrderError::from(e);
                error!(
                    symbol = %request.symbol,
                    kind = err.kind(),
                    error = %err,
                    "order_failed"
                );
                Err(err)
            }
        }
    }
}
