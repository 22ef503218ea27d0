//! Exchange adapter module.
//!
//! The webhook layer only ever talks to an [`Exchange`]; the Binance REST
//! client is the production implementation.

pub mod binance;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::ExchangeError;

pub use binance::BinanceClient;

/// Time in force for resting orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeInForce {
    /// Good till cancelled
    Gtc,
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::Gtc => "GTC",
        }
    }
}

/// How the order should execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderKind {
    Market,
    Limit {
        price: Decimal,
        time_in_force: TimeInForce,
    },
}

impl OrderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderKind::Market => "MARKET",
            OrderKind::Limit { .. } => "LIMIT",
        }
    }
}

/// Order as sent to the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    /// Exchange symbol, e.g. `BTCUSDT`
    pub symbol: String,
    /// `BUY` or `SELL`; forwarded verbatim
    pub side: String,
    pub quantity: Decimal,
    pub kind: OrderKind,
}

/// Exchange acknowledgement of an accepted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderAck {
    pub order_id: u64,
    pub status: String,
}

/// Something that can place spot orders.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Exchange identifier, used in logs.
    fn id(&self) -> &'static str;

    /// Place a new order.
    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError>;
}
