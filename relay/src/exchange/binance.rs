//! Binance spot REST adapter.
//!
//! Orders go to `POST /api/v3/order` as a signed query string: the
//! parameters are form-encoded, then `signature=<HMAC-SHA256 hex>` of that
//! exact string (keyed with the API secret) is appended. The API key travels
//! in the `X-MBX-APIKEY` header.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use tracing::{info, warn};

use super::{Exchange, OrderAck, OrderKind, OrderRequest};
use crate::error::ExchangeError;
use crate::Config;

type HmacSha256 = Hmac<Sha256>;

const ORDER_PATH: &str = "/api/v3/order";
const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Binance spot client. Cheap to share; the inner `reqwest::Client` pools
/// connections.
pub struct BinanceClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    api_secret: Option<String>,
    recv_window_ms: u64,
}

/// Successful `POST /api/v3/order` body (only the fields we report).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewOrderResponse {
    order_id: u64,
    status: String,
}

/// Binance error body.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

impl BinanceClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        api_secret: Option<String>,
        recv_window_ms: u64,
        timeout: Duration,
    ) -> Result<Self, ExchangeError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            api_secret,
            recv_window_ms,
        })
    }

    /// Build a client for the configured trading mode.
    pub fn from_config(config: &Config) -> Result<Self, ExchangeError> {
        Self::new(
            config.exchange_base_url.clone(),
            config.binance_api_key.clone(),
            config.binance_api_secret.clone(),
            config.recv_window_ms,
            Duration::from_millis(config.exchange_timeout_ms),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Order parameters in the order Binance documents them.
    fn order_params(
        order: &OrderRequest,
        recv_window_ms: u64,
        timestamp_ms: i64,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("symbol", order.symbol.clone()),
            ("side", order.side.clone()),
            ("type", order.kind.as_str().to_string()),
        ];

        if let OrderKind::Limit { time_in_force, .. } = &order.kind {
            params.push(("timeInForce", time_in_force.as_str().to_string()));
        }

        params.push(("quantity", order.quantity.normalize().to_string()));

        if let OrderKind::Limit { price, .. } = &order.kind {
            params.push(("price", price.normalize().to_string()));
        }

        params.push(("recvWindow", recv_window_ms.to_string()));
        params.push(("timestamp", timestamp_ms.to_string()));
        params
    }
}

/// Form-encode `params` and append the HMAC signature of the result.
fn signed_query(secret: &str, params: &[(&str, String)]) -> Result<String, ExchangeError> {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
        .finish();

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| ExchangeError::InvalidSecret)?;
    mac.update(query.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(format!("{}&signature={}", query, signature))
}

#[async_trait]
impl Exchange for BinanceClient {
    fn id(&self) -> &'static str {
        "binance"
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError> {
        let (api_key, api_secret) = match (&self.api_key, &self.api_secret) {
            (Some(key), Some(secret)) => (key, secret),
            _ => return Err(ExchangeError::MissingCredentials),
        };

        let params = Self::order_params(order, self.recv_window_ms, Utc::now().timestamp_millis());
        let query = signed_query(api_secret, &params)?;

        info!(
            symbol = %order.symbol,
            side = %order.side,
            order_type = order.kind.as_str(),
            quantity = %order.quantity,
            "binance_order_request"
        );

        let response = self
            .client
            .post(format!("{}{}?{}", self.base_url, ORDER_PATH, query))
            .header(API_KEY_HEADER, api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(api) => ExchangeError::Api {
                    status: status.as_u16(),
                    code: api.code,
                    msg: api.msg,
                },
                Err(_) => ExchangeError::Status {
                    status: status.as_u16(),
                    body: body.chars().take(200).collect(),
                },
            };
            warn!(status_code = status.as_u16(), error = %err, "binance_order_rejected");
            return Err(err);
        }

        let placed: NewOrderResponse = serde_json::from_str(&body)?;

        info!(
            symbol = %order.symbol,
            order_id = placed.order_id,
            status = %placed.status,
            "binance_order_accepted"
        );

        Ok(OrderAck {
            order_id: placed.order_id,
            status: placed.status,
        })
    }
}
