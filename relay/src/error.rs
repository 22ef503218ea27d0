//! Error types for the relay.
//!
//! Signature failures are not errors here; they are a boolean outcome mapped
//! straight to 401 by the webhook handler.

use thiserror::Error;

/// The webhook body could not be decoded into an alert.
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("malformed alert JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("alert payload is not a JSON object")]
    NotAnObject,
}

/// The exchange call failed or the exchange declined the order.
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("exchange API key and secret are not configured")]
    MissingCredentials,

    #[error("exchange API secret is not a usable HMAC key")]
    InvalidSecret,

    #[error("exchange request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("APIError(code={code}): {msg}")]
    Api { status: u16, code: i64, msg: String },

    #[error("exchange returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected exchange response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// An order could not be placed.
#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Invalid order type: {0}")]
    InvalidOrderType(String),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),
}

impl OrderError {
    /// Short machine-readable kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            OrderError::InvalidOrderType(_) => "invalid_order_type",
            OrderError::Exchange(ExchangeError::MissingCredentials)
            | OrderError::Exchange(ExchangeError::InvalidSecret) => "credentials",
            OrderError::Exchange(ExchangeError::Http(_)) => "http",
            OrderError::Exchange(ExchangeError::Api { .. }) => "rejected",
            OrderError::Exchange(ExchangeError::Status { .. }) => "http_status",
            OrderError::Exchange(ExchangeError::Decode(_)) => "decode",
        }
    }
}
