//! HTTP endpoint handlers.
//!
//! The webhook handler runs the whole relay in sequence:
//! 1. Verify the body signature (401 on failure)
//! 2. Parse the alert (400 on failure)
//! 3. Place the order (200 on success, 400 on failure)
//!
//! Panics anywhere in the handler stack are turned into a 500 by
//! [`panic_response`].

use std::any::Any;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::alert::parse_alert;
use crate::exchange::Exchange;
use crate::order::{OrderSubmitter, PlacedOrder};
use crate::web::signature::{check_signature, SignatureCheck, SIGNATURE_HEADER};
use crate::Config;

/// Service name reported by the index endpoint.
pub const APP_NAME: &str = "Trading Bot Webhook";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub submitter: OrderSubmitter,
}

impl AppState {
    pub fn new(config: Config, exchange: Arc<dyn Exchange>) -> Self {
        Self {
            config: Arc::new(config),
            submitter: OrderSubmitter::new(exchange),
        }
    }
}

// =============================================================================
// Health Check & Index
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub mode: &'static str,
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        mode: state.config.mode(),
    })
}

/// Service metadata.
#[derive(Serialize)]
pub struct IndexResponse {
    pub app: &'static str,
    pub status: &'static str,
    pub testnet: bool,
    pub webhook_url: &'static str,
    pub health_check: &'static str,
}

/// Index endpoint.
pub async fn index(State(state): State<AppState>) -> Json<IndexResponse> {
    Json(IndexResponse {
        app: APP_NAME,
        status: "running",
        testnet: state.config.testnet_mode,
        webhook_url: "/webhook",
        health_check: "/health",
    })
}

// =============================================================================
// Webhook
// =============================================================================

/// Error body for rejected and failed requests.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Order details in a successful webhook response.
#[derive(Serialize)]
pub struct OrderBody {
    pub success: bool,
    #[serde(flatten)]
    pub order: PlacedOrder,
}

/// Webhook response once an order has been attempted.
#[derive(Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

/// Webhook endpoint.
///
/// The body is taken as raw bytes so the signature is checked against
/// exactly what was sent.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

    info!(
        body_length = body.len(),
        has_signature = signature.as_deref().is_some_and(|s| !s.is_empty()),
        "webhook_received"
    );

    match check_signature(
        &state.config.webhook_secret,
        &body,
        signature.as_deref(),
        state.config.require_signature,
    ) {
        SignatureCheck::Valid => {}
        SignatureCheck::Skipped => warn!("webhook_signature_not_supplied"),
        SignatureCheck::Invalid => {
            warn!("webhook_signature_invalid");
            return error_response(StatusCode::UNAUTHORIZED, "Invalid signature");
        }
    }

    let alert = match parse_alert(&body) {
        Ok(alert) => alert,
        Err(e) => {
            warn!(error = %e, "webhook_invalid_alert");
            return error_response(StatusCode::BAD_REQUEST, "Invalid alert data");
        }
    };

    info!(
        symbol = %alert.symbol,
        signal = %alert.signal,
        side = %alert.side,
        quantity = %alert.quantity,
        price = ?alert.price,
        order_type = ?alert.order_type,
        timestamp = %alert.timestamp.to_rfc3339(),
        "alert_received"
    );

    match state.submitter.submit_alert(&alert).await {
        Ok(order) => (
            StatusCode::OK,
            Json(WebhookResponse {
                status: "success",
                message: "Order placed successfully",
                order: Some(OrderBody {
                    success: true,
                    order,
                }),
                error: None,
            }),
        )
            .into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(WebhookResponse {
                status: "error",
                message: "Failed to place order",
                order: None,
                error: Some(e.to_string()),
            }),
        )
            .into_response(),
    }
}

// =============================================================================
// Unhandled errors
// =============================================================================

/// Convert a caught panic into a 500 carrying the panic message.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown error".to_string()
    };

    error!(error = %detail, "webhook_unhandled_error");

    error_response(StatusCode::INTERNAL_SERVER_ERROR, detail)
}
