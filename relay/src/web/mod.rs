//! Web server module.
//!
//! Three routes:
//! - `GET /health` reports status and trading mode
//! - `GET /` reports static service metadata
//! - `POST /webhook` verifies, parses and relays an alert to the exchange

pub mod handlers;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

pub use handlers::{
    health, index, panic_response, webhook, AppState, ErrorResponse, HealthResponse,
    IndexResponse, WebhookResponse,
};
pub use signature::{check_signature, verify_webhook_signature, SignatureCheck, SIGNATURE_HEADER};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/webhook", post(webhook))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::tests::FakeExchange;
    use crate::web::signature::sign_body;
    use crate::Config;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    const SECRET: &str = "test-webhook-secret";

    fn test_config(require_signature: bool) -> Config {
        Config {
            port: 0,
            webhook_secret: SECRET.to_string(),
            require_signature,
            binance_api_key: None,
            binance_api_secret: None,
            testnet_mode: true,
            exchange_base_url: crate::config::TESTNET_BASE_URL.to_string(),
            exchange_timeout_ms: 1000,
            recv_window_ms: 5000,
        }
    }

    fn app_with(exchange: Arc<FakeExchange>, require_signature: bool) -> Router {
        router(AppState::new(test_config(require_signature), exchange))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_webhook(body: &str, signature: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/webhook");
        if let Some(sig) = signature {
            builder = builder.header(SIGNATURE_HEADER, sig);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app_with(Arc::new(FakeExchange::default()), false);
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let (status, json) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["mode"], "testnet");
    }

    #[tokio::test]
    async fn test_health_live_mode() {
        let mut config = test_config(false);
        config.testnet_mode = false;
        let app = router(AppState::new(config, Arc::new(FakeExchange::default())));
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let (_, json) = send(app, request).await;

        assert_eq!(json["mode"], "live");
    }

    #[tokio::test]
    async fn test_index() {
        let app = app_with(Arc::new(FakeExchange::default()), false);
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let (status, json) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["app"], "Trading Bot Webhook");
        assert_eq!(json["status"], "running");
        assert_eq!(json["testnet"], true);
        assert_eq!(json["webhook_url"], "/webhook");
        assert_eq!(json["health_check"], "/health");
    }

    #[tokio::test]
    async fn test_webhook_signed_order() {
        let exchange = Arc::new(FakeExchange::default());
        let body = r#"{"symbol":"BTC","side":"BUY","quantity":0.01}"#;
        let signature = sign_body(SECRET, body.as_bytes()).unwrap();

        let (status, json) = send(
            app_with(exchange.clone(), true),
            post_webhook(body, Some(&signature)),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "Order placed successfully");
        assert_eq!(json["order"]["success"], true);
        assert_eq!(json["order"]["order_id"], 12345);
        assert_eq!(json["order"]["symbol"], "BTCUSDT");
        assert_eq!(json["order"]["side"], "BUY");
        assert_eq!(json["order"]["quantity"], 0.01);
        assert_eq!(json["order"]["status"], "FILLED");
        assert_eq!(exchange.orders().len(), 1);
    }

    #[tokio::test]
    async fn test_webhook_bad_signature() {
        let exchange = Arc::new(FakeExchange::default());

        let (status, json) = send(
            app_with(exchange.clone(), false),
            post_webhook(r#"{"symbol":"BTC"}"#, Some("not-the-signature")),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "Invalid signature");
        assert!(exchange.orders().is_empty());
    }

    #[tokio::test]
    async fn test_webhook_signature_over_other_body() {
        let signature = sign_body(SECRET, br#"{"symbol":"BTC","quantity":0.01}"#).unwrap();

        let (status, _) = send(
            app_with(Arc::new(FakeExchange::default()), false),
            post_webhook(r#"{"symbol":"BTC","quantity":10}"#, Some(&signature)),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_webhook_unsigned_proceeds_by_default() {
        let exchange = Arc::new(FakeExchange::default());

        let (status, _) = send(
            app_with(exchange.clone(), false),
            post_webhook(r#"{"symbol":"BTC"}"#, None),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(exchange.orders().len(), 1);
    }

    #[tokio::test]
    async fn test_webhook_unsigned_rejected_when_required() {
        let exchange = Arc::new(FakeExchange::default());

        let (status, json) = send(
            app_with(exchange.clone(), true),
            post_webhook(r#"{"symbol":"BTC"}"#, None),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "Invalid signature");
        assert!(exchange.orders().is_empty());
    }

    #[tokio::test]
    async fn test_webhook_malformed_json() {
        let exchange = Arc::new(FakeExchange::default());

        let (status, json) = send(
            app_with(exchange.clone(), false),
            post_webhook("{symbol: BTC", None),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid alert data");
        assert!(exchange.orders().is_empty());
    }

    #[tokio::test]
    async fn test_webhook_non_numeric_quantity() {
        let (status, json) = send(
            app_with(Arc::new(FakeExchange::default()), false),
            post_webhook(r#"{"symbol":"BTC","quantity":"abc"}"#, None),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid alert data");
    }

    #[tokio::test]
    async fn test_webhook_null_fields_rejected() {
        for body in [
            r#"{"symbol":"BTC","quantity":null}"#,
            r#"{"symbol":null}"#,
        ] {
            let exchange = Arc::new(FakeExchange::default());

            let (status, json) = send(app_with(exchange.clone(), false), post_webhook(body, None)).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", body);
            assert_eq!(json["error"], "Invalid alert data");
            assert!(exchange.orders().is_empty());
        }
    }

    #[tokio::test]
    async fn test_webhook_double_encoded_body() {
        let exchange = Arc::new(FakeExchange::default());

        let (status, json) = send(
            app_with(exchange.clone(), false),
            post_webhook(r#""{\"symbol\":\"BTC\"}""#, None),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid alert data");
        assert!(exchange.orders().is_empty());
    }

    #[tokio::test]
    async fn test_webhook_unknown_type_key_places_market_order() {
        let exchange = Arc::new(FakeExchange::default());

        let (status, _) = send(
            app_with(exchange.clone(), false),
            post_webhook(r#"{"symbol":"BTC","type":"alert"}"#, None),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(exchange.orders()[0].kind, crate::exchange::OrderKind::Market);
    }

    #[tokio::test]
    async fn test_webhook_exchange_error() {
        let exchange = Arc::new(FakeExchange::rejecting("Account has insufficient balance"));

        let (status, json) = send(
            app_with(exchange, false),
            post_webhook(r#"{"symbol":"BINANCE:ETHUSDT","side":"SELL","quantity":0.5}"#, None),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Failed to place order");
        let error = json["error"].as_str().unwrap();
        assert!(!error.is_empty());
        assert!(error.contains("insufficient balance"));
    }

    #[tokio::test]
    async fn test_webhook_limit_without_price() {
        let (status, json) = send(
            app_with(Arc::new(FakeExchange::default()), false),
            post_webhook(r#"{"symbol":"BTC","order_type":"LIMIT"}"#, None),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid order type: LIMIT");
    }

    #[tokio::test]
    async fn test_webhook_unhandled_error() {
        let (status, json) = send(
            app_with(Arc::new(FakeExchange::panicking("exchange client exploded")), false),
            post_webhook(r#"{"symbol":"BTC"}"#, None),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "exchange client exploded");
    }
}
