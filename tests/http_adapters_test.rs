//! HTTP Adapter Tests - Real Requests Against a Local axum Server
//!
//! Exercises `HttpQuoteSource` and `TelegramSink` over the shared reqwest
//! client: status mapping, timeout classification, connection failures,
//! and Bot API request/response handling.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use ton_price_publisher::adapters::http::HttpContext;
use ton_price_publisher::adapters::sources::{HttpQuoteSource, QuoteSchema};
use ton_price_publisher::adapters::telegram::TelegramSink;
use ton_price_publisher::ports::notifier::{NotificationSink, PublishError, RenderMode};
use ton_price_publisher::ports::quote_source::{QuoteSource, SourceUnavailable};
use ton_price_publisher::ports::telemetry::NoopTelemetry;
use ton_price_publisher::usecases::source_chain::QuoteSourceChain;

const KUCOIN_BODY: &str =
    r#"{"code":"200000","data":{"time":1715949000000,"sequence":"1","price":"2.35189"}}"#;

/// Bind on an ephemeral port, serve `app` in the background, return the base URL.
async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn quote_routes() -> Router {
    Router::new()
        .route("/down", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                KUCOIN_BODY
            }),
        )
        .route("/kucoin", get(|| async { KUCOIN_BODY }))
        .route(
            "/rejected",
            get(|| async { r#"{"code":"400100","msg":"symbol not exists"}"# }),
        )
}

fn http() -> Arc<HttpContext> {
    Arc::new(HttpContext::new("ton-price-publisher-test", Duration::from_secs(1)))
}

fn kucoin_source(name: &str, priority: u32, url: String, http: &Arc<HttpContext>) -> HttpQuoteSource {
    HttpQuoteSource::new(name, priority, url, QuoteSchema::Kucoin, Arc::clone(http))
}

// ---- Quote source ----

#[tokio::test]
async fn test_server_error_becomes_bad_status() {
    let base = spawn_server(quote_routes()).await;
    let source = kucoin_source("kucoin", 1, format!("{base}/down"), &http());

    let err = source.fetch(Duration::from_secs(2)).await.unwrap_err();
    assert_eq!(err, SourceUnavailable::BadStatus(500));
}

#[tokio::test]
async fn test_slow_response_becomes_timeout() {
    let base = spawn_server(quote_routes()).await;
    let source = kucoin_source("kucoin", 1, format!("{base}/slow"), &http());

    let err = source.fetch(Duration::from_millis(200)).await.unwrap_err();
    assert_eq!(err, SourceUnavailable::Timeout(Duration::from_millis(200)));
}

#[tokio::test]
async fn test_refused_connection_becomes_transport() {
    // Grab a free port, then close it so nothing listens there.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = kucoin_source("kucoin", 1, format!("http://{addr}/kucoin"), &http());
    let err = source.fetch(Duration::from_secs(2)).await.unwrap_err();
    assert!(matches!(err, SourceUnavailable::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn test_valid_body_yields_sample() {
    let base = spawn_server(quote_routes()).await;
    let source = kucoin_source("kucoin", 1, format!("{base}/kucoin"), &http());

    let sample = source.fetch(Duration::from_secs(2)).await.unwrap();
    assert_eq!(sample.value(), dec!(2.35189));
    assert_eq!(sample.source_name(), "kucoin");
    assert_eq!(sample.display_value().to_string(), "2.351");
}

#[tokio::test]
async fn test_provider_error_code_is_rejected() {
    let base = spawn_server(quote_routes()).await;
    let source = kucoin_source("kucoin", 1, format!("{base}/rejected"), &http());

    let err = source.fetch(Duration::from_secs(2)).await.unwrap_err();
    assert_eq!(err, SourceUnavailable::Rejected("400100".to_string()));
}

#[tokio::test]
async fn test_chain_over_http_falls_through_failing_sources() {
    let base = spawn_server(quote_routes()).await;
    let http = http();
    let sources: Vec<Arc<dyn QuoteSource>> = vec![
        Arc::new(kucoin_source("a", 1, format!("{base}/down"), &http)),
        Arc::new(kucoin_source("b", 2, format!("{base}/down"), &http)),
        Arc::new(kucoin_source("c", 3, format!("{base}/kucoin"), &http)),
    ];
    let chain = QuoteSourceChain::new(sources, Arc::new(NoopTelemetry));

    let sample = chain.try_all(Duration::from_secs(2)).await.unwrap();
    assert_eq!(sample.source_name(), "c");
    assert!(http.is_initialized());
}

#[tokio::test]
async fn test_chain_over_http_all_server_errors() {
    let base = spawn_server(quote_routes()).await;
    let http = http();
    let sources: Vec<Arc<dyn QuoteSource>> = vec![
        Arc::new(kucoin_source("a", 1, format!("{base}/down"), &http)),
        Arc::new(kucoin_source("b", 2, format!("{base}/down"), &http)),
    ];
    let chain = QuoteSourceChain::new(sources, Arc::new(NoopTelemetry));

    let err = chain.try_all(Duration::from_secs(2)).await.unwrap_err();
    assert_eq!(
        err.failures,
        vec![
            ("a".to_string(), SourceUnavailable::BadStatus(500)),
            ("b".to_string(), SourceUnavailable::BadStatus(500)),
        ]
    );
}

// ---- Telegram sink ----

type Received = Arc<Mutex<Vec<Value>>>;

fn telegram_routes(received: Received) -> Router {
    Router::new()
        .route(
            "/botGOOD/sendMessage",
            post(
                |State(received): State<Received>, Json(body): Json<Value>| async move {
                    let chat_not_found = body["chat_id"] == "@missing";
                    received.lock().unwrap().push(body);
                    if chat_not_found {
                        (
                            StatusCode::BAD_REQUEST,
                            Json(json!({
                                "ok": false,
                                "error_code": 400,
                                "description": "Bad Request: chat not found"
                            })),
                        )
                    } else {
                        (
                            StatusCode::OK,
                            Json(json!({
                                "ok": true,
                                "result": { "message_id": 7, "chat": { "id": -100 } }
                            })),
                        )
                    }
                },
            ),
        )
        .route(
            "/botGOOD/getMe",
            get(|| async {
                Json(json!({
                    "ok": true,
                    "result": { "id": 1, "is_bot": true, "first_name": "Ton", "username": "tonpricebot" }
                }))
            }),
        )
        .route(
            "/botBAD/sendMessage",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "ok": false, "error_code": 401, "description": "Unauthorized" })),
                )
            }),
        )
        .with_state(received)
}

fn sink(base: &str, token: &str) -> TelegramSink {
    TelegramSink::new(http(), base, token, Duration::from_secs(2))
}

#[tokio::test]
async fn test_send_posts_html_message_to_channel() {
    let received: Received = Arc::default();
    let base = spawn_server(telegram_routes(Arc::clone(&received))).await;

    sink(&base, "GOOD")
        .send("@tonprice", "<b>2.351 $</b>", RenderMode::Html)
        .await
        .unwrap();

    let bodies = received.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["chat_id"], "@tonprice");
    assert_eq!(bodies[0]["text"], "<b>2.351 $</b>");
    assert_eq!(bodies[0]["parse_mode"], "HTML");
}

#[tokio::test]
async fn test_send_plain_omits_parse_mode() {
    let received: Received = Arc::default();
    let base = spawn_server(telegram_routes(Arc::clone(&received))).await;

    sink(&base, "GOOD")
        .send("@tonprice", "2.351 $", RenderMode::Plain)
        .await
        .unwrap();

    let bodies = received.lock().unwrap();
    assert!(bodies[0].get("parse_mode").is_none());
}

#[tokio::test]
async fn test_send_unknown_chat_is_invalid_channel() {
    let received: Received = Arc::default();
    let base = spawn_server(telegram_routes(received)).await;

    let err = sink(&base, "GOOD")
        .send("@missing", "<b>2.351 $</b>", RenderMode::Html)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PublishError::InvalidChannel { ref channel, .. } if channel == "@missing"
    ));
}

#[tokio::test]
async fn test_send_with_rejected_token_is_unauthorized() {
    let base = spawn_server(telegram_routes(Arc::default())).await;

    let err = sink(&base, "BAD")
        .send("@tonprice", "<b>2.351 $</b>", RenderMode::Html)
        .await
        .unwrap_err();
    assert_eq!(err, PublishError::Unauthorized("Unauthorized".to_string()));
}

#[tokio::test]
async fn test_get_me_reads_username() {
    let base = spawn_server(telegram_routes(Arc::default())).await;

    let me = sink(&base, "GOOD").get_me().await.unwrap();
    assert!(me.is_bot);
    assert_eq!(me.username.as_deref(), Some("tonpricebot"));
}

#[tokio::test]
async fn test_transport_error_never_leaks_token() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = sink(&format!("http://{addr}"), "SECRET_TOKEN")
        .send("@tonprice", "<b>2.351 $</b>", RenderMode::Html)
        .await
        .unwrap_err();
    assert!(matches!(err, PublishError::Transport(_)));
    assert!(!err.to_string().contains("SECRET_TOKEN"));
}
