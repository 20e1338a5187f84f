//! HTTP server: health check, Cloud API webhook and send relay, bridge events.
//!
//! Spawned as a background task by the gateway.

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use zapbot_channels::{BridgeChannel, BridgeEvent, CloudChannel, WebhookPayload};
use zapbot_core::config::ApiConfig;

/// Shared state for API handlers.
#[derive(Clone, Default)]
pub struct ApiState {
    pub cloud: Option<Arc<CloudChannel>>,
    pub bridge: Option<Arc<BridgeChannel>>,
}

/// `POST /send` body.
#[derive(Debug, Deserialize)]
struct SendRequest {
    to: String,
    message: String,
}

/// `GET /webhook` subscription handshake parameters.
#[derive(Debug, Deserialize)]
struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

type ApiError = (StatusCode, Json<Value>);

/// `GET /`: health check.
async fn health() -> Json<Value> {
    Json(json!({
        "code": 200,
        "message": "Server is online",
    }))
}

/// `POST /send`: relay a text message through the Cloud API.
async fn send(
    State(state): State<ApiState>,
    body: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "error": format!("invalid request: {e}")})),
        )
    })?;

    let cloud = state.cloud.as_ref().ok_or((
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({"success": false, "error": "Cloud API channel not configured"})),
    ))?;

    match cloud.send_text(&request.to, &request.message).await {
        Ok(data) => {
            info!("send relay delivered to {}", request.to);
            Ok(Json(json!({"success": true, "data": data})))
        }
        Err(e) => {
            error!("send relay to {} failed: {e}", request.to);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "error": e.to_string()})),
            ))
        }
    }
}

/// `GET /webhook`: echo `hub.challenge` when the verify token matches.
async fn verify_webhook(
    State(state): State<ApiState>,
    Query(query): Query<VerifyQuery>,
) -> (StatusCode, String) {
    let verified = state.cloud.as_ref().is_some_and(|cloud| {
        cloud.verify_subscription(query.mode.as_deref(), query.token.as_deref())
    });

    if verified {
        info!("webhook subscription verified");
        (StatusCode::OK, query.challenge.unwrap_or_default())
    } else {
        warn!("webhook verification refused (mode={:?})", query.mode);
        (StatusCode::FORBIDDEN, "Forbidden".to_string())
    }
}

/// `POST /webhook`: Cloud API notifications. Always acknowledged.
async fn receive_webhook(State(state): State<ApiState>, body: Bytes) -> (StatusCode, &'static str) {
    match serde_json::from_slice::<WebhookPayload>(&body) {
        Ok(payload) => match state.cloud.as_ref() {
            Some(cloud) => {
                cloud.ingest(payload).await;
            }
            None => debug!("webhook event ignored: Cloud API channel not configured"),
        },
        Err(e) => debug!("webhook event is not a message notification: {e}"),
    }
    (StatusCode::OK, "EVENT_RECEIVED")
}

/// `POST /message`: chat event from the WhatsApp-Web bridge.
async fn receive_bridge_event(
    State(state): State<ApiState>,
    body: Result<Json<BridgeEvent>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(event) = body.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": format!("invalid event: {e}")})),
        )
    })?;

    let bridge = state.bridge.as_ref().ok_or((
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({"error": "bridge channel not configured"})),
    ))?;

    if !bridge.ingest(event).await {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "gateway unavailable"})),
        ));
    }
    Ok((StatusCode::ACCEPTED, Json(json!({"status": "queued"}))))
}

async fn log_request(request: Request, next: Next) -> Response {
    debug!("{} {}", request.method(), request.uri());
    next.run(request).await
}

/// Build the axum router with shared state.
fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/send", post(send))
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .route("/message", post(receive_bridge_event))
        .layer(middleware::from_fn(log_request))
        .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024))
        .with_state(state)
}

/// Start the API server. Called from `Gateway::run()`.
pub async fn serve(config: ApiConfig, state: ApiState) {
    let app = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("API server failed to bind to {addr}: {e}");
            return;
        }
    };

    info!("API server listening on {addr}");

    if let Err(e) = axum::serve(listener, app).await {
        error!("API server error: {e}");
    }
}
