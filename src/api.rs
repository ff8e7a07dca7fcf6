//! HTTP router for the relay
//!
//! ## Endpoint Map
//!
//! | Route      | Method | Description                              |
//! |------------|--------|------------------------------------------|
//! | `/health`  | GET    | Liveness probe                           |
//! | `/calls`   | POST   | Dispatch an outbound call                |
//! | `/webhook` | POST   | Provider call-event ingestion            |
//! | `/updates` | GET    | WebSocket subscription for live updates  |

use crate::dispatch::CallDispatcher;
use crate::error::Error;
use crate::prompt::TaskRequest;
use crate::updates::{self, SubscriberRegistry};
use crate::webhook;
use axum::http::{header, Method};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<CallDispatcher>,
    pub registry: Arc<SubscriberRegistry>,
}

/// Build the complete relay HTTP application.
pub fn build_app(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/calls", post(place_call))
        .route("/webhook", post(ingest_webhook))
        .route("/updates", get(updates::handle_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors(cors_origins))
        .with_state(state)
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(parsed)
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct CallResponse {
    message: String,
    vapi_response: Value,
}

/// `POST /calls` — render the prompt and dispatch one call to the provider.
async fn place_call(
    axum::extract::State(state): axum::extract::State<AppState>,
    Json(request): Json<TaskRequest>,
) -> Result<Json<CallResponse>, Error> {
    let result = state.dispatcher.dispatch(&request).await?;
    Ok(Json(CallResponse {
        message: "Call initiated successfully".to_string(),
        vapi_response: result.provider_response,
    }))
}

/// `POST /webhook` — best-effort ingestion of provider notifications.
///
/// Always acks with 200: the provider retries on anything else, and a
/// malformed payload is its problem to diagnose, not a delivery failure.
/// The raw body is parsed leniently so even non-JSON input gets an ack.
async fn ingest_webhook(
    axum::extract::State(state): axum::extract::State<AppState>,
    body: String,
) -> impl IntoResponse {
    let payload: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    if payload.is_null() && !body.trim().is_empty() {
        tracing::warn!(body_len = body.len(), "Webhook body is not valid JSON");
    }
    webhook::handle(&state.registry, payload).await;
    Json(serde_json::json!({ "message": "Webhook received" }))
}
