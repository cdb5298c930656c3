use axum::body::to_bytes;
use axum::extract::{Path, Request, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde_json::json;
use tracing::{error, info};

use crate::gateway::relay;
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;
use crate::server::server::AppState;

static BUFFERED_MSG: &str = "buffered";
static STREAMING_MSG: &str = "streaming";
static CREDENTIAL_MSG: &str = "credential";
static REQUEST_BODY_MSG: &str = "request_body";
static UPSTREAM_MSG: &str = "upstream";

/// Credential probe. Exercises the cache path without proxying anything.
pub async fn health(State(state): State<AppState>) -> Response {
    match state.token_manager.acquire_token().await {
        Ok(_) => Json(json!({"status": "healthy", "token": "valid"})).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"status": "unhealthy", "error": e.to_string()})),
        )
            .into_response(),
    }
}

/// Forward one inbound request to the configured Vertex AI endpoint.
pub async fn proxy(
    State(state): State<AppState>,
    Path(path): Path<String>,
    req: Request,
) -> Response {
    let metrics = get_metrics().await;
    let start = get_instant();

    let token = match state.token_manager.acquire_token().await {
        Ok(token) => token,
        Err(e) => {
            metrics
                .proxy_failures
                .with_label_values(&[CREDENTIAL_MSG])
                .inc();
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("credential acquisition failed: {e}")})),
            )
                .into_response();
        }
    };

    let url = state.upstream.url_for(&path);

    // body is read eagerly: needed both for the stream-flag inspection and
    // for forwarding
    let (parts, body) = req.into_parts();
    let body = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            metrics
                .proxy_failures
                .with_label_values(&[REQUEST_BODY_MSG])
                .inc();
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": format!("failed to read request body: {e}")})),
            )
                .into_response();
        }
    };

    let streaming = relay::wants_streaming(&parts.method, &body);
    let mode = if streaming { STREAMING_MSG } else { BUFFERED_MSG };
    info!("proxying {} {} ({})", parts.method, path, mode);
    metrics
        .proxy_requests
        .with_label_values(&[parts.method.as_str(), mode])
        .inc();

    let headers = relay::forwardable_headers(&parts.headers);
    let result = if streaming {
        relay::relay_streaming(&state.client, parts.method, &url, headers, &token, body).await
    } else {
        relay::relay_buffered(&state.client, parts.method, &url, headers, &token, body).await
    };

    metrics
        .proxy_request_duration
        .with_label_values(&[mode])
        .observe(start.elapsed().as_secs_f64());

    match result {
        Ok(response) => response,
        Err(e) => {
            metrics
                .proxy_failures
                .with_label_values(&[UPSTREAM_MSG])
                .inc();
            error!("relay for {} failed: {e:#}", url);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    }
}
