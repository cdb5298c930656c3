/// Relay module
///
/// Decides the relay mode for a request and performs the upstream exchange:
/// buffered (full body awaited, JSON re-serialized) or streaming (chunks
/// forwarded as they arrive).
use anyhow::{Context, Result};
use axum::body::{Body, Bytes};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::{header, HeaderMap, Method, StatusCode};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::error;

use crate::observability::metrics::get_metrics;
use crate::utils::constants::EVENT_STREAM_CONTENT_TYPE;

static UPSTREAM_STATUS_MSG: &str = "upstream_status";
static UPSTREAM_JSON_MSG: &str = "upstream_json";

/// Decide the relay mode from the inbound request.
///
/// Best-effort inspection only: bodies that fail to parse as JSON, or that
/// carry no boolean `stream` field, select buffered mode and are still
/// forwarded unexamined.
pub fn wants_streaming(method: &Method, body: &[u8]) -> bool {
    if !(method == Method::POST || method == Method::PUT) || body.is_empty() {
        return false;
    }
    serde_json::from_slice::<Value>(body)
        .ok()
        .as_ref()
        .and_then(|request_json| request_json.get("stream"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Inbound headers forwarded upstream, minus hop-by-hop headers and the
/// fields the proxy owns (host, content-length, authorization).
pub fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::new();
    for (name, value) in headers {
        if is_dropped_header(name.as_str()) {
            continue;
        }
        forwarded.append(name.clone(), value.clone());
    }
    forwarded
}

fn is_dropped_header(name: &str) -> bool {
    name.eq_ignore_ascii_case("connection")
        || name.eq_ignore_ascii_case("keep-alive")
        || name.eq_ignore_ascii_case("transfer-encoding")
        || name.eq_ignore_ascii_case("upgrade")
        || name.eq_ignore_ascii_case("host")
        || name.eq_ignore_ascii_case("content-length")
        || name.eq_ignore_ascii_case("authorization")
}

async fn send_upstream(
    client: &Client,
    method: Method,
    url: &str,
    headers: HeaderMap,
    token: &str,
    body: Bytes,
) -> Result<reqwest::Response> {
    client
        .request(method, url)
        .headers(headers)
        .bearer_auth(token)
        .body(body)
        .send()
        .await
        .context("upstream request failed")
}

/// Forward the request and relay the response chunk-for-chunk.
///
/// The upstream status is propagated by starting the stream; dropping the
/// returned body (client disconnect) drops the upstream stream and releases
/// its connection.
pub async fn relay_streaming(
    client: &Client,
    method: Method,
    url: &str,
    headers: HeaderMap,
    token: &str,
    body: Bytes,
) -> Result<Response> {
    let upstream = send_upstream(client, method, url, headers, token, body).await?;

    let response = Response::builder()
        .status(upstream.status())
        .header(header::CONTENT_TYPE, EVENT_STREAM_CONTENT_TYPE)
        .body(Body::from_stream(upstream.bytes_stream()))?;
    Ok(response)
}

/// Forward the request, await the full response, then hand it back:
/// non-2xx as a structured error, JSON re-parsed, anything else verbatim.
pub async fn relay_buffered(
    client: &Client,
    method: Method,
    url: &str,
    headers: HeaderMap,
    token: &str,
    body: Bytes,
) -> Result<Response> {
    let upstream = send_upstream(client, method, url, headers, token, body).await?;

    let status = upstream.status();
    let response_headers = upstream.headers().clone();
    let response_body = upstream
        .bytes()
        .await
        .context("reading upstream response body failed")?;

    if !status.is_success() {
        let metrics = get_metrics().await;
        metrics
            .proxy_failures
            .with_label_values(&[UPSTREAM_STATUS_MSG])
            .inc();
        let detail = String::from_utf8_lossy(&response_body).into_owned();
        return Ok((
            status,
            Json(json!({"error": {"status": status.as_u16(), "detail": detail}})),
        )
            .into_response());
    }

    let content_type = response_headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if content_type.contains("application/json") {
        return Ok(match serde_json::from_slice::<Value>(&response_body) {
            Ok(parsed) => (status, Json(parsed)).into_response(),
            Err(e) => {
                error!("Failed to parse JSON: {e}");
                let metrics = get_metrics().await;
                metrics
                    .proxy_failures
                    .with_label_values(&[UPSTREAM_JSON_MSG])
                    .inc();
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({"error": "invalid JSON response from upstream server"})),
                )
                    .into_response()
            }
        });
    }

    let mut response = Response::builder().status(status);
    for (name, value) in &response_headers {
        let name_str = name.as_str();
        if name_str.eq_ignore_ascii_case("transfer-encoding")
            || name_str.eq_ignore_ascii_case("connection")
            || name_str.eq_ignore_ascii_case("content-length")
        {
            continue;
        }
        response = response.header(name, value);
    }
    Ok(response.body(Body::from(response_body))?)
}
