//! Request forwarding to the backend origin

use axum::{
    Json,
    body::{Body, Bytes},
    http::{HeaderMap, HeaderName, Request, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use serde_json::json;
use tracing::{debug, warn};

use super::router::AppState;
use crate::{Error, Result};

/// Headers scoped to a single connection; never forwarded
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Whether `path` falls under `prefix` on a segment boundary
#[must_use]
pub fn matches_prefix(prefix: &str, path: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    // Headers named in `Connection` are hop-by-hop too
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    for name in &named {
        headers.remove(name);
    }
}

/// Forward `request` unchanged (identity path rewrite) to the configured target
pub(crate) async fn forward(state: &AppState, request: Request<Body>) -> Result<Response> {
    let (parts, body) = request.into_parts();
    let path_and_query = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
    let url = format!("{}{path_and_query}", state.target);

    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);
    if state.change_origin {
        // reqwest fills in Host from the target URL
        headers.remove(header::HOST);
    }

    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > state.max_body_size) {
        return Err(Error::PayloadTooLarge {
            limit: state.max_body_size,
        });
    }
    let body = read_body(body, state.max_body_size).await?;

    debug!(method = %parts.method, url = %url, bytes = body.len(), "Forwarding request");

    let upstream = state
        .client
        .request(parts.method, &url)
        .headers(headers)
        .body(body)
        .send()
        .await?;

    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_by_hop(&mut headers);

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

/// Buffer a request body, failing once it grows past `limit` bytes
async fn read_body(body: Body, limit: usize) -> Result<Bytes> {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| Error::InvalidInput(format!("failed to read request body: {e}")))?;
        if buf.len() + chunk.len() > limit {
            return Err(Error::PayloadTooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(Bytes::from(buf))
}

/// Map a forwarding failure to an error response (502, 504 on timeout, 413 on oversized bodies)
pub(crate) fn error_response(target: &str, err: &Error) -> Response {
    let status = match err {
        Error::Http(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
        Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
    };
    warn!(target = %target, error = %err, status = %status, "Upstream request failed");
    (
        status,
        Json(json!({
            "error": status.canonical_reason().unwrap_or("upstream error"),
            "target": target,
            "detail": err.to_string(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_matches_prefix() {
        assert!(matches_prefix("/api", "/api"));
        assert!(matches_prefix("/api", "/api/v1/resources"));
        assert!(matches_prefix("/api/", "/api/v1"));
        assert!(!matches_prefix("/api", "/apix"));
        assert!(!matches_prefix("/api", "/dashboard"));
        assert!(matches_prefix("/", "/anything"));
    }

    #[tokio::test]
    async fn test_read_body_limit() {
        let body = read_body(Body::from("0123456789"), 10).await.unwrap();
        assert_eq!(body.len(), 10);

        let err = read_body(Body::from("0123456789a"), 10).await.unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge { limit: 10 }));
        assert_eq!(
            error_response("http://backend", &err).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-session-hint"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-session-hint", HeaderValue::from_static("1"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 2);
        assert!(headers.contains_key(header::AUTHORIZATION));
        assert!(headers.contains_key(header::CONTENT_TYPE));
    }
}
