//! Typed client for the ops platform backend
//!
//! One [`ApiClient`] owns the HTTP connection pool and the session store;
//! [`AuthApi`], [`ResourceApi`] and [`MonitoringApi`] borrow it and map each
//! backend endpoint to a method. The session token, when present, is sent as
//! a bearer credential on every request.

mod auth;
mod monitoring;
mod resources;
pub mod types;

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

pub use auth::AuthApi;
pub use monitoring::{DEFAULT_STEP, MonitoringApi, ResourceMetric, escape_label_value, history_query};
pub use resources::ResourceApi;

use crate::config::ApiConfig;
use crate::session::{SessionStore, readable_token};
use crate::{Error, Result};

/// Shared backend client
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Build a client for `config.base_url`, reading tokens from `session`
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is malformed or the HTTP client
    /// cannot be built.
    pub fn new(config: &ApiConfig, session: Arc<dyn SessionStore>) -> Result<Self> {
        let base = url::Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("api.base_url: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("ops-console/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base.as_str().trim_end_matches('/').to_string(),
            session,
        })
    }

    /// Authentication endpoints
    #[must_use]
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    /// Resource inventory endpoints
    #[must_use]
    pub fn resources(&self) -> ResourceApi<'_> {
        ResourceApi::new(self)
    }

    /// Monitoring and time-series endpoints
    #[must_use]
    pub fn monitoring(&self) -> MonitoringApi<'_> {
        MonitoringApi::new(self)
    }

    /// Session store backing this client
    #[must_use]
    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    /// Base URL without trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Start a request, attaching the bearer token when a readable session exists
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(method = %method, path = %path, "API request");
        let builder = self.http.request(method, self.url(path));
        match readable_token(self.session.as_ref()) {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and decode a JSON response body
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = Self::check(builder.send().await?).await?;
        Ok(response.json().await?)
    }

    /// Send and discard the response body
    pub(crate) async fn send_discard(&self, builder: RequestBuilder) -> Result<()> {
        Self::check(builder.send().await?).await?;
        Ok(())
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = extract_detail(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        debug!(status = %status, detail = %detail, "API request failed");

        if status == StatusCode::UNAUTHORIZED {
            Err(Error::Unauthorized(detail))
        } else {
            Err(Error::api(status, detail))
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"detail": "..."}` and validation lists of the form
/// `{"detail": [{"msg": "..."}]}`; anything else non-empty is returned as is.
fn extract_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        return Some(trimmed.to_string());
    };

    match value.get("detail") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Array(items)) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if msgs.is_empty() {
                Some(Value::Array(items.clone()).to_string())
            } else {
                Some(msgs.join("; "))
            }
        }
        Some(other) => Some(other.to_string()),
        None => Some(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;

    #[test]
    fn test_extract_detail() {
        assert_eq!(extract_detail(""), None);
        assert_eq!(
            extract_detail(r#"{"detail": "Resource not found"}"#).as_deref(),
            Some("Resource not found")
        );
        assert_eq!(
            extract_detail(r#"{"detail": [{"loc": ["body", "name"], "msg": "field required"}, {"msg": "bad type"}]}"#)
                .as_deref(),
            Some("field required; bad type")
        );
        assert_eq!(extract_detail("upstream down").as_deref(), Some("upstream down"));
    }

    #[test]
    fn test_url_join() {
        let config = ApiConfig {
            base_url: "http://localhost:8000/api/v1/".into(),
            ..ApiConfig::default()
        };
        let client = ApiClient::new(&config, Arc::new(MemorySessionStore::new())).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api/v1");
        assert_eq!(
            client.url("/resources/7"),
            "http://localhost:8000/api/v1/resources/7"
        );
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let config = ApiConfig {
            base_url: "::nope".into(),
            ..ApiConfig::default()
        };
        assert!(matches!(
            ApiClient::new(&config, Arc::new(MemorySessionStore::new())),
            Err(Error::Config(_))
        ));
    }
}
