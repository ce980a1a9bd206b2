//! Authentication endpoints
//!
//! Login and logout are the only places the session token is written.

use reqwest::Method;
use reqwest::multipart::Form;
use tracing::{info, warn};

use super::ApiClient;
use super::types::{LoginCredentials, RegisterData, TokenResponse, User};
use crate::Result;
use crate::session::StoredSession;

/// `/auth/*` endpoints
#[derive(Debug, Clone, Copy)]
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(super) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Exchange credentials for a token and persist it.
    ///
    /// The backend expects a multipart form with `username` and `password`.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<TokenResponse> {
        let form = Form::new()
            .text("username", credentials.username.clone())
            .text("password", credentials.password.clone());

        let builder = self.client.request(Method::POST, "/auth/login").multipart(form);
        let token: TokenResponse = self.client.send_json(builder).await?;

        self.client.session().store(StoredSession::new(
            token.access_token.clone(),
            Some(credentials.username.clone()),
        ))?;
        info!(username = %credentials.username, "Logged in");
        Ok(token)
    }

    /// Create an account
    pub async fn register(&self, data: &RegisterData) -> Result<User> {
        let builder = self.client.request(Method::POST, "/auth/register").json(data);
        self.client.send_json(builder).await
    }

    /// Profile of the account owning the current token
    pub async fn current_user(&self) -> Result<User> {
        let builder = self.client.request(Method::GET, "/auth/me");
        self.client.send_json(builder).await
    }

    /// End the session.
    ///
    /// The local token is removed even when the backend call fails; the
    /// backend error is still returned.
    pub async fn logout(&self) -> Result<()> {
        let builder = self.client.request(Method::POST, "/auth/logout");
        let remote = self.client.send_discard(builder).await;

        self.client.session().clear()?;

        if let Err(ref e) = remote {
            warn!(error = %e, "Backend logout failed, local session cleared anyway");
        } else {
            info!("Logged out");
        }
        remote
    }
}
