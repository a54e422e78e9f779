//! Client for the backend's auth endpoints.
//!
//! Produces [`Session`] values; it keeps no token state of its own.

use crate::{
    config::ClientConfig,
    error::Result,
    session::{Credentials, GoogleProfile, Session, User},
    storage::rest_storage::{parse_response, Resource},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    user: User,
}

impl From<LoginResponse> for Session {
    fn from(response: LoginResponse) -> Self {
        Session::new(response.access_token, response.user)
    }
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    client: reqwest::Client,
    api_url: String,
}

impl AuthClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::with_client(config.http_client()?, config.api_url.clone()))
    }

    /// Username/password login via `POST /auth/login`
    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        let response = self
            .client
            .post(format!("{}/auth/login", self.api_url))
            .json(credentials)
            .send()
            .await?;

        let login: LoginResponse = parse_response(response, Resource::Other).await?;
        tracing::info!(username = %login.user.username, "Logged in");
        Ok(login.into())
    }

    /// Exchanges a verified Google profile for a session via `POST /auth/google/login`
    pub async fn google_login(&self, profile: &GoogleProfile) -> Result<Session> {
        let response = self
            .client
            .post(format!("{}/auth/google/login", self.api_url))
            .json(profile)
            .send()
            .await?;

        let login: LoginResponse = parse_response(response, Resource::Other).await?;
        tracing::info!(email = %profile.email, "Logged in with Google");
        Ok(login.into())
    }

    /// Fetches the profile behind `token` via `GET /auth/profile`
    pub async fn profile(&self, token: &str) -> Result<User> {
        let response = self
            .client
            .get(format!("{}/auth/profile", self.api_url))
            .bearer_auth(token)
            .send()
            .await?;

        parse_response(response, Resource::Other).await
    }

    /// Rebuilds a session from a stored token. An expired token yields
    /// `Unauthorized` and the caller should discard it.
    pub async fn restore(&self, token: impl Into<String>) -> Result<Session> {
        let token = token.into();
        let user = self.profile(&token).await.inspect_err(|e| {
            tracing::warn!(error = %e, "Stored session is no longer valid");
        })?;
        Ok(Session::new(token, user))
    }

    /// Ends the session; the token is dropped with it
    pub fn logout(&self, session: Session) {
        tracing::info!(username = %session.user().username, "Logged out");
        drop(session);
    }
}
