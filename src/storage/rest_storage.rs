//! REST client for the GMUD backend.
//!
//! Wraps the `/cards` and `/approvers` resources using [`reqwest`]. Each
//! request carries the session's bearer token; nothing is stored on the
//! client between calls.

use crate::{
    config::ClientConfig,
    domain::{
        Approver, ApproverId, ApproverPatch, Card, CardId, CardPatch, NewApprover, NewCard, Stage,
    },
    error::{BoardError, Result},
    session::Session,
    storage::Storage,
};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

/// Resource a request addresses, used to name what was not found on a 404
#[derive(Debug, Clone)]
pub(crate) enum Resource {
    Card(String),
    Approver(String),
    Other,
}

/// HTTP storage backed by the GMUD REST API
#[derive(Debug, Clone)]
pub struct RestStorage {
    client: reqwest::Client,
    api_url: String,
}

impl RestStorage {
    /// Creates a client for `api_url`, e.g. `http://localhost:3000`
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Creates a client reusing an existing [`reqwest::Client`]
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::with_client(config.http_client()?, config.api_url.clone()))
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn request(&self, session: &Session, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_url, path))
            .bearer_auth(session.token())
    }
}

/// Maps non-2xx responses onto the error taxonomy
pub(crate) async fn ensure_success(response: Response, resource: Resource) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());

    Err(match (status, resource) {
        (StatusCode::UNAUTHORIZED, _) => BoardError::Unauthorized,
        (StatusCode::FORBIDDEN, _) => BoardError::Forbidden(body),
        (StatusCode::NOT_FOUND, Resource::Card(id)) => BoardError::CardNotFound(id),
        (StatusCode::NOT_FOUND, Resource::Approver(id)) => BoardError::ApproverNotFound(id),
        _ => BoardError::ApiError {
            status: status.as_u16(),
            body,
        },
    })
}

/// Parses a successful JSON response body into the expected type
pub(crate) async fn parse_response<T: DeserializeOwned>(
    response: Response,
    resource: Resource,
) -> Result<T> {
    let response = ensure_success(response, resource).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl Storage for RestStorage {
    async fn list_cards(&self, session: &Session) -> Result<Vec<Card>> {
        let response = self.request(session, Method::GET, "/cards").send().await?;
        parse_response(response, Resource::Other).await
    }

    async fn list_cards_by_status(&self, session: &Session, stage: Stage) -> Result<Vec<Card>> {
        let response = self
            .request(session, Method::GET, "/cards")
            .query(&[("status", stage.id())])
            .send()
            .await?;
        parse_response(response, Resource::Other).await
    }

    async fn get_card(&self, session: &Session, id: &CardId) -> Result<Card> {
        let response = self
            .request(session, Method::GET, &format!("/cards/{}", id))
            .send()
            .await?;
        parse_response(response, Resource::Card(id.to_string())).await
    }

    async fn create_card(&self, session: &Session, card: &NewCard) -> Result<Card> {
        let response = self
            .request(session, Method::POST, "/cards")
            .json(card)
            .send()
            .await?;
        parse_response(response, Resource::Other).await
    }

    async fn update_card(&self, session: &Session, id: &CardId, patch: &CardPatch) -> Result<Card> {
        let response = self
            .request(session, Method::PATCH, &format!("/cards/{}", id))
            .json(patch)
            .send()
            .await?;
        parse_response(response, Resource::Card(id.to_string())).await
    }

    async fn update_card_status(&self, session: &Session, id: &CardId, stage: Stage) -> Result<Card> {
        let response = self
            .request(session, Method::PATCH, &format!("/cards/{}/status", id))
            .json(&serde_json::json!({ "status": stage }))
            .send()
            .await?;
        parse_response(response, Resource::Card(id.to_string())).await
    }

    async fn delete_card(&self, session: &Session, id: &CardId) -> Result<()> {
        let response = self
            .request(session, Method::DELETE, &format!("/cards/{}", id))
            .send()
            .await?;
        ensure_success(response, Resource::Card(id.to_string())).await?;
        Ok(())
    }

    async fn list_approvers(&self, session: &Session) -> Result<Vec<Approver>> {
        let response = self.request(session, Method::GET, "/approvers").send().await?;
        parse_response(response, Resource::Other).await
    }

    async fn get_approver(&self, session: &Session, id: &ApproverId) -> Result<Approver> {
        let response = self
            .request(session, Method::GET, &format!("/approvers/{}", id))
            .send()
            .await?;
        parse_response(response, Resource::Approver(id.to_string())).await
    }

    async fn create_approver(&self, session: &Session, approver: &NewApprover) -> Result<Approver> {
        let response = self
            .request(session, Method::POST, "/approvers")
            .json(approver)
            .send()
            .await?;
        parse_response(response, Resource::Other).await
    }

    async fn update_approver(
        &self,
        session: &Session,
        id: &ApproverId,
        patch: &ApproverPatch,
    ) -> Result<Approver> {
        let response = self
            .request(session, Method::PATCH, &format!("/approvers/{}", id))
            .json(patch)
            .send()
            .await?;
        parse_response(response, Resource::Approver(id.to_string())).await
    }

    async fn delete_approver(&self, session: &Session, id: &ApproverId) -> Result<()> {
        let response = self
            .request(session, Method::DELETE, &format!("/approvers/{}", id))
            .send()
            .await?;
        ensure_success(response, Resource::Approver(id.to_string())).await?;
        Ok(())
    }
}
