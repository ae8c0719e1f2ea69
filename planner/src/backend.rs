//! Client for the collection backend: pickup points and route persistence.

use std::{future::Future, time::Duration};

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    ApiMessage, DraftRoute, PersistedRoute, PickupPoint, PickupPointsEnvelope, RouteEnvelope,
    RoutesEnvelope,
};

use crate::error::{PlannerError, Result};

/// Backend answer to a duplicate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateStatus {
    Unique,
    Conflict { message: String },
}

pub trait PickupPointSource: Send + Sync + 'static {
    fn get_all(&self) -> impl Future<Output = Result<Vec<PickupPoint>>> + Send;
}

pub trait RouteStore: Send + Sync + 'static {
    fn create(&self, draft: &DraftRoute) -> impl Future<Output = Result<RouteEnvelope>> + Send;

    /// Only 200 and 409 are verdicts; every other status is an error.
    fn check_duplicate(&self, ids: &[String]) -> impl Future<Output = Result<DuplicateStatus>> + Send;

    fn get_by_id(&self, id: &str) -> impl Future<Output = Result<PersistedRoute>> + Send;

    fn list(&self) -> impl Future<Output = Result<Vec<PersistedRoute>>> + Send;
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    api_root: String,
    timeout: Duration,
}

impl BackendClient {
    pub fn new(client: Client, api_root: &str, timeout: Duration) -> Self {
        Self {
            client,
            api_root: api_root.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/public/{path}", self.api_root)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .timeout(self.timeout)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }
}

impl PickupPointSource for BackendClient {
    async fn get_all(&self) -> Result<Vec<PickupPoint>> {
        let envelope: PickupPointsEnvelope = self.get_json("pickuppoints").await?;
        tracing::debug!(count = envelope.pickuppoints.len(), "fetched pickup points");
        Ok(envelope.pickuppoints)
    }
}

impl RouteStore for BackendClient {
    async fn create(&self, draft: &DraftRoute) -> Result<RouteEnvelope> {
        let response = self
            .client
            .post(self.url("routes"))
            .timeout(self.timeout)
            .json(draft)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    async fn check_duplicate(&self, ids: &[String]) -> Result<DuplicateStatus> {
        let response = self
            .client
            .post(self.url("routes/check-duplicate"))
            .timeout(self.timeout)
            .json(ids)
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            let message = error_message(response).await;
            return Ok(DuplicateStatus::Conflict { message });
        }
        ensure_success(response).await?;
        Ok(DuplicateStatus::Unique)
    }

    async fn get_by_id(&self, id: &str) -> Result<PersistedRoute> {
        let envelope: RouteEnvelope = self.get_json(&format!("routes/{id}")).await?;
        envelope.route.ok_or_else(|| PlannerError::Backend {
            status: StatusCode::NOT_FOUND.as_u16(),
            message: if envelope.message.is_empty() {
                format!("route {id} not found")
            } else {
                envelope.message
            },
        })
    }

    async fn list(&self) -> Result<Vec<PersistedRoute>> {
        let envelope: RoutesEnvelope = self.get_json("routes").await?;
        Ok(envelope.routes)
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = error_message(response).await;
    Err(PlannerError::Backend {
        status: status.as_u16(),
        message,
    })
}

/// Prefers the backend's `{ message }` body, then the raw body, then the
/// status reason.
async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if let Ok(parsed) = serde_json::from_str::<ApiMessage>(&body) {
        return parsed.message;
    }
    if !body.trim().is_empty() {
        return body;
    }
    status
        .canonical_reason()
        .unwrap_or("unexpected backend response")
        .to_string()
}
