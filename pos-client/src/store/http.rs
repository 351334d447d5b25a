//! HTTP-backed ticket store

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use shared::models::{Ticket, TicketStatus};

use super::{BulkCreateResponse, DenyReason, TicketStore, VerifyResponse};
use crate::config::ClientConfig;
use crate::error::{StoreError, StoreResult};

/// Ticket store client backed by the gate server's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpTicketStore {
    client: Client,
    base_url: String,
}

/// Deny body returned by `POST /api/tickets/{id}/verify` with status 400
#[derive(Debug, Deserialize)]
struct DenyBody {
    message: String,
    #[serde(default)]
    reason: Option<DenyReason>,
    #[serde(default)]
    ticket: Option<Ticket>,
}

impl HttpTicketStore {
    pub fn new(config: &ClientConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn error_for(status: StatusCode, response: reqwest::Response) -> StoreError {
        let message = response.text().await.unwrap_or_default();
        if status.is_client_error() {
            StoreError::Rejected {
                status: status.as_u16(),
                message,
            }
        } else {
            StoreError::Server {
                status: status.as_u16(),
                message,
            }
        }
    }
}

#[async_trait]
impl TicketStore for HttpTicketStore {
    async fn create_many(&self, tickets: &[Ticket]) -> StoreResult<BulkCreateResponse> {
        let response = self
            .client
            .post(self.url("api/tickets"))
            .json(&tickets)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_for(status, response).await);
        }
        Ok(response.json().await?)
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Ticket>> {
        let response = self
            .client
            .get(self.url(&format!("api/tickets/{id}")))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Self::error_for(status, response).await);
        }
        Ok(Some(response.json().await?))
    }

    async fn verify(&self, id: &str) -> StoreResult<VerifyResponse> {
        let response = self
            .client
            .post(self.url(&format!("api/tickets/{id}/verify")))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(VerifyResponse::Verified {
                ticket: response.json().await?,
            }),
            StatusCode::NOT_FOUND => Ok(VerifyResponse::NotFound),
            StatusCode::BAD_REQUEST => {
                let body: DenyBody = response.json().await?;
                // Older servers omit `reason`; fall back to the ticket status
                let reason = body.reason.unwrap_or(
                    match body.ticket.as_ref().map(|t| t.status) {
                        Some(TicketStatus::Used) => DenyReason::AlreadyUsed,
                        _ => DenyReason::Invalid,
                    },
                );
                Ok(VerifyResponse::Denied {
                    reason,
                    message: body.message,
                    ticket: body.ticket,
                })
            }
            status => Err(Self::error_for(status, response).await),
        }
    }
}
