//! Backend status client
//!
//! The reconciler talks to the backend through the [`StatusFetch`] trait so
//! tests can script responses without a network. The production
//! implementation is a thin reqwest client for `GET /pay/return`.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::StatusError;
use crate::redirect::RedirectParameters;

/// Success body of the status endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body the backend may attach to a non-2xx response.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// One status request to the backend. At most one call is in flight at a
/// time; the poller never issues the next before the previous resolves.
#[async_trait]
pub trait StatusFetch: Send + Sync {
    async fn fetch_status(&self, params: &RedirectParameters)
        -> Result<StatusResponse, StatusError>;
}

/// Production client for the LAWRY backend status endpoint.
pub struct HttpStatusClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpStatusClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, StatusError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/pay/return", base_url.trim_end_matches('/')),
        })
    }

    /// Forward only the parameters the redirect actually carried.
    fn query_pairs(params: &RedirectParameters) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::new();
        if !params.reference.is_empty() {
            pairs.push(("reference", params.reference.as_str()));
        }
        if !params.reference_number.is_empty() {
            pairs.push(("referenceNumber", params.reference_number.as_str()));
        }
        if !params.session_id.is_empty() {
            pairs.push(("sessionId", params.session_id.as_str()));
        }
        if !params.response_code.is_empty() {
            pairs.push(("responsecode", params.response_code.as_str()));
        }
        if !params.message.is_empty() {
            pairs.push(("message", params.message.as_str()));
        }
        pairs
    }
}

#[async_trait]
impl StatusFetch for HttpStatusClient {
    async fn fetch_status(
        &self,
        params: &RedirectParameters,
    ) -> Result<StatusResponse, StatusError> {
        debug!(endpoint = %self.endpoint, reference = %params.reference, "fetching payment status");

        let response = self
            .http
            .get(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&Self::query_pairs(params))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StatusError::NotFound);
        }
        if !status.is_success() {
            // Error bodies are optional and loosely shaped; pull out
            // whichever display text is there.
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message.or(body.detail));
            return Err(StatusError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<StatusResponse>().await?)
    }
}
