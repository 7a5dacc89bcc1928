//! Transport to the gate's HTTP API

use async_trait::async_trait;
use reqwest::StatusCode;
use rinpass_types::{IssueRequest, IssueResponse, Rin, SubscriptionRecord, ValidateResponse};
use serde::de::DeserializeOwned;

use crate::{ClientConfig, ClientError, Result};

/// Path of the issuance endpoint
pub const ISSUE_PATH: &str = "/api/check-subscription";
/// Path of the validation endpoint
pub const VALIDATE_PATH: &str = "/api/validate-token";

/// Remote gate operations used by the session manager
///
/// A denial comes back as `Err(ClientError::Denied(..))` so callers can treat
/// "not granted" and "could not ask" uniformly while still telling them
/// apart.
#[async_trait]
pub trait GateTransport: Send + Sync {
    /// Ask the gate to issue a session token for `rin`
    async fn issue(&self, rin: &Rin) -> Result<String>;

    /// Ask the gate whether `token` is still good
    async fn validate(&self, token: &str) -> Result<SubscriptionRecord>;
}

/// [`GateTransport`] over HTTP/JSON
#[derive(Debug, Clone)]
pub struct HttpGateClient {
    http_client: reqwest::Client,
    config: ClientConfig,
}

impl HttpGateClient {
    /// Create a client for the configured gate
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ClientError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url())
    }

    /// Decode a gate response body, keeping the status for classification
    async fn decode<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<(StatusCode, T)> {
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;

        match serde_json::from_slice::<T>(&bytes) {
            Ok(body) => Ok((status, body)),
            Err(e) => {
                // Unreadable body: classify by status alone
                let by_status = ClientError::from_response(
                    status.as_u16(),
                    None,
                    Some(&format!("gate returned status {status}")),
                );
                if by_status.is_retryable() {
                    Err(by_status)
                } else {
                    Err(ClientError::Serialization(format!(
                        "unexpected gate response (status {status}): {e}"
                    )))
                }
            }
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.config.request_timeout())
        } else {
            err.into()
        }
    }
}

#[async_trait]
impl GateTransport for HttpGateClient {
    async fn issue(&self, rin: &Rin) -> Result<String> {
        tracing::debug!(rin = %rin, "Requesting session token");

        let response = self
            .http_client
            .post(self.url(ISSUE_PATH))
            .json(&IssueRequest::new(rin))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let (status, body) = self.decode::<IssueResponse>(response).await?;

        match body {
            IssueResponse {
                granted: true,
                token: Some(token),
                ..
            } => Ok(token),
            IssueResponse { granted: true, .. } => Err(ClientError::Serialization(
                "granted issuance response carried no token".to_string(),
            )),
            IssueResponse { code, reason, .. } => Err(ClientError::from_response(
                status.as_u16(),
                code.as_deref(),
                reason.as_deref(),
            )),
        }
    }

    async fn validate(&self, token: &str) -> Result<SubscriptionRecord> {
        let response = self
            .http_client
            .post(self.url(VALIDATE_PATH))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let (status, body) = self.decode::<ValidateResponse>(response).await?;

        match body {
            ValidateResponse {
                granted: true,
                record: Some(record),
                ..
            } => Ok(record),
            ValidateResponse { granted: true, .. } => Err(ClientError::Serialization(
                "granted validation response carried no record".to_string(),
            )),
            ValidateResponse { code, reason, .. } => Err(ClientError::from_response(
                status.as_u16(),
                code.as_deref(),
                reason.as_deref(),
            )),
        }
    }
}
