//! Backing sources for the entitlement list
//!
//! Every source produces the same thing: the complete list of subscription
//! records parsed from a document of the form
//! `{"subscriptions": [{"rin": .., "expiry": .., ...}, ...]}`.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use rinpass_types::SubscriptionRecord;
use serde::Deserialize;
use serde_json::Value;

use crate::GateError;

/// Key of the record collection inside the entitlement document
pub const COLLECTION_KEY: &str = "subscriptions";

/// Envelope key used by JSON bucket services that wrap stored documents
const BUCKET_ENVELOPE_KEY: &str = "record";

/// Capability to fetch the full entitlement collection
#[async_trait]
pub trait EntitlementSource: Send + Sync {
    /// Read and parse the whole collection
    async fn fetch_entitlements(&self) -> Result<Vec<SubscriptionRecord>, GateError>;

    /// Short description for logs (never includes credentials)
    fn describe(&self) -> String;
}

/// Parse an entitlement document
///
/// The whole document is rejected if any entry lacks a usable identifier or
/// expiry, so a half-broken upload never becomes a partial snapshot.
pub fn parse_document(bytes: &[u8]) -> Result<Vec<SubscriptionRecord>, GateError> {
    let document: Value = serde_json::from_slice(bytes)
        .map_err(|e| GateError::MalformedSource(format!("document is not JSON: {e}")))?;

    let collection = document
        .get(COLLECTION_KEY)
        .or_else(|| {
            document
                .get(BUCKET_ENVELOPE_KEY)
                .and_then(|inner| inner.get(COLLECTION_KEY))
        })
        .ok_or_else(|| {
            GateError::MalformedSource(format!("document has no `{COLLECTION_KEY}` key"))
        })?;

    let entries = collection.as_array().ok_or_else(|| {
        GateError::MalformedSource(format!("`{COLLECTION_KEY}` is not a list"))
    })?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            SubscriptionRecord::deserialize(entry)
                .map_err(|e| GateError::MalformedSource(format!("entry {index}: {e}")))
        })
        .collect()
}

/// How an [`HttpSource`] authenticates
#[derive(Clone, Default)]
pub enum SourceAuth {
    /// No credentials (public document)
    #[default]
    None,
    /// GitHub personal access token: `Authorization: token <value>`
    GithubToken(String),
    /// `Authorization: Bearer <value>`
    Bearer(String),
    /// JSON bucket access key: `X-Access-Key: <value>`, unwrapped response
    AccessKey(String),
}

impl SourceAuth {
    fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::GithubToken(_) => "github-token",
            Self::Bearer(_) => "bearer",
            Self::AccessKey(_) => "access-key",
        }
    }
}

impl std::fmt::Debug for SourceAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SourceAuth({})", self.kind())
    }
}

/// Entitlement document fetched over HTTP
///
/// Covers the raw-file host (token header), bearer-protected endpoints, and
/// JSON bucket services (static access key).
#[derive(Clone)]
pub struct HttpSource {
    http_client: reqwest::Client,
    url: String,
    auth: SourceAuth,
}

impl HttpSource {
    /// Create a source with a client tuned for small periodic document fetches
    pub fn new(url: impl Into<String>, auth: SourceAuth) -> Self {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(2)
            .tcp_nodelay(true)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self::with_client(url, auth, http_client)
    }

    /// Create a source with a custom HTTP client
    pub fn with_client(url: impl Into<String>, auth: SourceAuth, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            url: url.into(),
            auth,
        }
    }

    /// Raw GitHub file, optionally behind a personal access token
    pub fn github(url: impl Into<String>, token: Option<String>) -> Self {
        let auth = token.map_or(SourceAuth::None, SourceAuth::GithubToken);
        Self::new(url, auth)
    }

    /// JSON bucket read with a static access key
    pub fn bucket(url: impl Into<String>, access_key: impl Into<String>) -> Self {
        Self::new(url, SourceAuth::AccessKey(access_key.into()))
    }

    /// Document location
    pub fn url(&self) -> &str {
        &self.url
    }

    fn request(&self) -> reqwest::RequestBuilder {
        let request = self
            .http_client
            .get(&self.url)
            .header(ACCEPT, "application/json");

        match &self.auth {
            SourceAuth::None => request,
            SourceAuth::GithubToken(token) => request.header(AUTHORIZATION, format!("token {token}")),
            SourceAuth::Bearer(token) => request.bearer_auth(token),
            SourceAuth::AccessKey(key) => request
                .header("X-Access-Key", key)
                .header("X-Bin-Meta", "false"),
        }
    }
}

#[async_trait]
impl EntitlementSource for HttpSource {
    async fn fetch_entitlements(&self) -> Result<Vec<SubscriptionRecord>, GateError> {
        tracing::debug!(url = %self.url, auth = self.auth.kind(), "Fetching entitlement document");

        let response = self.request().send().await.map_err(|e| {
            tracing::error!("Failed to fetch entitlement document: {}", e);
            GateError::SourceUnavailable(format!("request failed: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Entitlement source returned status: {}", status);
            return Err(GateError::SourceUnavailable(format!(
                "source returned status {status}"
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            tracing::error!("Failed to read entitlement document: {}", e);
            GateError::SourceUnavailable(format!("failed to read body: {e}"))
        })?;

        parse_document(&body)
    }

    fn describe(&self) -> String {
        format!("http:{}", self.url)
    }
}

impl std::fmt::Debug for HttpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSource")
            .field("url", &self.url)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

/// Entitlement document read from the local filesystem
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a file source
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl EntitlementSource for FileSource {
    async fn fetch_entitlements(&self) -> Result<Vec<SubscriptionRecord>, GateError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            tracing::error!(path = %self.path.display(), "Failed to read entitlement file: {}", e);
            GateError::SourceUnavailable(format!("cannot read {}: {e}", self.path.display()))
        })?;
        parse_document(&bytes)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
