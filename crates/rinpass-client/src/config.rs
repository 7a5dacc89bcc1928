//! Client configuration

use std::time::Duration;

use thiserror::Error;

use crate::retry::RetryConfig;

/// Client configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No gate base URL was given
    #[error("gate base URL is required")]
    MissingBaseUrl,

    /// Base URL is not http(s)
    #[error("invalid gate base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: String,
    connect_timeout: Duration,
    request_timeout: Duration,
    retry: RetryConfig,
}

impl ClientConfig {
    /// Start building a configuration
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Configuration with defaults for everything but the base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        Self::builder().base_url(base_url).build()
    }

    /// Gate base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// TCP connect timeout
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Whole-request timeout
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Retry settings for issuance
    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    connect_timeout: Duration,
    request_timeout: Duration,
    retry: RetryConfig,
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfigBuilder {
    /// Gate base URL, e.g. `https://gate.example.com`
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let base_url = self
            .base_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingBaseUrl)?;

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(base_url));
        }

        Ok(ClientConfig {
            base_url,
            connect_timeout: self.connect_timeout,
            request_timeout: self.request_timeout,
            retry: self.retry,
        })
    }
}
