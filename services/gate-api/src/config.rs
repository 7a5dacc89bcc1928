//! Configuration for the Gate API service.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rinpass_core::{EntitlementSource, FileSource, GateConfig, GateError, HttpSource, SubscriptionGate};

/// Where the entitlement document lives
#[derive(Clone)]
pub enum SourceConfig {
    /// Raw file in a GitHub repository
    Github {
        url: String,
        token: Option<String>,
    },
    /// JSON bucket service with an access key
    Bucket { url: String, access_key: String },
    /// Local JSON file
    File { path: PathBuf },
}

impl SourceConfig {
    /// Build the configured source
    pub fn build(&self) -> Arc<dyn EntitlementSource> {
        match self {
            Self::Github { url, token } => Arc::new(HttpSource::github(url.clone(), token.clone())),
            Self::Bucket { url, access_key } => {
                Arc::new(HttpSource::bucket(url.clone(), access_key.clone()))
            }
            Self::File { path } => Arc::new(FileSource::new(path.clone())),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Github { .. } => "github",
            Self::Bucket { .. } => "bucket",
            Self::File { .. } => "file",
        }
    }
}

impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Github { url, token } => f
                .debug_struct("Github")
                .field("url", url)
                .field("token", &token.as_ref().map(|_| "<redacted>"))
                .finish(),
            Self::Bucket { url, .. } => f
                .debug_struct("Bucket")
                .field("url", url)
                .field("access_key", &"<redacted>")
                .finish(),
            Self::File { path } => f.debug_struct("File").field("path", path).finish(),
        }
    }
}

/// Gate API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Request timeout for the gate endpoints
    pub request_timeout: Duration,

    /// Gate core configuration
    pub gate: GateConfig,

    /// Entitlement source
    pub source: SourceConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &'static str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &'static str| var(key).ok_or(ConfigError::Missing(key));

        // Signing secret; nothing is served without it
        let secret = required("JWT_SECRET")?;

        let http_port = parse_or(var("HTTP_PORT"), "HTTP_PORT", 8080)?;
        let request_timeout_secs: u64 =
            parse_or(var("REQUEST_TIMEOUT_SECS"), "REQUEST_TIMEOUT_SECS", 30)?;
        let token_ttl_hours: u64 = parse_or(var("TOKEN_TTL_HOURS"), "TOKEN_TTL_HOURS", 24)?;
        let cache_ttl_secs: u64 =
            parse_or(var("ENTITLEMENT_CACHE_TTL_SECS"), "ENTITLEMENT_CACHE_TTL_SECS", 60)?;
        let source_timeout_secs: u64 =
            parse_or(var("SOURCE_TIMEOUT_SECS"), "SOURCE_TIMEOUT_SECS", 10)?;

        if token_ttl_hours == 0 {
            return Err(ConfigError::Invalid("TOKEN_TTL_HOURS must be greater than zero"));
        }

        let source = match var("ENTITLEMENT_SOURCE").as_deref().map(str::trim) {
            None | Some("github") => SourceConfig::Github {
                url: required("ENTITLEMENTS_URL")?,
                token: var("GITHUB_TOKEN"),
            },
            Some("bucket") => SourceConfig::Bucket {
                url: required("ENTITLEMENTS_URL")?,
                access_key: required("BUCKET_ACCESS_KEY")?,
            },
            Some("file") => SourceConfig::File {
                path: PathBuf::from(required("ENTITLEMENTS_FILE")?),
            },
            Some(_) => return Err(ConfigError::Invalid("ENTITLEMENT_SOURCE")),
        };

        let source_timeout =
            (source_timeout_secs > 0).then(|| Duration::from_secs(source_timeout_secs));

        let gate = GateConfig::new(secret)
            .with_token_ttl(Duration::from_secs(token_ttl_hours * 3600))
            .with_cache_ttl(Duration::from_secs(cache_ttl_secs))
            .with_source_timeout(source_timeout);

        Ok(Self {
            http_port,
            request_timeout: Duration::from_secs(request_timeout_secs),
            gate,
            source,
        })
    }

    /// Name of the configured source kind, for logs
    pub fn source_kind(&self) -> &'static str {
        self.source.kind()
    }

    /// Build the gate this configuration describes
    pub fn build_gate(&self) -> Result<SubscriptionGate, GateError> {
        SubscriptionGate::new(&self.gate, self.source.build())
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
