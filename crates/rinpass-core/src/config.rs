//! Configuration types for the subscription gate

use std::time::Duration;

use crate::GateError;

/// Gate configuration
#[derive(Clone)]
pub struct GateConfig {
    /// HMAC secret shared by every process that issues or verifies tokens
    pub secret: String,
    /// Lifetime of issued tokens
    pub token_ttl: Duration,
    /// How long an entitlement snapshot is served before it is refetched
    pub cache_ttl: Duration,
    /// Bound on a single backing-source fetch (`None` waits indefinitely)
    pub source_timeout: Option<Duration>,
}

impl GateConfig {
    /// Create a new gate config
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            token_ttl: Duration::from_secs(24 * 60 * 60), // 24 hours
            cache_ttl: Duration::from_secs(60),
            source_timeout: Some(Duration::from_secs(10)),
        }
    }

    /// Set token lifetime
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Set snapshot cache TTL (zero disables caching)
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the backing-source fetch timeout
    pub fn with_source_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.source_timeout = timeout;
        self
    }

    /// Reject configurations the gate cannot run with
    pub fn validate(&self) -> Result<(), GateError> {
        if self.secret.is_empty() {
            return Err(GateError::Configuration(
                "signing secret is missing".to_string(),
            ));
        }
        if self.token_ttl.is_zero() {
            return Err(GateError::Configuration(
                "token TTL must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for GateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateConfig")
            .field("secret", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .field("cache_ttl", &self.cache_ttl)
            .field("source_timeout", &self.source_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GateConfig::new("secret");
        assert_eq!(config.token_ttl, Duration::from_secs(86_400));
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.source_timeout, Some(Duration::from_secs(10)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_secret_is_configuration_error() {
        let result = GateConfig::new("").validate();
        assert!(matches!(result, Err(GateError::Configuration(_))));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = GateConfig::new("do-not-print-me");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("do-not-print-me"));
        assert!(rendered.contains("REDACTED"));
    }
}
