//! Subscription gate - ties together token issuance and entitlement lookup

use std::sync::Arc;
use std::time::Duration;

use rinpass_types::{Decision, DenialReason, Rin, SubscriptionRecord};

use crate::{EntitlementSource, EntitlementStore, GateConfig, GateError, IssuedToken, TokenService};

/// Subscription gate
///
/// Provides the two operations exposed at the service boundary:
/// - `check_and_issue`: identifier in, session token out
/// - `validate`: session token in, current subscription record out
///
/// Validation always re-confirms the token's subject against the entitlement
/// store, so removing a subscriber from the source revokes their tokens once
/// the cached snapshot turns over, well before the tokens expire.
pub struct SubscriptionGate {
    tokens: TokenService,
    store: Arc<EntitlementStore>,
    token_ttl: Duration,
}

impl SubscriptionGate {
    /// Create a gate from configuration and a backing source
    ///
    /// # Errors
    /// Returns [`GateError::Configuration`] when the signing secret is missing;
    /// this is checked before any request can be served.
    pub fn new(config: &GateConfig, source: Arc<dyn EntitlementSource>) -> Result<Self, GateError> {
        config.validate()?;

        let store = EntitlementStore::new(source, config.cache_ttl)
            .with_fetch_timeout(config.source_timeout);

        Self::from_parts(
            TokenService::new(&config.secret)?,
            Arc::new(store),
            config.token_ttl,
        )
    }

    /// Create a gate around an existing token service and store
    pub fn from_parts(
        tokens: TokenService,
        store: Arc<EntitlementStore>,
        token_ttl: Duration,
    ) -> Result<Self, GateError> {
        if token_ttl.is_zero() {
            return Err(GateError::Configuration(
                "token TTL must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            tokens,
            store,
            token_ttl,
        })
    }

    /// Issue a session token if `rin` is currently entitled
    pub async fn check_and_issue(&self, rin: &Rin) -> Result<Decision<IssuedToken>, GateError> {
        tracing::info!(rin = %rin, "Subscription check");

        let record = match self.entitled_record(rin).await? {
            Decision::Granted(record) => record,
            Decision::Denied(reason) => {
                tracing::info!(rin = %rin, reason = %reason, "Subscription check denied");
                return Ok(Decision::Denied(reason));
            }
        };

        let issued = self.tokens.issue(&record.rin, self.token_ttl)?;
        tracing::info!(rin = %record.rin, expires_at = issued.claims.expires_at, "Session token issued");

        Ok(Decision::Granted(issued))
    }

    /// Verify a session token and re-confirm its subject's entitlement
    pub async fn validate(&self, token: &str) -> Result<Decision<SubscriptionRecord>, GateError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(GateError::InvalidInput("token is required".to_string()));
        }

        let claims = match self.tokens.verify(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!(error = %e, "Session token rejected");
                return Ok(Decision::Denied(e.into()));
            }
        };

        tracing::debug!(rin = %claims.subject, "Session token verified");

        let decision = self.entitled_record(&claims.subject).await?;
        if let Decision::Denied(reason) = &decision {
            tracing::info!(rin = %claims.subject, reason = %reason, "Token subject no longer entitled");
        }
        Ok(decision)
    }

    /// Token service used for issuance
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Entitlement store consulted by both operations
    pub fn store(&self) -> &Arc<EntitlementStore> {
        &self.store
    }

    /// Lifetime of issued tokens
    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    async fn entitled_record(&self, rin: &Rin) -> Result<Decision<SubscriptionRecord>, GateError> {
        Ok(match self.store.lookup(rin).await? {
            None => Decision::Denied(DenialReason::NotFound),
            Some(record) if !self.store.is_active(&record) => {
                Decision::Denied(DenialReason::Expired)
            }
            Some(record) => Decision::Granted(record),
        })
    }
}

impl std::fmt::Debug for SubscriptionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionGate")
            .field("store", &self.store)
            .field("token_ttl", &self.token_ttl)
            .finish_non_exhaustive()
    }
}
