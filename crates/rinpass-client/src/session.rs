//! Session manager
//!
//! Before each protected action the caller asks for a session token for the
//! current identifier. The manager answers from its cached session when the
//! gate still accepts it and goes back to the gate for a new one otherwise:
//!
//! ```text
//!   NoSession ──issue ok──▶ CachedValid ──validate ok──▶ CachedValid
//!       ▲                        │
//!       │                  validate failed
//!       │                        ▼
//!       └────── cleared ─── CachedInvalid
//! ```
//!
//! A cached session belongs to exactly one identifier. Asking for a
//! different identifier discards it before anything is sent to the gate.

use std::sync::Arc;

use rinpass_types::Rin;
use tokio::sync::Mutex;

use crate::retry::{with_retry, RetryConfig};
use crate::{ClientError, GateTransport, Result, SessionStore, StoredSession};

/// Where the manager stands after its last operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing cached
    NoSession,
    /// Cached token accepted by the gate (or just issued)
    CachedValid,
    /// Cached token was refused; it is discarded on the way back to `NoSession`
    CachedInvalid,
}

/// Keeps one gate session per identifier
pub struct SessionManager<T, S> {
    transport: Arc<T>,
    store: Arc<S>,
    retry: RetryConfig,
    state: Mutex<SessionState>,
}

impl<T, S> SessionManager<T, S>
where
    T: GateTransport,
    S: SessionStore,
{
    /// Create a manager over a transport and a session store
    pub fn new(transport: Arc<T>, store: Arc<S>) -> Self {
        Self {
            transport,
            store,
            retry: RetryConfig::default(),
            state: Mutex::new(SessionState::NoSession),
        }
    }

    /// Retry settings used for issuance
    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// State after the last operation
    pub async fn state(&self) -> SessionState {
        *self.state.lock().await
    }

    /// Session token for a caller-supplied identifier
    ///
    /// # Errors
    /// [`ClientError::InvalidInput`] for a blank identifier, otherwise as
    /// [`SessionManager::ensure_session_for`].
    pub async fn ensure_session(&self, raw_rin: &str) -> Result<String> {
        let rin = Rin::parse(raw_rin).map_err(|e| ClientError::InvalidInput(e.to_string()))?;
        self.ensure_session_for(&rin).await
    }

    /// Session token for `rin`, revalidating or re-issuing as needed
    ///
    /// # Errors
    /// [`ClientError::Denied`] when the gate refuses issuance. Any other
    /// error means the gate could not be asked; configuration failures are
    /// returned as soon as they are seen. Every failure leaves the store
    /// empty.
    pub async fn ensure_session_for(&self, rin: &Rin) -> Result<String> {
        let mut state = self.state.lock().await;

        if let Some(session) = self.store.load().await? {
            if session.rin != *rin {
                tracing::debug!(cached = %session.rin, requested = %rin, "Identifier changed, dropping cached session");
                self.store.clear().await?;
                *state = SessionState::NoSession;
            } else {
                match self.transport.validate(&session.token).await {
                    Ok(_) => {
                        *state = SessionState::CachedValid;
                        return Ok(session.token);
                    }
                    Err(e) => {
                        *state = SessionState::CachedInvalid;
                        self.store.clear().await?;
                        *state = SessionState::NoSession;

                        if e.is_configuration() {
                            tracing::error!(rin = %rin, error = %e, "Gate misconfigured during validation");
                            return Err(e);
                        }
                        tracing::info!(rin = %rin, error = %e, "Cached session rejected");
                    }
                }
            }
        }

        let issued = with_retry(self.retry.clone(), || self.transport.issue(rin)).await;

        match issued {
            Ok(token) => {
                self.store.save(&StoredSession::new(rin.clone(), token.clone())).await?;
                *state = SessionState::CachedValid;
                tracing::info!(rin = %rin, "Session established");
                Ok(token)
            }
            Err(e) => {
                tracing::warn!(rin = %rin, error = %e, "Session issuance failed");
                self.store.clear().await?;
                *state = SessionState::NoSession;
                Err(e)
            }
        }
    }

    /// Drop the cached session
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.store.clear().await?;
        *state = SessionState::NoSession;
        Ok(())
    }
}

impl<S: SessionStore> SessionManager<crate::HttpGateClient, S> {
    /// Manager talking HTTP to the configured gate
    pub fn from_config(config: crate::ClientConfig, store: Arc<S>) -> Result<Self> {
        let retry = config.retry().clone();
        let transport = crate::HttpGateClient::new(config)?;
        Ok(Self::new(Arc::new(transport), store).with_retry_config(retry))
    }
}

impl<T, S> std::fmt::Debug for SessionManager<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
