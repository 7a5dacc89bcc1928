//! Application state

use std::sync::Arc;
use std::time::Duration;

use rinpass_core::SubscriptionGate;

use crate::config::Config;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Subscription gate (token service plus entitlement store)
    pub gate: Arc<SubscriptionGate>,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(gate: SubscriptionGate, config: Config) -> Self {
        Self {
            gate: Arc::new(gate),
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> Duration {
        self.config.request_timeout
    }
}
