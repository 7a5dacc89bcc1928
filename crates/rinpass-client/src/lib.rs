//! Rinpass Client - session manager for gate consumers
//!
//! Keeps one session token per identifier, revalidating it against the gate
//! before each protected action and re-issuing it when the gate says no.

pub mod cache;
pub mod config;
pub mod error;
pub mod retry;
pub mod session;
pub mod transport;

pub use cache::{FileSessionStore, MemorySessionStore, SessionStore, StoredSession};
pub use config::{ClientConfig, ClientConfigBuilder, ConfigError};
pub use error::{ClientError, Result};
pub use retry::{with_retry, RetryConfig};
pub use session::{SessionManager, SessionState};
pub use transport::{GateTransport, HttpGateClient};
