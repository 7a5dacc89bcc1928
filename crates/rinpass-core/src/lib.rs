//! Rinpass Core - Subscription gate business logic
//!
//! Signed session tokens, the cached entitlement store with its pluggable
//! backing sources, and the gate that ties the two together.

pub mod config;
pub mod crypto;
pub mod entitlement;
pub mod error;
pub mod gate;
pub mod source;
pub mod token;

pub use config::*;
pub use crypto::*;
pub use entitlement::*;
pub use error::*;
pub use gate::*;
pub use source::*;
pub use token::*;
