//! Rinpass Types - Shared domain types
//!
//! This crate contains the types shared by the gate service and its clients:
//! - RIN identifiers and their normalization
//! - Subscription records as found in the entitlement document
//! - Gate decisions and the request/response bodies on the wire

pub mod api;
pub mod entitlement;
pub mod error;
pub mod rin;
pub mod subscription;

pub use api::*;
pub use entitlement::*;
pub use error::*;
pub use rin::*;
pub use subscription::*;
