//! HTTP handlers

mod health;
mod subscription;
mod token;

pub use health::{health, ready};
pub use subscription::check_subscription;
pub use token::validate_token;
