//! Common error types

use thiserror::Error;

/// Errors raised while reading a RIN from caller input or a source document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RinError {
    /// No identifier was supplied
    #[error("RIN is required")]
    Missing,

    /// Identifier was supplied but is blank after trimming
    #[error("RIN must not be blank")]
    Blank,

    /// Identifier has a JSON type that cannot be read as text
    #[error("RIN must be a string or a number, got {0}")]
    InvalidType(&'static str),
}

/// Errors raised while reading a subscription expiry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpiryError {
    /// Text was neither RFC 3339 nor `YYYY-MM-DD`
    #[error("unrecognized expiry format: {0}")]
    Format(String),

    /// Unix timestamp outside the representable range
    #[error("expiry timestamp out of range: {0}")]
    OutOfRange(i64),
}
