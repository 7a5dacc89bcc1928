//! Gate decision types

use serde::{Deserialize, Serialize};

/// Why the gate refused a request that was otherwise well-formed
///
/// A denial is a business outcome, not a failure: the identifier or token
/// simply does not satisfy the entitlement right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// Identifier is absent from the entitlement document
    NotFound,
    /// Identifier is present but its subscription has lapsed
    Expired,
    /// Token does not have three non-empty segments or its payload is unreadable
    MalformedToken,
    /// Token signature does not match its header and payload
    BadSignature,
    /// Token is intact but past its expiry
    TokenExpired,
}

impl DenialReason {
    /// Human-readable reason sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::Expired => "expired",
            Self::MalformedToken => "malformed token",
            Self::BadSignature => "bad signature",
            Self::TokenExpired => "token expired",
        }
    }

    /// Machine-readable code sent on the wire
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Expired => "SUBSCRIPTION_EXPIRED",
            Self::MalformedToken => "MALFORMED_TOKEN",
            Self::BadSignature => "BAD_SIGNATURE",
            Self::TokenExpired => "TOKEN_EXPIRED",
        }
    }

    /// Inverse of [`DenialReason::code`]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "NOT_FOUND" => Some(Self::NotFound),
            "SUBSCRIPTION_EXPIRED" => Some(Self::Expired),
            "MALFORMED_TOKEN" => Some(Self::MalformedToken),
            "BAD_SIGNATURE" => Some(Self::BadSignature),
            "TOKEN_EXPIRED" => Some(Self::TokenExpired),
            _ => None,
        }
    }

    /// True for reasons produced by token verification rather than lookup
    pub fn is_token_failure(&self) -> bool {
        matches!(
            self,
            Self::MalformedToken | Self::BadSignature | Self::TokenExpired
        )
    }
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a gate operation that ran to completion
#[derive(Debug, Clone, PartialEq)]
pub enum Decision<T> {
    /// Access granted
    Granted(T),
    /// Access refused
    Denied(DenialReason),
}

impl<T> Decision<T> {
    /// Whether access was granted
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }

    /// The granted value, if any
    pub fn granted(self) -> Option<T> {
        match self {
            Self::Granted(value) => Some(value),
            Self::Denied(_) => None,
        }
    }

    /// The denial reason, if any
    pub fn denial(&self) -> Option<DenialReason> {
        match self {
            Self::Granted(_) => None,
            Self::Denied(reason) => Some(*reason),
        }
    }
}
