//! API request/response types
//!
//! Both gate endpoints answer with the same envelope: `granted` plus either
//! the granted payload or a `reason`/`code` pair.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{DenialReason, Rin, RinError, SubscriptionRecord};

/// Failure codes that are not denials
pub mod codes {
    /// Missing or malformed identifier/token in the request
    pub const INVALID_INPUT: &str = "INVALID_INPUT";
    /// Validation request carried no token at all
    pub const MISSING_TOKEN: &str = "MISSING_TOKEN";
    /// Backing entitlement source unreachable or timed out
    pub const SOURCE_UNAVAILABLE: &str = "SOURCE_UNAVAILABLE";
    /// Backing entitlement source returned an invalid document
    pub const MALFORMED_SOURCE: &str = "MALFORMED_SOURCE";
    /// Gate is missing required configuration (e.g. the signing secret)
    pub const CONFIGURATION_ERROR: &str = "CONFIGURATION_ERROR";
    /// Anything else
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Body of `POST /api/check-subscription`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueRequest {
    /// Identifier as sent by the caller (string or number)
    #[serde(default, alias = "identifier")]
    pub rin: Option<Value>,
}

impl IssueRequest {
    /// Build a request for a known identifier
    pub fn new(rin: &Rin) -> Self {
        Self {
            rin: Some(Value::String(rin.as_str().to_string())),
        }
    }

    /// Read the identifier out of the request
    pub fn rin(&self) -> Result<Rin, RinError> {
        match &self.rin {
            Some(value) => Rin::from_json(value),
            None => Err(RinError::Missing),
        }
    }
}

/// Response of `POST /api/check-subscription`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueResponse {
    /// Whether a token was issued
    pub granted: bool,
    /// Issued session token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Human-readable reason when not granted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Machine-readable reason when not granted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl IssueResponse {
    /// Token issued
    pub fn granted(token: impl Into<String>) -> Self {
        Self {
            granted: true,
            token: Some(token.into()),
            reason: None,
            code: None,
        }
    }

    /// Well-formed request refused
    pub fn denied(reason: DenialReason) -> Self {
        Self::failure(reason.code(), reason.as_str())
    }

    /// Request could not be answered
    pub fn failure(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            granted: false,
            token: None,
            reason: Some(reason.into()),
            code: Some(code.into()),
        }
    }

    /// Denial reason, when the response carries one
    pub fn denial(&self) -> Option<DenialReason> {
        self.code.as_deref().and_then(DenialReason::from_code)
    }
}

/// Body of `POST /api/validate-token` when the token is not sent as a bearer header
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidateRequest {
    /// Session token
    #[serde(default)]
    pub token: Option<String>,
}

/// Response of `POST /api/validate-token`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateResponse {
    /// Whether the token is valid and its subject still entitled
    pub granted: bool,
    /// Current subscription record of the token's subject
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<SubscriptionRecord>,
    /// Human-readable reason when not granted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Machine-readable reason when not granted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ValidateResponse {
    /// Token valid, subject entitled
    pub fn granted(record: SubscriptionRecord) -> Self {
        Self {
            granted: true,
            record: Some(record),
            reason: None,
            code: None,
        }
    }

    /// Well-formed request refused
    pub fn denied(reason: DenialReason) -> Self {
        Self::failure(reason.code(), reason.as_str())
    }

    /// Request could not be answered
    pub fn failure(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            granted: false,
            record: None,
            reason: Some(reason.into()),
            code: Some(code.into()),
        }
    }

    /// Denial reason, when the response carries one
    pub fn denial(&self) -> Option<DenialReason> {
        self.code.as_deref().and_then(DenialReason::from_code)
    }
}
