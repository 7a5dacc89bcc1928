//! Session token issuance and verification
//!
//! Tokens are three `.`-joined segments of unpadded URL-safe base64:
//!
//! ```text
//! base64url({"alg":"HS256","typ":"JWT"}) . base64url({"rin":..,"iat":..,"exp":..}) . base64url(HMAC-SHA256)
//! ```
//!
//! The MAC covers the exact text `header.payload`. The layout is JWT-shaped
//! but deliberately minimal: one claim set, one algorithm, no key IDs.

use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use rinpass_types::Rin;
use serde::{Deserialize, Serialize};

use crate::crypto::{constant_time_eq, HmacKey};
use crate::{GateError, TokenError};

/// Token header (fixed)
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Claim set carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (canonical RIN)
    #[serde(rename = "rin")]
    pub subject: Rin,
    /// Issue timestamp (Unix seconds); absent on tokens minted before it was added
    #[serde(rename = "iat", default)]
    pub issued_at: i64,
    /// Expiration timestamp (Unix seconds)
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl Claims {
    /// Build claims for `subject` valid for `ttl` from `now`
    pub fn new(subject: Rin, ttl: Duration, now: DateTime<Utc>) -> Self {
        let issued_at = now.timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            subject,
            issued_at,
            expires_at: issued_at.saturating_add(ttl_secs),
        }
    }

    /// Check whether the claims have expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.expires_at
    }
}

/// A freshly issued token together with the claims it encodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Wire form
    pub token: String,
    /// Encoded claims
    pub claims: Claims,
}

/// Issues and verifies session tokens with a shared secret
#[derive(Clone)]
pub struct TokenService {
    hmac_key: HmacKey,
    encoded_header: String,
}

impl TokenService {
    /// Create a token service
    ///
    /// # Errors
    /// Returns [`GateError::Configuration`] if the secret is missing.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, GateError> {
        let hmac_key = HmacKey::new(secret)
            .map_err(|e| GateError::Configuration(format!("signing secret: {e}")))?;
        if hmac_key.is_weak() {
            tracing::warn!(
                minimum = HmacKey::RECOMMENDED_KEY_LENGTH,
                "signing secret is shorter than recommended"
            );
        }

        let header_json = serde_json::to_vec(&TokenHeader::hs256())
            .map_err(|e| GateError::Internal(format!("failed to encode token header: {e}")))?;

        Ok(Self {
            hmac_key,
            encoded_header: URL_SAFE_NO_PAD.encode(header_json),
        })
    }

    /// Issue a token for `subject` valid for `ttl`
    pub fn issue(&self, subject: &Rin, ttl: Duration) -> Result<IssuedToken, GateError> {
        self.issue_at(subject, ttl, Utc::now())
    }

    /// Issue a token as of `now`
    pub fn issue_at(
        &self,
        subject: &Rin,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, GateError> {
        let claims = Claims::new(subject.clone(), ttl, now);
        let token = self.sign_claims(&claims)?;
        Ok(IssuedToken { token, claims })
    }

    /// Verify a token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as of `now`
    ///
    /// Integrity is checked before the payload is trusted: a token with a
    /// bad signature reports `BadSignature` even when its claimed expiry has
    /// passed.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let (header, payload, signature) = split_segments(token)?;

        let expected = self.compute_signature(header, payload);
        if !constant_time_eq(signature.as_bytes(), expected.as_bytes()) {
            tracing::debug!("Token signature mismatch");
            return Err(TokenError::BadSignature);
        }

        let payload_json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&payload_json).map_err(|_| TokenError::Malformed)?;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Sign a claim set and return the token
    fn sign_claims(&self, claims: &Claims) -> Result<String, GateError> {
        let payload_json = serde_json::to_vec(claims).map_err(|e| {
            tracing::error!("Failed to serialize claims: {}", e);
            GateError::Internal("failed to issue token".to_string())
        })?;

        let payload_b64 = URL_SAFE_NO_PAD.encode(payload_json);
        let signature = self.compute_signature(&self.encoded_header, &payload_b64);

        Ok(format!("{}.{payload_b64}.{signature}", self.encoded_header))
    }

    /// Compute the base64url HMAC-SHA256 over `header.payload`
    fn compute_signature(&self, header: &str, payload: &str) -> String {
        let signing_input = format!("{header}.{payload}");
        URL_SAFE_NO_PAD.encode(self.hmac_key.sign(signing_input.as_bytes()))
    }
}

/// Split a token into exactly three non-empty segments
fn split_segments(token: &str) -> Result<(&str, &str, &str), TokenError> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None)
            if !header.is_empty() && !payload.is_empty() && !signature.is_empty() =>
        {
            Ok((header, payload, signature))
        }
        _ => Err(TokenError::Malformed),
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("hmac_key", &self.hmac_key)
            .finish_non_exhaustive()
    }
}
