//! Cryptographic utilities for token signing
//!
//! This module provides the HMAC key used to sign session tokens and the
//! constant-time comparison used to check them.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Pre-keyed HMAC-SHA256 instance for repeated signing operations.
///
/// Keying HMAC hashes the secret once; cloning the keyed state per
/// signature skips that work on the hot path.
#[derive(Clone)]
pub struct HmacKey {
    mac: Hmac<Sha256>,
    key_length: usize,
}

impl HmacKey {
    /// Key length below which a secret is considered weak (256 bits)
    pub const RECOMMENDED_KEY_LENGTH: usize = 32;

    /// Create a new HMAC key from bytes.
    ///
    /// # Errors
    /// Returns error if the key is empty. Short keys are accepted so that
    /// tokens signed with an existing deployment secret keep verifying; use
    /// [`HmacKey::is_weak`] to warn about them.
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self, HmacKeyError> {
        let key_bytes = key.as_ref();
        if key_bytes.is_empty() {
            return Err(HmacKeyError::Empty);
        }
        let mac = Hmac::<Sha256>::new_from_slice(key_bytes)
            .map_err(|_| HmacKeyError::InvalidLength(key_bytes.len()))?;
        Ok(Self {
            mac,
            key_length: key_bytes.len(),
        })
    }

    /// Whether the key is shorter than [`HmacKey::RECOMMENDED_KEY_LENGTH`]
    pub fn is_weak(&self) -> bool {
        self.key_length < Self::RECOMMENDED_KEY_LENGTH
    }

    /// Sign data and return the MAC bytes
    pub fn sign(&self, data: &[u8]) -> [u8; 32] {
        let mut mac = self.mac.clone();
        mac.update(data);
        mac.finalize().into_bytes().into()
    }
}

impl std::fmt::Debug for HmacKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacKey")
            .field("key_length", &self.key_length)
            .finish_non_exhaustive()
    }
}

/// Errors that can occur when creating an HMAC key
#[derive(Debug, Clone, thiserror::Error)]
pub enum HmacKeyError {
    #[error("HMAC key is empty")]
    Empty,

    #[error("HMAC key of {0} bytes rejected")]
    InvalidLength(usize),
}

/// Constant-time byte slice comparison.
///
/// Returns `false` immediately if lengths differ (length is not secret);
/// otherwise the running time does not depend on where the slices differ.
#[inline]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
