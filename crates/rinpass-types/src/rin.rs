//! RIN identifier type
//!
//! Entitlement documents and callers are loose about how they spell an
//! identifier: `42`, `"42"` and `" 42 "` all name the same subscriber. A
//! [`Rin`] is always held in its canonical text form (trimmed), so equality
//! on `Rin` is the comparison used for entitlement lookups.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::RinError;

/// Canonical subscriber identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Rin(String);

impl Rin {
    /// Parse a RIN from caller-supplied text
    pub fn parse(raw: &str) -> Result<Self, RinError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RinError::Blank);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Read a RIN from a JSON value, accepting strings and numbers
    pub fn from_json(value: &Value) -> Result<Self, RinError> {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Number(n) => Self::parse(&number_text(n)),
            Value::Null => Err(RinError::Missing),
            Value::Bool(_) => Err(RinError::InvalidType("boolean")),
            Value::Array(_) => Err(RinError::InvalidType("array")),
            Value::Object(_) => Err(RinError::InvalidType("object")),
        }
    }

    /// Canonical text form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Render a JSON number the way it is written by hand (`42`, not `42.0`)
fn number_text(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        // f64 Display drops a zero fraction
        n.as_f64().map_or_else(|| n.to_string(), |f| f.to_string())
    }
}

impl std::fmt::Display for Rin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Rin {
    type Err = RinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Rin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Rin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}
