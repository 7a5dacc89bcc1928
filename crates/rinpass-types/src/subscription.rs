//! Subscription types

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{ExpiryError, Rin};

/// Identifier keys in precedence order
pub const RIN_KEYS: [&str; 2] = ["rin", "identifier"];

/// Expiry keys in precedence order
pub const EXPIRY_KEYS: [&str; 4] = ["expiry", "expires_at", "expiry_date", "exp"];

/// One entry of the entitlement document
///
/// Records are read-only: they come from the backing source and are handed
/// back to callers verbatim. Fields other than the identifier and expiry are
/// carried in `extra` without validation.
///
/// Sources name the two required fields inconsistently. On read, the first
/// present key from [`RIN_KEYS`] and [`EXPIRY_KEYS`] wins; any other spelling
/// in the same entry stays in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionRecord {
    /// Subscriber identifier
    pub rin: Rin,
    /// Instant at which the subscription stops being active
    #[serde(serialize_with = "serialize_expiry")]
    pub expiry: DateTime<Utc>,
    /// Pass-through fields (name, plan, notes, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SubscriptionRecord {
    /// Create a record with no extra fields
    pub fn new(rin: Rin, expiry: DateTime<Utc>) -> Self {
        Self {
            rin,
            expiry,
            extra: Map::new(),
        }
    }

    /// Attach a pass-through field
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Check whether the subscription is active at `now`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expiry
    }

    /// Check whether the subscription is active right now
    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }
}

/// Parse an expiry written as RFC 3339, `YYYY-MM-DD`, or Unix seconds text
pub fn parse_expiry(raw: &str) -> Result<DateTime<Utc>, ExpiryError> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }

    if let Ok(secs) = raw.parse::<i64>() {
        return expiry_from_unix(secs);
    }

    Err(ExpiryError::Format(raw.to_string()))
}

/// Convert Unix seconds to an expiry instant
pub fn expiry_from_unix(secs: i64) -> Result<DateTime<Utc>, ExpiryError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or(ExpiryError::OutOfRange(secs))
}

/// Read an expiry from a JSON string or integer
pub fn expiry_from_json(value: &Value) -> Result<DateTime<Utc>, ExpiryError> {
    match value {
        Value::String(s) => parse_expiry(s),
        Value::Number(n) => match n.as_i64() {
            Some(secs) => expiry_from_unix(secs),
            None => Err(ExpiryError::Format(n.to_string())),
        },
        other => Err(ExpiryError::Format(other.to_string())),
    }
}

fn serialize_expiry<S: Serializer>(expiry: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&expiry.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn take_first(fields: &mut Map<String, Value>, keys: &[&str]) -> Option<Value> {
    keys.iter().find_map(|key| fields.remove(*key))
}

impl<'de> Deserialize<'de> for SubscriptionRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::deserialize(deserializer)?;

        let rin = take_first(&mut fields, &RIN_KEYS).ok_or_else(|| D::Error::missing_field("rin"))?;
        let rin = Rin::from_json(&rin).map_err(D::Error::custom)?;

        let expiry =
            take_first(&mut fields, &EXPIRY_KEYS).ok_or_else(|| D::Error::missing_field("expiry"))?;
        let expiry = expiry_from_json(&expiry).map_err(D::Error::custom)?;

        Ok(Self {
            rin,
            expiry,
            extra: fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_is_active_boundary() {
        let now = Utc::now();
        let record = SubscriptionRecord::new(Rin::parse("A1").unwrap(), now);
        // Active strictly before expiry, inactive at the instant itself
        assert!(record.is_active_at(now - Duration::seconds(1)));
        assert!(!record.is_active_at(now));
        assert!(!record.is_active_at(now + Duration::seconds(1)));
    }

    #[test]
    fn test_deserialize_rfc3339_and_extra_fields() {
        let record: SubscriptionRecord = serde_json::from_value(json!({
            "rin": 100200300,
            "expiry": "2030-01-01T00:00:00Z",
            "name": "Acme Trading",
            "plan": "annual"
        }))
        .unwrap();

        assert_eq!(record.rin.as_str(), "100200300");
        assert_eq!(record.expiry, Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(record.extra.get("name"), Some(&json!("Acme Trading")));
        assert_eq!(record.extra.len(), 2);
    }

    #[test]
    fn test_deserialize_aliases() {
        let record: SubscriptionRecord = serde_json::from_value(json!({
            "identifier": "B2",
            "expires_at": "2031-06-30"
        }))
        .unwrap();
        assert_eq!(record.rin.as_str(), "B2");
        assert_eq!(record.expiry, Utc.with_ymd_and_hms(2031, 6, 30, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_deserialize_prefers_canonical_expiry_key() {
        let record: SubscriptionRecord = serde_json::from_value(json!({
            "rin": "B2",
            "expiry": "2030-01-01",
            "expiry_date": "2029-01-01"
        }))
        .unwrap();
        assert_eq!(record.expiry, Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(record.extra.get("expiry_date"), Some(&json!("2029-01-01")));
    }

    #[test]
    fn test_deserialize_human_date_beside_unix_exp() {
        let record: SubscriptionRecord = serde_json::from_value(json!({
            "identifier": "B3",
            "expiry_date": "2031-06-30",
            "exp": 1_900_000_000
        }))
        .unwrap();
        assert_eq!(record.rin.as_str(), "B3");
        assert_eq!(record.expiry, Utc.with_ymd_and_hms(2031, 6, 30, 0, 0, 0).unwrap());
        assert_eq!(record.extra.get("exp"), Some(&json!(1_900_000_000)));
    }

    #[test]
    fn test_deserialize_rin_wins_over_identifier() {
        let record: SubscriptionRecord = serde_json::from_value(json!({
            "rin": "B4",
            "identifier": "legacy-7",
            "expiry": "2030-01-01"
        }))
        .unwrap();
        assert_eq!(record.rin.as_str(), "B4");
        assert_eq!(record.extra.get("identifier"), Some(&json!("legacy-7")));
    }

    #[test]
    fn test_deserialize_rejects_missing_rin() {
        let result =
            serde_json::from_value::<SubscriptionRecord>(json!({"expiry": "2030-01-01"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_unix_seconds() {
        let record: SubscriptionRecord =
            serde_json::from_value(json!({"rin": "C3", "exp": 1_900_000_000})).unwrap();
        assert_eq!(record.expiry.timestamp(), 1_900_000_000);
    }

    #[test]
    fn test_deserialize_rejects_missing_expiry() {
        let result = serde_json::from_value::<SubscriptionRecord>(json!({"rin": "D4"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_rejects_garbage_expiry() {
        let result =
            serde_json::from_value::<SubscriptionRecord>(json!({"rin": "D4", "expiry": "soon"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_roundtrips_extra_fields() {
        let record = SubscriptionRecord::new(
            Rin::parse("E5").unwrap(),
            Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap(),
        )
        .with_extra("name", json!("Nile Imports"));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({"rin": "E5", "expiry": "2030-01-01T12:00:00Z", "name": "Nile Imports"})
        );
    }

    #[test]
    fn test_parse_expiry_formats() {
        assert!(parse_expiry("2030-01-01T00:00:00+02:00").is_ok());
        assert!(parse_expiry("2030-01-01").is_ok());
        assert!(parse_expiry("1900000000").is_ok());
        assert!(matches!(parse_expiry("next week"), Err(ExpiryError::Format(_))));
    }
}
