//! Persisted key record format.
//!
//! Records are stored as JSON with camelCase field names:
//!
//! ```json
//! {"key":"7QK2-M0ZD-4HNA-X9PE-C31L","hwid":null,"createdAt":1736942400000,"expiresAt":1737028800000,"used":false}
//! ```

use crate::KeywardenError;
use serde::{Deserialize, Serialize};

/// Metadata for one issued key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRecord {
    /// The key itself; also the store lookup key.
    pub key: String,

    /// Bound device identifier, if any.
    #[serde(default)]
    pub hwid: Option<String>,

    /// Creation time (ms since epoch).
    pub created_at: i64,

    /// Expiry time (ms since epoch). Never changes after creation.
    pub expires_at: i64,

    /// Set once a verification has bound a HWID.
    #[serde(default)]
    pub used: bool,
}

impl KeyRecord {
    /// Create a fresh record valid for `duration_secs` from `now_ms`.
    ///
    /// Zero or negative durations produce an already-expired record.
    pub fn new(key: String, hwid: Option<String>, now_ms: i64, duration_secs: i64) -> Self {
        Self::with_lifetime_millis(key, hwid, now_ms, duration_secs.saturating_mul(1000))
    }

    /// Create a fresh record valid for `lifetime_ms` milliseconds from `now_ms`.
    pub fn with_lifetime_millis(
        key: String,
        hwid: Option<String>,
        now_ms: i64,
        lifetime_ms: i64,
    ) -> Self {
        Self {
            key,
            hwid,
            created_at: now_ms,
            expires_at: now_ms.saturating_add(lifetime_ms),
            used: false,
        }
    }

    /// Whether the record has expired at `now_ms`.
    ///
    /// A record is still valid at exactly `expires_at`.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at
    }

    /// Milliseconds left before expiry at `now_ms`.
    pub fn time_left_at(&self, now_ms: i64) -> i64 {
        self.expires_at.saturating_sub(now_ms)
    }

    /// Copy of this record bound to `hwid`.
    pub fn bound_to(&self, hwid: &str) -> Self {
        Self {
            hwid: Some(hwid.to_string()),
            used: true,
            ..self.clone()
        }
    }

    /// Serialize the record to JSON.
    pub fn to_json(&self) -> Result<String, KeywardenError> {
        serde_json::to_string(self)
            .map_err(|e| KeywardenError::Internal(format!("Failed to serialize record: {}", e)))
    }

    /// Deserialize a record from JSON.
    pub fn from_json(json: &str) -> Result<Self, KeywardenError> {
        serde_json::from_str(json).map_err(|e| KeywardenError::CorruptRecord(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_736_942_400_000;

    #[test]
    fn test_new_record_expiry() {
        let record = KeyRecord::new("K".into(), None, NOW, 86_400);
        assert_eq!(record.created_at, NOW);
        assert_eq!(record.expires_at, NOW + 86_400_000);
        assert!(!record.used);
        assert!(record.hwid.is_none());
    }

    #[test]
    fn test_non_positive_duration_is_expired() {
        let zero = KeyRecord::new("K".into(), None, NOW, 0);
        assert!(!zero.is_expired_at(NOW));
        assert!(zero.is_expired_at(NOW + 1));

        let negative = KeyRecord::new("K".into(), None, NOW, -10);
        assert!(negative.is_expired_at(NOW));
        assert_eq!(negative.time_left_at(NOW), -10_000);
    }

    #[test]
    fn test_huge_duration_saturates() {
        let record = KeyRecord::new("K".into(), None, NOW, i64::MAX);
        assert_eq!(record.expires_at, i64::MAX);
        assert!(!record.is_expired_at(NOW));
    }

    #[test]
    fn test_expiry_boundary() {
        let record = KeyRecord::new("K".into(), None, NOW, 1);
        assert!(!record.is_expired_at(NOW + 1000));
        assert!(record.is_expired_at(NOW + 1001));
    }

    #[test]
    fn test_sub_second_lifetime() {
        let record = KeyRecord::with_lifetime_millis("K".into(), None, NOW, 1_500);
        assert_eq!(record.expires_at, NOW + 1_500);
        assert!(!record.is_expired_at(NOW + 1_500));
        assert!(record.is_expired_at(NOW + 1_501));
    }

    #[test]
    fn test_bound_to() {
        let record = KeyRecord::new("K".into(), None, NOW, 60);
        let bound = record.bound_to("DEVICE-A");
        assert_eq!(bound.hwid.as_deref(), Some("DEVICE-A"));
        assert!(bound.used);
        assert_eq!(bound.expires_at, record.expires_at);
        assert_eq!(bound.created_at, record.created_at);
    }

    #[test]
    fn test_json_field_names() {
        let record = KeyRecord::new("K".into(), None, NOW, 60);
        let json = record.to_json().unwrap();
        assert!(json.contains("\"createdAt\":1736942400000"));
        assert!(json.contains("\"expiresAt\":1736942460000"));
        assert!(json.contains("\"hwid\":null"));
        assert!(json.contains("\"used\":false"));
    }

    #[test]
    fn test_from_json_tolerates_missing_optional_fields() {
        let record =
            KeyRecord::from_json(r#"{"key":"K","createdAt":1,"expiresAt":2}"#).unwrap();
        assert!(record.hwid.is_none());
        assert!(!record.used);
    }

    #[test]
    fn test_from_json_malformed() {
        let result = KeyRecord::from_json("{not json");
        assert!(matches!(result, Err(KeywardenError::CorruptRecord(_))));

        let result = KeyRecord::from_json(r#"{"key":"K"}"#);
        assert!(matches!(result, Err(KeywardenError::CorruptRecord(_))));
    }
}
