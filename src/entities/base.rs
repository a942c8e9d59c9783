// Base record - identity and timestamps shared by every domain record
//
// Identity (UUID) never changes once assigned; created_at is fixed at
// construction and updated_at only moves forward.

use chrono::{NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Serialized timestamp layout, e.g. `2017-09-28T21:03:54.052298`
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Accepts any number of fractional digits (or none) when reading back.
const TIME_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Current UTC time truncated to the microsecond, the precision of the
/// persisted format.
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(6)
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIME_FORMAT).to_string()
}

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, TIME_PARSE_FORMAT)
}

/// serde adapter for [`TIME_FORMAT`] timestamps
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(de::Error::custom)
    }
}

fn default_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseRecord {
    /// Stable identity (UUID v4)
    #[serde(default = "default_id")]
    pub id: String,

    #[serde(with = "timestamp", default = "now")]
    pub created_at: NaiveDateTime,

    #[serde(with = "timestamp", default = "now")]
    pub updated_at: NaiveDateTime,
}

impl BaseRecord {
    pub fn new() -> Self {
        let now = now();
        BaseRecord {
            id: default_id(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh `updated_at`, never moving it backwards.
    pub fn touch(&mut self) {
        let now = now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

impl Default for BaseRecord {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_new_record_identity() {
        let a = BaseRecord::new();
        let b = BaseRecord::new();

        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 36);
        assert_eq!(a.created_at, a.updated_at);
    }

    #[test]
    fn test_timestamp_format() {
        let ts = parse_timestamp("2017-09-28T21:03:54.052298").unwrap();
        assert_eq!(ts.nanosecond(), 52_298_000);
        assert_eq!(format_timestamp(&ts), "2017-09-28T21:03:54.052298");

        // Whole seconds still render six fractional digits
        let whole = parse_timestamp("2017-09-28T21:03:54").unwrap();
        assert_eq!(format_timestamp(&whole), "2017-09-28T21:03:54.000000");
    }

    #[test]
    fn test_now_is_microsecond_precision() {
        let ts = now();
        assert_eq!(ts.nanosecond() % 1_000, 0);
        assert_eq!(parse_timestamp(&format_timestamp(&ts)).unwrap(), ts);
    }

    #[test]
    fn test_touch_is_monotonic() {
        let mut record = BaseRecord::new();
        let future = record.updated_at + chrono::Duration::hours(1);
        record.updated_at = future;

        record.touch();
        assert_eq!(record.updated_at, future);

        let mut fresh = BaseRecord::new();
        let before = fresh.updated_at;
        std::thread::sleep(std::time::Duration::from_millis(2));
        fresh.touch();
        assert!(fresh.updated_at > before);
        assert!(fresh.updated_at >= fresh.created_at);
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let base: BaseRecord = serde_json::from_value(serde_json::json!({
            "created_at": "2020-01-01T00:00:00.000001",
            "updated_at": "2020-01-02T00:00:00.000001"
        }))
        .unwrap();

        assert!(!base.id.is_empty());
        assert_eq!(format_timestamp(&base.created_at), "2020-01-01T00:00:00.000001");
    }
}
