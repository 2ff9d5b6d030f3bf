use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::protocol::Scope;

/// Time unit used when the native layer buckets samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BucketUnit {
    /// Nanoseconds
    Nanosecond,
    /// Microseconds
    Microsecond,
    /// Milliseconds
    Millisecond,
    /// Seconds
    Second,
    /// Minutes
    Minute,
    /// Hours
    Hour,
    /// Days
    Day,
}

impl fmt::Display for BucketUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nanosecond => write!(f, "NANOSECOND"),
            Self::Microsecond => write!(f, "MICROSECOND"),
            Self::Millisecond => write!(f, "MILLISECOND"),
            Self::Second => write!(f, "SECOND"),
            Self::Minute => write!(f, "MINUTE"),
            Self::Hour => write!(f, "HOUR"),
            Self::Day => write!(f, "DAY"),
        }
    }
}

/// Bucketing parameters forwarded to aggregate queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketSpec {
    /// Width of one bucket, in `bucket_unit`s (at least 1)
    pub bucket_interval: u32,
    /// Unit of `bucket_interval`
    pub bucket_unit: BucketUnit,
}

impl Default for BucketSpec {
    fn default() -> Self {
        Self {
            bucket_interval: 1,
            bucket_unit: BucketUnit::Day,
        }
    }
}

/// A caller-supplied point in time
///
/// Strings are parsed the way `Date.parse` reads ISO-8601; numbers are taken
/// as epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    /// Epoch milliseconds
    EpochMillis(f64),
    /// ISO-8601 string
    Iso(String),
    /// An already parsed instant
    Instant(DateTime<Utc>),
}

impl From<&str> for DateInput {
    fn from(value: &str) -> Self {
        Self::Iso(value.to_string())
    }
}

impl From<String> for DateInput {
    fn from(value: String) -> Self {
        Self::Iso(value)
    }
}

impl From<i64> for DateInput {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::EpochMillis(value as f64)
    }
}

impl From<f64> for DateInput {
    fn from(value: f64) -> Self {
        Self::EpochMillis(value)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DateInput {
    fn from(value: DateTime<Tz>) -> Self {
        Self::Instant(value.with_timezone(&Utc))
    }
}

/// Options bag accepted by every query operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    /// Start of the range; defaults to local midnight today
    pub start_date: Option<DateInput>,
    /// End of the range; defaults to now
    pub end_date: Option<DateInput>,
    /// Bucket width; defaults to 1
    pub bucket_interval: Option<u32>,
    /// Bucket unit; defaults to [`BucketUnit::Day`]
    pub bucket_unit: Option<BucketUnit>,
}

impl QueryOptions {
    /// Create empty options (today so far, daily buckets)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the start of the range
    #[must_use]
    pub fn start_date(mut self, date: impl Into<DateInput>) -> Self {
        self.start_date = Some(date.into());
        self
    }

    /// Set the end of the range
    #[must_use]
    pub fn end_date(mut self, date: impl Into<DateInput>) -> Self {
        self.end_date = Some(date.into());
        self
    }

    /// Set the bucketing parameters
    #[must_use]
    pub const fn bucket(mut self, interval: u32, unit: BucketUnit) -> Self {
        self.bucket_interval = Some(interval);
        self.bucket_unit = Some(unit);
        self
    }
}

/// A resolved time range in epoch milliseconds, as the native layer expects
///
/// Values may be `NaN` when the caller passed an unparseable date string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    /// Range start, epoch milliseconds
    pub start_date: f64,
    /// Range end, epoch milliseconds
    pub end_date: f64,
}

/// Weight unit for weight reads and writes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeightUnit {
    /// Kilograms (native storage unit)
    #[default]
    #[serde(rename = "kg")]
    Kilogram,
    /// Pounds
    #[serde(rename = "pound")]
    Pound,
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kilogram => write!(f, "kg"),
            Self::Pound => write!(f, "pound"),
        }
    }
}

/// Imperial weight split into pounds and ounces
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Imperial {
    /// Whole or fractional pounds
    pub pounds: f64,
    /// Additional ounces
    pub ounces: f64,
}

/// Authorization state tracked by the facade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthState {
    /// No grant known
    Unauthorized,
    /// Authorization request issued, outcome pending
    Pending,
    /// Access granted
    Authorized,
    /// Last request was refused or failed
    Failed,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "Unauthorized"),
            Self::Pending => write!(f, "Pending"),
            Self::Authorized => write!(f, "Authorized"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Outcome of an authorization request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeResult {
    /// Whether access was granted
    pub success: bool,
    /// Failure reason, when not granted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AuthorizeResult {
    /// A granted result
    #[must_use]
    pub const fn granted() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// A refused result carrying the reason
    #[must_use]
    pub fn refused(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Bridge configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Scopes requested by `authorize` when the caller passes none
    pub scopes: Vec<Scope>,
    /// Keep the record's offset in returned timestamps instead of normalizing to UTC
    pub local_time_zone: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            scopes: Scope::defaults().to_vec(),
            local_time_zone: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_spec_default() {
        let bucket = BucketSpec::default();
        assert_eq!(bucket.bucket_interval, 1);
        assert_eq!(bucket.bucket_unit, BucketUnit::Day);
    }

    #[test]
    fn test_bucket_unit_wire_names() {
        assert_eq!(
            serde_json::to_value(BucketUnit::Millisecond).unwrap(),
            "MILLISECOND"
        );
        let unit: BucketUnit = serde_json::from_str("\"HOUR\"").unwrap();
        assert_eq!(unit, BucketUnit::Hour);
        assert_eq!(BucketUnit::Minute.to_string(), "MINUTE");
    }

    #[test]
    fn test_date_input_deserializes_numbers_and_strings() {
        let epoch: DateInput = serde_json::from_str("1577836800000").unwrap();
        assert_eq!(epoch, DateInput::EpochMillis(1_577_836_800_000.0));

        let iso: DateInput = serde_json::from_str("\"2020-01-01T00:00:00.000Z\"").unwrap();
        assert_eq!(iso, DateInput::Iso("2020-01-01T00:00:00.000Z".to_string()));
    }

    #[test]
    fn test_query_options_builder() {
        let options = QueryOptions::new()
            .start_date("2020-01-01T00:00:00.000Z")
            .end_date(1_577_923_200_000_i64)
            .bucket(6, BucketUnit::Hour);

        assert!(matches!(options.start_date, Some(DateInput::Iso(_))));
        assert_eq!(
            options.end_date,
            Some(DateInput::EpochMillis(1_577_923_200_000.0))
        );
        assert_eq!(options.bucket_interval, Some(6));
        assert_eq!(options.bucket_unit, Some(BucketUnit::Hour));
    }

    #[test]
    fn test_weight_unit_wire_names() {
        assert_eq!(serde_json::to_value(WeightUnit::Pound).unwrap(), "pound");
        assert_eq!(WeightUnit::default(), WeightUnit::Kilogram);
    }

    #[test]
    fn test_authorize_result_serialization() {
        let granted = serde_json::to_value(AuthorizeResult::granted()).unwrap();
        assert_eq!(granted, serde_json::json!({ "success": true }));

        let refused = serde_json::to_value(AuthorizeResult::refused("cancelled")).unwrap();
        assert_eq!(
            refused,
            serde_json::json!({ "success": false, "message": "cancelled" })
        );
    }

    #[test]
    fn test_bridge_config_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.scopes, Scope::defaults().to_vec());
        assert!(!config.local_time_zone);
    }
}
