//! The native layer only understands epoch milliseconds. Missing bounds default
//! to local midnight today and to the current instant; unparseable strings
//! become `NaN`, which is what the platform has always received for them.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use tracing::{debug, warn};

use crate::types::{BucketSpec, DateInput, DateRange, QueryOptions};

/// Resolve the query range against the current time
#[must_use]
pub fn resolve_date_range(options: &QueryOptions) -> DateRange {
    resolve_date_range_at(options, Local::now())
}

/// Resolve the query range against an explicit `now`
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn resolve_date_range_at(options: &QueryOptions, now: DateTime<Local>) -> DateRange {
    let start_date = options
        .start_date
        .as_ref()
        .map_or_else(|| start_of_day(now).timestamp_millis() as f64, to_epoch_millis);
    let end_date = options
        .end_date
        .as_ref()
        .map_or_else(|| now.timestamp_millis() as f64, to_epoch_millis);

    DateRange {
        start_date,
        end_date,
    }
}

/// Resolve the range of a delete call; same defaults, no bucketing
#[must_use]
pub fn resolve_delete_range(options: &QueryOptions) -> DateRange {
    resolve_date_range(options)
}

/// Resolve bucketing parameters, defaulting to one day
#[must_use]
pub fn resolve_bucket_spec(options: &QueryOptions) -> BucketSpec {
    let defaults = BucketSpec::default();
    let bucket_interval = options.bucket_interval.unwrap_or(defaults.bucket_interval);

    if bucket_interval == 0 {
        debug!("Bucket interval 0 raised to 1");
    }

    BucketSpec {
        bucket_interval: bucket_interval.max(1),
        bucket_unit: options.bucket_unit.unwrap_or(defaults.bucket_unit),
    }
}

/// Convert a single date input to epoch milliseconds
///
/// Returns `NaN` for strings that are not ISO-8601.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn to_epoch_millis(date: &DateInput) -> f64 {
    match date {
        DateInput::EpochMillis(millis) => *millis,
        DateInput::Instant(instant) => instant.timestamp_millis() as f64,
        DateInput::Iso(text) => parse_iso_millis(text).map_or_else(
            || {
                warn!("Unparseable date {:?} forwarded as NaN", text);
                f64::NAN
            },
            |millis| millis as f64,
        ),
    }
}

/// Parse an ISO-8601 string into epoch milliseconds
///
/// Follows `Date.parse`: date-only strings (including the reduced `YYYY-MM`
/// and `YYYY` forms) are UTC midnight, date-times without an offset are local
/// time, and seconds may be omitted.
#[must_use]
pub fn parse_iso_millis(text: &str) -> Option<i64> {
    let text = text.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.timestamp_millis());
    }

    if let Ok(parsed) = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(parsed.timestamp_millis());
    }

    let zoned = text
        .strip_suffix('Z')
        .map_or_else(|| text.to_string(), |base| format!("{base}+00:00"));
    for format in ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M%z"] {
        if let Ok(parsed) = DateTime::parse_from_str(&zoned, format) {
            return Some(parsed.timestamp_millis());
        }
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|local| local.timestamp_millis());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| reduced_date(text))
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp_millis())
}

/// `YYYY` or `YYYY-MM`, read as the first day of the period
fn reduced_date(text: &str) -> Option<NaiveDate> {
    let digits =
        |part: &str, len: usize| part.len() == len && part.bytes().all(|b| b.is_ascii_digit());

    match text.split('-').collect::<Vec<_>>().as_slice() {
        [year] if digits(*year, 4) => NaiveDate::from_ymd_opt(year.parse().ok()?, 1, 1),
        [year, month] if digits(*year, 4) && digits(*month, 2) => {
            NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
        }
        _ => None,
    }
}

fn start_of_day(now: DateTime<Local>) -> DateTime<Local> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BucketUnit;
    use chrono::Utc;

    #[test]
    fn test_iso_strings_match_date_parse() {
        let cases = [
            ("2020-01-01T00:00:00.000Z", 1_577_836_800_000_i64),
            ("2020-01-01T00:00:00Z", 1_577_836_800_000),
            ("2020-01-01T01:00:00.000+01:00", 1_577_836_800_000),
            ("2020-01-01T01:00:00.000+0100", 1_577_836_800_000),
            ("2020-01-01T00:00:00.250Z", 1_577_836_800_250),
            ("2020-01-01", 1_577_836_800_000),
            ("2020-01-01T00:00Z", 1_577_836_800_000),
            ("2020-01-01T01:00+01:00", 1_577_836_800_000),
            ("2020-01-01T01:00+0100", 1_577_836_800_000),
            ("2020-01", 1_577_836_800_000),
            ("2020", 1_577_836_800_000),
        ];

        for (text, expected) in cases {
            assert_eq!(parse_iso_millis(text), Some(expected), "parsing {text}");
        }
    }

    #[test]
    fn test_naive_date_time_is_local() {
        let expected = Local
            .with_ymd_and_hms(2020, 3, 10, 8, 30, 0)
            .unwrap()
            .timestamp_millis();
        assert_eq!(parse_iso_millis("2020-03-10T08:30:00"), Some(expected));
        assert_eq!(parse_iso_millis("2020-03-10T08:30"), Some(expected));
    }

    #[test]
    fn test_unparseable_date_becomes_nan() {
        assert!(to_epoch_millis(&DateInput::from("yesterday")).is_nan());
        assert!(parse_iso_millis("2020-13-45").is_none());
        assert!(parse_iso_millis("2020-13").is_none());
        assert!(parse_iso_millis("20201").is_none());
    }

    #[test]
    fn test_epoch_and_instant_inputs() {
        assert_eq!(
            to_epoch_millis(&DateInput::EpochMillis(1_600_000_000_000.0)),
            1_600_000_000_000.0
        );

        let instant = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            to_epoch_millis(&DateInput::from(instant)),
            1_577_836_800_000.0
        );
    }

    #[test]
    fn test_explicit_range_is_passed_through() {
        let options = QueryOptions::new()
            .start_date("2020-01-01T00:00:00.000Z")
            .end_date("2020-01-08T00:00:00.000Z");
        let range = resolve_date_range(&options);

        assert_eq!(range.start_date, 1_577_836_800_000.0);
        assert_eq!(range.end_date, 1_578_441_600_000.0);
    }

    #[test]
    fn test_missing_bounds_default_to_today() {
        let now = Local.with_ymd_and_hms(2021, 6, 15, 13, 45, 10).unwrap();
        let range = resolve_date_range_at(&QueryOptions::new(), now);

        let midnight = Local.with_ymd_and_hms(2021, 6, 15, 0, 0, 0).unwrap();
        assert_eq!(range.start_date, midnight.timestamp_millis() as f64);
        assert_eq!(range.end_date, now.timestamp_millis() as f64);
    }

    #[test]
    fn test_missing_start_is_local_midnight_of_now() {
        let before = Local::now();
        let range = resolve_date_range(&QueryOptions::new());
        let after = Local::now();

        let expected = start_of_day(after).timestamp_millis() as f64;
        // A midnight crossing during the call would move the expected value
        let fallback = start_of_day(before).timestamp_millis() as f64;
        assert!(range.start_date == expected || range.start_date == fallback);
        assert!(range.end_date >= before.timestamp_millis() as f64);
        assert!(range.end_date <= after.timestamp_millis() as f64);
    }

    #[test]
    fn test_bucket_defaults() {
        assert_eq!(
            resolve_bucket_spec(&QueryOptions::new()),
            BucketSpec {
                bucket_interval: 1,
                bucket_unit: BucketUnit::Day,
            }
        );

        let options = QueryOptions::new().bucket(15, BucketUnit::Minute);
        assert_eq!(
            resolve_bucket_spec(&options),
            BucketSpec {
                bucket_interval: 15,
                bucket_unit: BucketUnit::Minute,
            }
        );
    }

    #[test]
    fn test_delete_range_uses_same_dates() {
        let options = QueryOptions::new()
            .start_date(1_000_i64)
            .end_date("2020-01-01T00:00:00.000Z")
            .bucket(2, BucketUnit::Hour);
        let range = resolve_delete_range(&options);

        assert_eq!(range.start_date, 1_000.0);
        assert_eq!(range.end_date, 1_577_836_800_000.0);
    }
}
