//! The native layer answers with arrays of loosely typed maps. Dates arrive as
//! epoch milliseconds or as `yyyy-MM-dd'T'HH:mm:ss.SSSZ` strings and leave as
//! ISO-8601 with milliseconds.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::{
    error::{FitError, Result},
    normalize::parse_iso_millis,
    records::{DailySteps, HydrationSample, NutritionSample, StepSample, StepSourceSamples},
    types::Imperial,
};

/// A raw record as delivered by the native layer
pub type RawRecord = Map<String, Value>;

/// Kilograms to pounds factor
pub const KG_TO_LBS: f64 = 2.2046;

/// Pounds to kilograms factor
pub const LBS_TO_KG: f64 = 0.453_592_37;

const DEFAULT_DATE_FIELDS: &[&str] = &["startDate", "endDate"];

/// Convert kilograms to pounds
#[must_use]
pub fn kg_to_lbs(kilograms: f64) -> f64 {
    kilograms * KG_TO_LBS
}

/// Convert pounds and ounces to kilograms
#[must_use]
pub fn lbs_and_oz_to_kg(imperial: Imperial) -> f64 {
    let pounds = imperial.pounds + imperial.ounces / 16.0;
    pounds * LBS_TO_KG
}

/// Format a water volume with exactly 3 decimals
#[must_use]
pub fn format_water_volume(liters: f64) -> String {
    format!("{liters:.3}")
}

/// Split a native array payload into records
///
/// `null` entries are placeholders for empty buckets and are skipped; a `null`
/// payload is an empty result.
///
/// # Errors
///
/// Returns [`FitError::InvalidResponse`] if the payload is neither an array nor `null`.
pub fn collect_records(payload: Value) -> Result<Vec<RawRecord>> {
    match payload {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(record) => Some(record),
                Value::Null => None,
                other => {
                    warn!("Skipping non-object record: {}", other);
                    None
                }
            })
            .collect()),
        Value::Null => Ok(Vec::new()),
        other => Err(FitError::InvalidResponse(format!(
            "expected an array of records, got {other}"
        ))),
    }
}

/// Filters records by a presence key and rewrites their date fields as ISO-8601
#[derive(Debug, Clone, Copy)]
pub struct ResponseShaper<'a> {
    presence_key: &'a str,
    date_fields: &'a [&'a str],
    local_time_zone: bool,
}

impl<'a> ResponseShaper<'a> {
    /// Shaper keeping records that carry `presence_key`
    #[must_use]
    pub const fn new(presence_key: &'a str) -> Self {
        Self {
            presence_key,
            date_fields: DEFAULT_DATE_FIELDS,
            local_time_zone: false,
        }
    }

    /// Override the date fields to rewrite (default `startDate`, `endDate`)
    #[must_use]
    pub const fn date_fields(mut self, fields: &'a [&'a str]) -> Self {
        self.date_fields = fields;
        self
    }

    /// Keep the offset of each timestamp instead of normalizing to UTC
    #[must_use]
    pub const fn local_time_zone(mut self, enabled: bool) -> Self {
        self.local_time_zone = enabled;
        self
    }

    /// Shape raw records
    #[must_use]
    pub fn shape(&self, records: Vec<RawRecord>) -> Vec<RawRecord> {
        records
            .into_iter()
            .filter(|record| has_value(record, self.presence_key))
            .filter_map(|mut record| {
                for field in self.date_fields {
                    let Some(raw) = record.get(*field) else {
                        continue;
                    };
                    let Some(iso) = format_iso(raw, self.local_time_zone) else {
                        warn!("Dropping record with unreadable {}: {}", field, raw);
                        return None;
                    };
                    record.insert((*field).to_string(), Value::String(iso));
                }
                Some(record)
            })
            .collect()
    }

    /// Shape a native payload and deserialize each surviving record
    ///
    /// # Errors
    ///
    /// Returns [`FitError::InvalidResponse`] for a malformed payload or
    /// [`FitError::Json`] if a shaped record does not match `T`.
    pub fn shape_into<T: DeserializeOwned>(&self, payload: Value) -> Result<Vec<T>> {
        let shaped = self.shape(collect_records(payload)?);
        debug!(
            "Shaped {} record(s) keyed by {}",
            shaped.len(),
            self.presence_key
        );

        shaped
            .into_iter()
            .map(|record| serde_json::from_value(Value::Object(record)).map_err(FitError::from))
            .collect()
    }
}

/// Sum step intervals per local calendar day of their `startDate`
#[must_use]
pub fn build_daily_steps(steps: &[RawRecord]) -> Vec<DailySteps> {
    let mut per_day: BTreeMap<String, f64> = BTreeMap::new();

    for step in steps {
        let Some(day) = step.get("startDate").and_then(local_day) else {
            debug!("Skipping step record without a readable startDate");
            continue;
        };
        let count = step.get("steps").and_then(Value::as_f64).unwrap_or(0.0);
        *per_day.entry(day).or_insert(0.0) += count;
    }

    per_day
        .into_iter()
        .map(|(date, value)| DailySteps { date, value })
        .collect()
}

/// Shape the per-source step payload
///
/// Each entry keeps its raw intervals next to the per-day totals.
///
/// # Errors
///
/// Returns [`FitError::InvalidResponse`] for a malformed payload or
/// [`FitError::Json`] if a step interval is not numeric.
pub fn shape_step_sources(payload: Value, local_time_zone: bool) -> Result<Vec<StepSourceSamples>> {
    let shaper = ResponseShaper::new("steps").local_time_zone(local_time_zone);

    collect_records(payload)?
        .into_iter()
        .map(|mut entry| -> Result<StepSourceSamples> {
            let source = source_label(entry.get("source"));
            let steps = collect_records(entry.remove("steps").unwrap_or(Value::Null))?;
            let daily = build_daily_steps(&steps);
            let raw_steps = shaper
                .shape(steps)
                .into_iter()
                .map(|record| serde_json::from_value::<StepSample>(Value::Object(record)))
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(StepSourceSamples {
                source,
                steps: daily,
                raw_steps,
            })
        })
        .collect()
}

/// Shape hydration records: ISO `date`, volume to 3 decimals
///
/// # Errors
///
/// Returns [`FitError::InvalidResponse`] for a malformed payload.
pub fn shape_hydration(payload: Value, local_time_zone: bool) -> Result<Vec<HydrationSample>> {
    Ok(collect_records(payload)?
        .into_iter()
        .filter_map(|record| {
            let liters = record.get("waterConsumed").and_then(number)?;
            let date = record
                .get("date")
                .and_then(|raw| format_iso(raw, local_time_zone))?;
            let added_by = record
                .get("addedBy")
                .and_then(Value::as_str)
                .map(str::to_string);

            Some(HydrationSample {
                date,
                water_consumed: format_water_volume(liters),
                added_by,
            })
        })
        .collect())
}

/// Shape daily nutrition records: only `date` is rewritten, to `YYYY-MM-DD`
///
/// # Errors
///
/// Returns [`FitError::InvalidResponse`] for a malformed payload or
/// [`FitError::Json`] if a nutrient map does not match the known nutrients.
pub fn shape_daily_nutrition(payload: Value) -> Result<Vec<NutritionSample>> {
    collect_records(payload)?
        .into_iter()
        .filter(|record| has_value(record, "nutrients"))
        .filter_map(|mut record| {
            let day = record.get("date").and_then(calendar_day);
            if day.is_none() {
                warn!("Dropping nutrition record without a readable date");
            }
            record.insert("date".to_string(), Value::String(day?));
            Some(record)
        })
        .map(|record| serde_json::from_value(Value::Object(record)).map_err(FitError::from))
        .collect()
}

/// Format a native date value as ISO-8601 with milliseconds
///
/// In UTC mode the result ends in `Z`; in local mode strings keep their own
/// offset and epochs take the host offset.
#[must_use]
pub fn format_iso(raw: &Value, local_time_zone: bool) -> Option<String> {
    match raw {
        Value::Number(_) => {
            let instant = instant_from_millis(raw.as_f64()?)?;
            Some(if local_time_zone {
                instant
                    .with_timezone(&Local)
                    .to_rfc3339_opts(SecondsFormat::Millis, true)
            } else {
                instant.to_rfc3339_opts(SecondsFormat::Millis, true)
            })
        }
        Value::String(text) => {
            if let Some(parsed) = parse_offset_date(text) {
                return Some(if local_time_zone {
                    parsed.to_rfc3339_opts(SecondsFormat::Millis, true)
                } else {
                    parsed
                        .with_timezone(&Utc)
                        .to_rfc3339_opts(SecondsFormat::Millis, true)
                });
            }
            #[allow(clippy::cast_precision_loss)]
            let millis = parse_iso_millis(text)? as f64;
            format_iso(&Value::from(millis), local_time_zone)
        }
        _ => None,
    }
}

fn parse_offset_date(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
}

#[allow(clippy::cast_possible_truncation)]
fn instant_from_millis(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() {
        return None;
    }
    Utc.timestamp_millis_opt(millis as i64).single()
}

fn epoch_millis(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(_) => raw.as_f64(),
        #[allow(clippy::cast_precision_loss)]
        Value::String(text) => parse_iso_millis(text).map(|millis| millis as f64),
        _ => None,
    }
}

fn local_day(raw: &Value) -> Option<String> {
    let instant = instant_from_millis(epoch_millis(raw)?)?;
    Some(instant.with_timezone(&Local).format("%Y-%m-%d").to_string())
}

fn calendar_day(raw: &Value) -> Option<String> {
    if let Value::String(text) = raw {
        if NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok() {
            return Some(text.clone());
        }
    }
    local_day(raw)
}

fn number(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(_) => raw.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn has_value(record: &RawRecord, key: &str) -> bool {
    record.get(key).is_some_and(|value| !value.is_null())
}

/// `appPackage[:stream]` of a step source
///
/// A missing or `null` package is labelled `unknown` rather than the literal
/// `null`/`undefined` text a string concatenation would produce.
fn source_label(source: Option<&Value>) -> String {
    let package = source
        .and_then(|s| s.get("appPackage"))
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    match source
        .and_then(|s| s.get("stream"))
        .and_then(Value::as_str)
        .filter(|stream| !stream.is_empty())
    {
        Some(stream) => format!("{package}:{stream}"),
        None => package.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::SampleRecord;
    use serde_json::json;

    fn local_millis(year: i32, month: u32, day: u32, hour: u32) -> i64 {
        Local
            .with_ymd_and_hms(year, month, day, hour, 0, 0)
            .unwrap()
            .timestamp_millis()
    }

    fn record(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_weight_round_trip() {
        for pounds in [0.0, 1.0, 70.0, 500.0] {
            let kilograms = lbs_and_oz_to_kg(Imperial {
                pounds,
                ounces: 0.0,
            });
            let back = kg_to_lbs(kilograms);
            assert!(
                (back - pounds).abs() < 0.01,
                "{pounds} lbs came back as {back}"
            );
        }
    }

    #[test]
    fn test_ounces_are_sixteenths() {
        let kilograms = lbs_and_oz_to_kg(Imperial {
            pounds: 1.0,
            ounces: 8.0,
        });
        assert!((kilograms - 1.5 * 0.453_592_37).abs() < f64::EPSILON);
    }

    #[test]
    fn test_format_water_volume() {
        assert_eq!(format_water_volume(1.0), "1.000");
        assert_eq!(format_water_volume(0.333_333), "0.333");
        assert_eq!(format_water_volume(2.5), "2.500");
    }

    #[test]
    fn test_presence_key_filters_placeholders() {
        let payload = json!([
            { "startDate": 1_577_836_800_000_i64, "endDate": 1_577_923_200_000_i64, "day": "Wed" },
            { "startDate": 1_577_923_200_000_i64, "endDate": 1_578_009_600_000_i64, "value": 71.3, "day": "Thu" }
        ]);

        let samples: Vec<SampleRecord> = ResponseShaper::new("value").shape_into(payload).unwrap();

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].start_date, "2020-01-02T00:00:00.000Z");
        assert_eq!(samples[0].end_date, "2020-01-03T00:00:00.000Z");
        assert!((samples[0].value - 71.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_null_presence_value_is_absent() {
        let records = vec![
            record(json!({ "startDate": 0, "endDate": 0, "distance": null })),
            record(json!({ "startDate": 0, "endDate": 0, "distance": 0 })),
        ];
        let shaped = ResponseShaper::new("distance").shape(records);
        assert_eq!(shaped.len(), 1);
        assert_eq!(shaped[0]["startDate"], json!("1970-01-01T00:00:00.000Z"));
    }

    #[test]
    fn test_offset_strings_normalize_to_utc() {
        let raw = json!("2021-03-01T23:30:00.000+0100");
        assert_eq!(
            format_iso(&raw, false).as_deref(),
            Some("2021-03-01T22:30:00.000Z")
        );
        assert_eq!(
            format_iso(&raw, true).as_deref(),
            Some("2021-03-01T23:30:00.000+01:00")
        );
    }

    #[test]
    fn test_local_mode_keeps_instant() {
        let iso = format_iso(&json!(1_577_836_800_000_i64), true).unwrap();
        let parsed = DateTime::parse_from_rfc3339(&iso).unwrap();
        assert_eq!(parsed.timestamp_millis(), 1_577_836_800_000);
    }

    #[test]
    fn test_unreadable_date_drops_record() {
        let shaped = ResponseShaper::new("value").shape(vec![record(
            json!({ "startDate": "soon", "endDate": 0, "value": 1 }),
        )]);
        assert!(shaped.is_empty());
    }

    #[test]
    fn test_custom_date_fields() {
        let payload = json!([{ "start": 0, "end": 60_000, "workoutType": "run", "calories": 12.0 }]);
        let shaped = ResponseShaper::new("workoutType")
            .date_fields(&["start", "end"])
            .shape(collect_records(payload).unwrap());

        assert_eq!(shaped[0]["start"], json!("1970-01-01T00:00:00.000Z"));
        assert_eq!(shaped[0]["end"], json!("1970-01-01T00:01:00.000Z"));
    }

    #[test]
    fn test_collect_records_rejects_objects() {
        assert!(collect_records(json!({ "value": 1 })).is_err());
        assert!(collect_records(Value::Null).unwrap().is_empty());
        assert_eq!(collect_records(json!([null, { "a": 1 }])).unwrap().len(), 1);
    }

    #[test]
    fn test_build_daily_steps_groups_by_day() {
        let steps = vec![
            record(json!({ "startDate": local_millis(2021, 5, 3, 8), "steps": 1200 })),
            record(json!({ "startDate": local_millis(2021, 5, 3, 18), "steps": 800 })),
            record(json!({ "startDate": local_millis(2021, 5, 4, 9), "steps": 4321 })),
        ];

        let daily = build_daily_steps(&steps);

        assert_eq!(
            daily,
            vec![
                DailySteps {
                    date: "2021-05-03".to_string(),
                    value: 2000.0,
                },
                DailySteps {
                    date: "2021-05-04".to_string(),
                    value: 4321.0,
                },
            ]
        );
    }

    #[test]
    fn test_step_sources_keep_raw_intervals() {
        let payload = json!([{
            "source": { "appPackage": "com.google.android.gms", "stream": "estimated_steps" },
            "steps": [
                { "startDate": local_millis(2021, 5, 3, 8), "endDate": local_millis(2021, 5, 3, 9), "steps": 10 },
                null,
                { "startDate": local_millis(2021, 5, 4, 8), "endDate": local_millis(2021, 5, 4, 9), "steps": 20 }
            ]
        }, {
            "source": { "appPackage": "com.fitness.app" },
            "steps": []
        }]);

        let sources = shape_step_sources(payload, false).unwrap();

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].source, "com.google.android.gms:estimated_steps");
        assert_eq!(sources[0].steps.len(), 2);
        assert_eq!(sources[0].raw_steps.len(), 2);
        assert!(sources[0].raw_steps[0].start_date.ends_with('Z'));
        assert_eq!(sources[1].source, "com.fitness.app");
        assert!(sources[1].steps.is_empty());
    }

    #[test]
    fn test_source_label_without_package() {
        let null_package = json!({ "appPackage": null, "stream": "merge_step_deltas" });
        assert_eq!(
            source_label(Some(&null_package)),
            "unknown:merge_step_deltas"
        );
        assert_eq!(source_label(Some(&json!({ "stream": "" }))), "unknown");
        assert_eq!(source_label(None), "unknown");
    }

    #[test]
    fn test_shape_hydration() {
        let payload = json!([
            { "date": 1_577_836_800_000_i64, "waterConsumed": 0.25, "addedBy": "com.water.app" },
            { "date": 1_577_836_900_000_i64 }
        ]);

        let samples = shape_hydration(payload, false).unwrap();

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].date, "2020-01-01T00:00:00.000Z");
        assert_eq!(samples[0].water_consumed, "0.250");
        assert_eq!(samples[0].added_by.as_deref(), Some("com.water.app"));
    }

    #[test]
    fn test_shape_daily_nutrition_only_rewrites_date() {
        let payload = json!([
            {
                "date": local_millis(2021, 2, 14, 12),
                "startDate": local_millis(2021, 2, 14, 0),
                "endDate": local_millis(2021, 2, 15, 0),
                "nutrients": { "calories": 640.0, "protein": 31.5 }
            },
            { "date": "2021-02-15", "nutrients": { "sugar": 12.0 } },
            { "date": "2021-02-16" }
        ]);

        let samples = shape_daily_nutrition(payload).unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].date, "2021-02-14");
        assert_eq!(samples[0].nutrients.len(), 2);
        assert_eq!(samples[1].date, "2021-02-15");
    }
}
