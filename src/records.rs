//! Returned date fields are ISO-8601 strings; the shaper converts them before
//! these types are deserialized from the native payload.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::types::{DateInput, WeightUnit};

/// Canonical bucketed sample (weight, height, heart rate, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRecord {
    /// Bucket start, ISO-8601
    pub start_date: String,
    /// Bucket end, ISO-8601
    pub end_date: String,
    /// Sample value
    pub value: f64,
    /// Weekday abbreviation of the bucket start, when the native layer provides it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,
    /// Whether the sample was typed in by the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub was_manually_entered: Option<bool>,
}

/// Daily distance in meters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceSample {
    /// Bucket start, ISO-8601
    pub start_date: String,
    /// Bucket end, ISO-8601
    pub end_date: String,
    /// Distance in meters
    pub distance: f64,
    /// Weekday abbreviation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,
}

/// Daily calories expended, in kcal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalorieSample {
    /// Bucket start, ISO-8601
    pub start_date: String,
    /// Bucket end, ISO-8601
    pub end_date: String,
    /// Calories in kcal
    pub calorie: f64,
    /// Weekday abbreviation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,
}

/// Move minutes per bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveMinutesSample {
    /// Bucket start, ISO-8601
    pub start_date: String,
    /// Bucket end, ISO-8601
    pub end_date: String,
    /// Active minutes
    pub duration: f64,
}

/// A raw per-source step interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSample {
    /// Interval start, ISO-8601
    pub start_date: String,
    /// Interval end, ISO-8601
    pub end_date: String,
    /// Steps counted in the interval
    pub steps: f64,
}

/// Steps summed over one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySteps {
    /// Calendar day, `YYYY-MM-DD`
    pub date: String,
    /// Sum of steps recorded on that day
    pub value: f64,
}

/// Step data reported by one data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSourceSamples {
    /// `appPackage[:stream]` of the data source
    pub source: String,
    /// Steps grouped per calendar day
    pub steps: Vec<DailySteps>,
    /// The ungrouped intervals, for callers that need higher resolution
    pub raw_steps: Vec<StepSample>,
}

/// Blood pressure reading in mmHg
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodPressureSample {
    /// Reading start, ISO-8601
    pub start_date: String,
    /// Reading end, ISO-8601
    pub end_date: String,
    /// Systolic pressure
    pub systolic: f64,
    /// Diastolic pressure
    pub diastolic: f64,
    /// Weekday abbreviation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,
}

/// Heart rate summary for one bucket, in beats per minute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartRateSummary {
    /// Bucket start, ISO-8601
    pub start_date: String,
    /// Bucket end, ISO-8601
    pub end_date: String,
    /// Mean rate over the bucket
    pub average: f64,
    /// Lowest rate
    pub min: f64,
    /// Highest rate
    pub max: f64,
    /// Weekday abbreviation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,
    /// Whether the reading was entered by hand
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub was_manually_entered: Option<bool>,
}

/// Water intake as returned by hydration queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HydrationSample {
    /// Time of intake, ISO-8601
    pub date: String,
    /// Volume in liters, formatted with 3 decimals
    pub water_consumed: String,
    /// Package of the app that recorded the intake
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_by: Option<String>,
}

/// Water intake to be saved
#[derive(Debug, Clone, PartialEq)]
pub struct HydrationEntry {
    /// Time of intake
    pub date: DateInput,
    /// Volume in liters
    pub water_consumed: f64,
}

/// Sleep stage reported for a sleep segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SleepStage {
    /// Generic sleep
    #[serde(rename = "sleep")]
    Sleep,
    /// Light sleep
    #[serde(rename = "sleep.light")]
    Light,
    /// Deep sleep
    #[serde(rename = "sleep.deep")]
    Deep,
    /// REM sleep
    #[serde(rename = "sleep.rem")]
    Rem,
    /// Awake during a sleep session
    #[serde(rename = "sleep.awake")]
    Awake,
    /// Any other activity reported inside a sleep session
    #[serde(other)]
    Unknown,
}

impl fmt::Display for SleepStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sleep => write!(f, "Sleep"),
            Self::Light => write!(f, "Light"),
            Self::Deep => write!(f, "Deep"),
            Self::Rem => write!(f, "REM"),
            Self::Awake => write!(f, "Awake"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// One segment of a sleep session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepSample {
    /// Segment start, ISO-8601
    pub start_date: String,
    /// Segment end, ISO-8601
    pub end_date: String,
    /// Sleep stage
    #[serde(rename = "value")]
    pub stage: SleepStage,
}

/// An activity segment with its aggregated metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySample {
    /// Segment start, ISO-8601
    pub start: String,
    /// Segment end, ISO-8601
    pub end: String,
    /// Platform activity name (e.g. `walking`)
    pub activity_name: String,
    /// Calories expended
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    /// Distance in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// Step count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    /// Recording device name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Data source name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    /// Data source id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Whether the segment was tracked automatically
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracked: Option<bool>,
}

/// A workout derived from an activity segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSample {
    /// Workout start, ISO-8601
    pub start: String,
    /// Workout end, ISO-8601
    pub end: String,
    /// Workout category (`walk`, `run`, `yoga`, ...)
    pub workout_type: String,
    /// Calories expended
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
}

/// A workout to be saved
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutEntry {
    /// Platform activity type (e.g. `running`)
    pub activity_type: String,
    /// Workout start
    pub start_date: DateInput,
    /// Workout end
    pub end_date: DateInput,
    /// Calories expended
    pub calories: f64,
}

/// A weight reading to be saved or deleted
#[derive(Debug, Clone, PartialEq)]
pub struct WeightEntry {
    /// Weight in `unit`
    pub value: f64,
    /// Unit of `value`
    pub unit: WeightUnit,
    /// Time of the reading
    pub date: DateInput,
}

/// A height reading in meters
#[derive(Debug, Clone, PartialEq)]
pub struct HeightEntry {
    /// Height in meters
    pub value: f64,
    /// Time of the reading
    pub date: DateInput,
}

/// A blood pressure reading to be saved
#[derive(Debug, Clone, PartialEq)]
pub struct BloodPressureEntry {
    /// Systolic pressure in mmHg
    pub systolic: f64,
    /// Diastolic pressure in mmHg
    pub diastolic: f64,
    /// Time of the reading
    pub date: DateInput,
}

/// Meal type attached to food entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub enum MealType {
    /// Unknown meal
    Unknown = 0,
    /// Breakfast
    Breakfast = 1,
    /// Lunch
    Lunch = 2,
    /// Dinner
    Dinner = 3,
    /// Snack
    Snack = 4,
}

impl From<u8> for MealType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Breakfast,
            2 => Self::Lunch,
            3 => Self::Dinner,
            4 => Self::Snack,
            _ => Self::Unknown,
        }
    }
}

impl From<MealType> for u8 {
    fn from(value: MealType) -> Self {
        value as Self
    }
}

/// Nutrient keys understood by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Nutrient {
    /// Calories in kcal
    #[serde(rename = "calories")]
    Calories,
    /// Total fat in grams
    #[serde(rename = "fat.total")]
    TotalFat,
    /// Saturated fat in grams
    #[serde(rename = "fat.saturated")]
    SaturatedFat,
    /// Unsaturated fat in grams
    #[serde(rename = "fat.unsaturated")]
    UnsaturatedFat,
    /// Polyunsaturated fat in grams
    #[serde(rename = "fat.polyunsaturated")]
    PolyunsaturatedFat,
    /// Monounsaturated fat in grams
    #[serde(rename = "fat.monounsaturated")]
    MonounsaturatedFat,
    /// Trans fat in grams
    #[serde(rename = "fat.trans")]
    TransFat,
    /// Cholesterol in milligrams
    #[serde(rename = "cholesterol")]
    Cholesterol,
    /// Sodium in milligrams
    #[serde(rename = "sodium")]
    Sodium,
    /// Potassium in milligrams
    #[serde(rename = "potassium")]
    Potassium,
    /// Total carbohydrates in grams
    #[serde(rename = "carbs.total")]
    TotalCarbs,
    /// Dietary fiber in grams
    #[serde(rename = "dietary_fiber")]
    DietaryFiber,
    /// Sugar in grams
    #[serde(rename = "sugar")]
    Sugar,
    /// Protein in grams
    #[serde(rename = "protein")]
    Protein,
    /// Vitamin A in IU
    #[serde(rename = "vitamin_a")]
    VitaminA,
    /// Vitamin C in milligrams
    #[serde(rename = "vitamin_c")]
    VitaminC,
    /// Calcium in milligrams
    #[serde(rename = "calcium")]
    Calcium,
    /// Iron in milligrams
    #[serde(rename = "iron")]
    Iron,
}

/// A food entry to be saved
#[derive(Debug, Clone, PartialEq)]
pub struct FoodIntake {
    /// Meal the food belongs to
    pub meal_type: MealType,
    /// Food description
    pub food_name: String,
    /// Nutrient amounts
    pub nutrients: BTreeMap<Nutrient, f64>,
    /// Time of the meal
    pub date: DateInput,
}

/// Nutrients aggregated per day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionSample {
    /// Calendar day, `YYYY-MM-DD`
    pub date: String,
    /// Nutrient totals for the day
    pub nutrients: BTreeMap<Nutrient, f64>,
}

/// Status event emitted on `<TYPE>_RECORDING` channels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingEvent {
    /// Channel name, e.g. `STEP_RECORDING`
    #[serde(rename = "type")]
    pub event_type: String,
    /// Whether the recording subscription is active
    pub recording: bool,
}
