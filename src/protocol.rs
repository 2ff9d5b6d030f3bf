//! Every date carried by a [`NativeRequest`] is an epoch-millisecond number;
//! the facade converts caller input before a request is built.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

use crate::{
    records::{MealType, Nutrient},
    types::{BucketSpec, DateRange},
};

/// OAuth scopes the native module can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Scope {
    /// Read activity data
    ActivityRead,
    /// Read and write activity data
    ActivityReadWrite,
    /// Read location data
    LocationRead,
    /// Read and write location data
    LocationReadWrite,
    /// Read body data
    BodyRead,
    /// Read and write body data
    BodyReadWrite,
    /// Read nutrition data
    NutritionRead,
    /// Read and write nutrition data
    NutritionReadWrite,
    /// Read blood pressure data
    BloodPressureRead,
    /// Read and write blood pressure data
    BloodPressureReadWrite,
    /// Read blood glucose data
    BloodGlucoseRead,
    /// Read and write blood glucose data
    BloodGlucoseReadWrite,
    /// Read oxygen saturation data
    OxygenSaturationRead,
    /// Read and write oxygen saturation data
    OxygenSaturationReadWrite,
    /// Read body temperature data
    BodyTemperatureRead,
    /// Read and write body temperature data
    BodyTemperatureReadWrite,
    /// Read reproductive health data
    ReproductiveHealthRead,
    /// Read and write reproductive health data
    ReproductiveHealthReadWrite,
}

const SCOPES: [Scope; 18] = [
    Scope::ActivityRead,
    Scope::ActivityReadWrite,
    Scope::LocationRead,
    Scope::LocationReadWrite,
    Scope::BodyRead,
    Scope::BodyReadWrite,
    Scope::NutritionRead,
    Scope::NutritionReadWrite,
    Scope::BloodPressureRead,
    Scope::BloodPressureReadWrite,
    Scope::BloodGlucoseRead,
    Scope::BloodGlucoseReadWrite,
    Scope::OxygenSaturationRead,
    Scope::OxygenSaturationReadWrite,
    Scope::BodyTemperatureRead,
    Scope::BodyTemperatureReadWrite,
    Scope::ReproductiveHealthRead,
    Scope::ReproductiveHealthReadWrite,
];

impl Scope {
    /// Scopes requested when the caller does not name any
    #[must_use]
    pub const fn defaults() -> &'static [Self] {
        &[Self::ActivityRead, Self::BodyReadWrite, Self::LocationRead]
    }

    /// The OAuth scope URL
    #[must_use]
    pub const fn url(self) -> &'static str {
        match self {
            Self::ActivityRead => "https://www.googleapis.com/auth/fitness.activity.read",
            Self::ActivityReadWrite => "https://www.googleapis.com/auth/fitness.activity.write",
            Self::LocationRead => "https://www.googleapis.com/auth/fitness.location.read",
            Self::LocationReadWrite => "https://www.googleapis.com/auth/fitness.location.write",
            Self::BodyRead => "https://www.googleapis.com/auth/fitness.body.read",
            Self::BodyReadWrite => "https://www.googleapis.com/auth/fitness.body.write",
            Self::NutritionRead => "https://www.googleapis.com/auth/fitness.nutrition.read",
            Self::NutritionReadWrite => "https://www.googleapis.com/auth/fitness.nutrition.write",
            Self::BloodPressureRead => {
                "https://www.googleapis.com/auth/fitness.blood_pressure.read"
            }
            Self::BloodPressureReadWrite => {
                "https://www.googleapis.com/auth/fitness.blood_pressure.write"
            }
            Self::BloodGlucoseRead => "https://www.googleapis.com/auth/fitness.blood_glucose.read",
            Self::BloodGlucoseReadWrite => {
                "https://www.googleapis.com/auth/fitness.blood_glucose.write"
            }
            Self::OxygenSaturationRead => {
                "https://www.googleapis.com/auth/fitness.oxygen_saturation.read"
            }
            Self::OxygenSaturationReadWrite => {
                "https://www.googleapis.com/auth/fitness.oxygen_saturation.write"
            }
            Self::BodyTemperatureRead => {
                "https://www.googleapis.com/auth/fitness.body_temperature.read"
            }
            Self::BodyTemperatureReadWrite => {
                "https://www.googleapis.com/auth/fitness.body_temperature.write"
            }
            Self::ReproductiveHealthRead => {
                "https://www.googleapis.com/auth/fitness.reproductive_health.read"
            }
            Self::ReproductiveHealthReadWrite => {
                "https://www.googleapis.com/auth/fitness.reproductive_health.write"
            }
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url())
    }
}

impl From<Scope> for String {
    fn from(value: Scope) -> Self {
        value.url().to_string()
    }
}

impl TryFrom<String> for Scope {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SCOPES
            .iter()
            .copied()
            .find(|scope| scope.url() == value)
            .ok_or_else(|| format!("Unknown fitness scope: {value}"))
    }
}

/// Data types the recording API can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingType {
    /// Step count deltas
    Step,
    /// Distance deltas (requires fine location)
    Distance,
    /// Activity segments
    Activity,
}

impl RecordingType {
    /// Name of the event channel reporting this type's recording status
    #[must_use]
    pub const fn event_name(self) -> &'static str {
        match self {
            Self::Step => "STEP_RECORDING",
            Self::Distance => "DISTANCE_RECORDING",
            Self::Activity => "ACTIVITY_RECORDING",
        }
    }
}

impl fmt::Display for RecordingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step => write!(f, "step"),
            Self::Distance => write!(f, "distance"),
            Self::Activity => write!(f, "activity"),
        }
    }
}

/// Named event channels the native module emits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventChannel {
    /// Live step counter updates
    StepChanged,
    /// Step history changes
    StepHistoryChanged,
    /// Authorization granted
    AuthorizeSuccess,
    /// Authorization refused or failed
    AuthorizeFailure,
    /// Recording status for one data type
    Recording(RecordingType),
}

impl EventChannel {
    /// Wire name of the channel
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::StepChanged => "StepChangedEvent",
            Self::StepHistoryChanged => "StepHistoryChangedEvent",
            Self::AuthorizeSuccess => "GoogleFitAuthorizeSuccess",
            Self::AuthorizeFailure => "GoogleFitAuthorizeFailure",
            Self::Recording(data_type) => data_type.event_name(),
        }
    }
}

impl fmt::Display for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Device permissions checked before capability-dependent calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Fine location, needed for distance recording
    FineLocation,
    /// Physical activity recognition
    ActivityRecognition,
}

impl Permission {
    /// Android permission identifier
    #[must_use]
    pub const fn android_name(self) -> &'static str {
        match self {
            Self::FineLocation => "android.permission.ACCESS_FINE_LOCATION",
            Self::ActivityRecognition => "android.permission.ACTIVITY_RECOGNITION",
        }
    }
}

/// Answer to a permission prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    /// The user allowed access
    Granted,
    /// The user refused access
    Denied,
    /// The user refused and asked not to be prompted again
    NeverAskAgain,
}

impl PermissionStatus {
    /// Whether access was granted
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Hydration payload sent to the native layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HydrationPayload {
    /// Time of intake, epoch milliseconds
    pub date: i64,
    /// Volume in liters, formatted with 3 decimals
    pub water_consumed: String,
}

/// A request to the native fitness module
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum NativeRequest {
    /// Whether the fitness app is installed
    IsAvailable,
    /// Whether fitness permissions are granted
    IsEnabled,
    /// Launch the fitness app
    OpenFit,
    /// Query the current grant status
    IsAuthorized,
    /// Request access for the given scope URLs
    Authorize {
        /// Scope URLs
        scopes: Vec<Scope>,
    },
    /// Revoke the session
    Disconnect,
    /// Subscribe the recording API to data types
    StartFitnessRecording {
        /// Data types to record
        data_types: Vec<RecordingType>,
    },
    /// Start live step sensor updates
    ObserveSteps,
    /// Per-source step history
    GetDailyStepCountSamples {
        /// Time range
        #[serde(flatten)]
        range: DateRange,
        /// Bucketing
        #[serde(flatten)]
        bucket: BucketSpec,
    },
    /// Daily distance
    GetDailyDistanceSamples {
        /// Time range
        #[serde(flatten)]
        range: DateRange,
        /// Bucketing
        #[serde(flatten)]
        bucket: BucketSpec,
    },
    /// Activity segments
    GetActivitySamples {
        /// Time range
        #[serde(flatten)]
        range: DateRange,
        /// Bucketing
        #[serde(flatten)]
        bucket: BucketSpec,
    },
    /// Move minutes
    GetMoveMinutes {
        /// Time range
        #[serde(flatten)]
        range: DateRange,
        /// Bucketing
        #[serde(flatten)]
        bucket: BucketSpec,
    },
    /// Daily calories
    GetDailyCalorieSamples {
        /// Time range
        #[serde(flatten)]
        range: DateRange,
        /// Bucketing
        #[serde(flatten)]
        bucket: BucketSpec,
        /// Subtract the basal metabolic rate
        basal: bool,
    },
    /// Daily nutrition totals
    GetDailyNutritionSamples {
        /// Time range
        #[serde(flatten)]
        range: DateRange,
        /// Bucketing
        #[serde(flatten)]
        bucket: BucketSpec,
    },
    /// Weight in kilograms
    GetWeightSamples {
        /// Time range
        #[serde(flatten)]
        range: DateRange,
        /// Bucketing
        #[serde(flatten)]
        bucket: BucketSpec,
    },
    /// Height in meters
    GetHeightSamples {
        /// Time range
        #[serde(flatten)]
        range: DateRange,
    },
    /// Heart rate in bpm
    GetHeartRateSamples {
        /// Time range
        #[serde(flatten)]
        range: DateRange,
        /// Bucketing
        #[serde(flatten)]
        bucket: BucketSpec,
    },
    /// Heart rate average, minimum and maximum per bucket
    GetAggregatedHeartRateSamples {
        /// Time range
        #[serde(flatten)]
        range: DateRange,
        /// Bucketing
        #[serde(flatten)]
        bucket: BucketSpec,
    },
    /// Resting heart rate in bpm
    GetRestingHeartRateSamples {
        /// Time range
        #[serde(flatten)]
        range: DateRange,
        /// Bucketing
        #[serde(flatten)]
        bucket: BucketSpec,
    },
    /// Blood pressure readings
    GetBloodPressureSamples {
        /// Time range
        #[serde(flatten)]
        range: DateRange,
        /// Bucketing
        #[serde(flatten)]
        bucket: BucketSpec,
    },
    /// Water intake
    GetHydrationSamples {
        /// Time range
        #[serde(flatten)]
        range: DateRange,
    },
    /// Sleep segments
    GetSleepSamples {
        /// Time range
        #[serde(flatten)]
        range: DateRange,
    },
    /// Workouts
    GetWorkoutSamples {
        /// Time range
        #[serde(flatten)]
        range: DateRange,
    },
    /// Save a weight reading
    SaveWeight {
        /// Weight in kilograms
        value: f64,
        /// Epoch milliseconds
        date: f64,
    },
    /// Delete weight readings in a range
    DeleteWeight {
        /// Time range
        #[serde(flatten)]
        range: DateRange,
    },
    /// Save a height reading
    SaveHeight {
        /// Height in meters
        value: f64,
        /// Epoch milliseconds
        date: f64,
    },
    /// Delete height readings in a range
    DeleteHeight {
        /// Time range
        #[serde(flatten)]
        range: DateRange,
    },
    /// Save water intake entries
    SaveHydration {
        /// Entries to insert
        samples: Vec<HydrationPayload>,
    },
    /// Delete water intake in a range
    DeleteHydration {
        /// Time range
        #[serde(flatten)]
        range: DateRange,
    },
    /// Save a food entry
    SaveFood {
        /// Meal type
        meal_type: MealType,
        /// Food description
        food_name: String,
        /// Nutrient amounts
        nutrients: BTreeMap<Nutrient, f64>,
        /// Epoch milliseconds
        date: f64,
    },
    /// Replace the food entries recorded at `date`
    UpdateFood {
        /// Meal type
        meal_type: MealType,
        /// Food description
        food_name: String,
        /// Nutrient amounts
        nutrients: BTreeMap<Nutrient, f64>,
        /// Epoch milliseconds
        date: f64,
    },
    /// Delete food entries in a range
    DeleteFood {
        /// Time range
        #[serde(flatten)]
        range: DateRange,
    },
    /// Save a blood pressure reading
    SaveBloodPressure {
        /// Systolic pressure in mmHg
        systolic: f64,
        /// Diastolic pressure in mmHg
        diastolic: f64,
        /// Epoch milliseconds
        date: f64,
    },
    /// Save a workout session
    SaveWorkout {
        /// Platform activity type
        activity_type: String,
        /// Time range
        #[serde(flatten)]
        range: DateRange,
        /// Calories expended
        calories: f64,
    },
    /// Delete workout sessions in a range
    DeleteWorkout {
        /// Time range
        #[serde(flatten)]
        range: DateRange,
    },
}

impl NativeRequest {
    /// Native method name the request maps to
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::IsAvailable => "isAvailable",
            Self::IsEnabled => "isEnabled",
            Self::OpenFit => "openFit",
            Self::IsAuthorized => "isAuthorized",
            Self::Authorize { .. } => "authorize",
            Self::Disconnect => "disconnect",
            Self::StartFitnessRecording { .. } => "startFitnessRecording",
            Self::ObserveSteps => "observeSteps",
            Self::GetDailyStepCountSamples { .. } => "getDailyStepCountSamples",
            Self::GetDailyDistanceSamples { .. } => "getDailyDistanceSamples",
            Self::GetActivitySamples { .. } => "getActivitySamples",
            Self::GetMoveMinutes { .. } => "getMoveMinutes",
            Self::GetDailyCalorieSamples { .. } => "getDailyCalorieSamples",
            Self::GetDailyNutritionSamples { .. } => "getDailyNutritionSamples",
            Self::GetWeightSamples { .. } => "getWeightSamples",
            Self::GetHeightSamples { .. } => "getHeightSamples",
            Self::GetHeartRateSamples { .. } => "getHeartRateSamples",
            Self::GetAggregatedHeartRateSamples { .. } => "getAggregatedHeartRateSamples",
            Self::GetRestingHeartRateSamples { .. } => "getRestingHeartRateSamples",
            Self::GetBloodPressureSamples { .. } => "getBloodPressureSamples",
            Self::GetHydrationSamples { .. } => "getHydrationSamples",
            Self::GetSleepSamples { .. } => "getSleepSamples",
            Self::GetWorkoutSamples { .. } => "getWorkoutSamples",
            Self::SaveWeight { .. } => "saveWeight",
            Self::DeleteWeight { .. } => "deleteWeight",
            Self::SaveHeight { .. } => "saveHeight",
            Self::DeleteHeight { .. } => "deleteHeight",
            Self::SaveHydration { .. } => "saveHydration",
            Self::DeleteHydration { .. } => "deleteHydration",
            Self::SaveFood { .. } => "saveFood",
            Self::UpdateFood { .. } => "updateFood",
            Self::DeleteFood { .. } => "deleteFood",
            Self::SaveBloodPressure { .. } => "saveBloodPressure",
            Self::SaveWorkout { .. } => "saveWorkout",
            Self::DeleteWorkout { .. } => "deleteWorkout",
        }
    }
}
