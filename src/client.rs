use crate::{
    bridge::NativeBridge,
    error::{FitError, Result},
    events::{Listener, SubscriptionRegistry},
    normalize::{resolve_bucket_spec, resolve_date_range, resolve_delete_range, to_epoch_millis},
    protocol::{
        EventChannel, HydrationPayload, NativeRequest, Permission, RecordingType, Scope,
    },
    records::{
        ActivitySample, BloodPressureEntry, BloodPressureSample, CalorieSample, DistanceSample,
        FoodIntake, HeartRateSummary, HeightEntry, HydrationEntry, HydrationSample,
        MoveMinutesSample, NutritionSample, RecordingEvent, SampleRecord, SleepSample,
        StepSourceSamples, WeightEntry, WorkoutEntry, WorkoutSample,
    },
    shape::{
        format_water_volume, kg_to_lbs, lbs_and_oz_to_kg, shape_daily_nutrition,
        shape_hydration, shape_step_sources, ResponseShaper,
    },
    types::{AuthState, AuthorizeResult, BridgeConfig, Imperial, QueryOptions, WeightUnit},
};
use futures::{channel::mpsc, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

const DEFAULT_FAILURE_MESSAGE: &str = "Authorization failed";

/// High-level facade over a Google Fit native bridge
///
/// `GoogleFit` turns caller options into native requests, reshapes the raw
/// payloads into typed records and owns every event listener it installs.
/// It tracks the authorization state so repeated `authorize` calls do not
/// prompt the user again.
///
/// The facade is cheap to clone; clones share the bridge, the authorization
/// state and the listener registry.
///
/// # Examples
///
/// ```no_run
/// use googlefit_bridge::{GoogleFit, NativeBridge, QueryOptions};
///
/// async fn last_week<B: NativeBridge>(bridge: B) -> googlefit_bridge::Result<()> {
///     let fit = GoogleFit::new(bridge);
///
///     let outcome = fit.authorize(&[]).await;
///     if !outcome.success {
///         return Ok(());
///     }
///
///     let options = QueryOptions::new()
///         .start_date("2021-05-01T00:00:00.000Z")
///         .end_date("2021-05-08T00:00:00.000Z");
///     for source in fit.get_daily_step_count_samples(&options).await? {
///         println!("{}: {} day(s)", source.source, source.steps.len());
///     }
///     Ok(())
/// }
/// ```
pub struct GoogleFit<B: NativeBridge> {
    bridge: Arc<B>,
    config: BridgeConfig,
    auth: Arc<RwLock<AuthState>>,
    registry: Arc<Mutex<SubscriptionRegistry>>,
}

impl<B: NativeBridge> Clone for GoogleFit<B> {
    fn clone(&self) -> Self {
        Self {
            bridge: Arc::clone(&self.bridge),
            config: self.config.clone(),
            auth: Arc::clone(&self.auth),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<B: NativeBridge> GoogleFit<B> {
    /// Create a facade with the default configuration
    #[must_use]
    pub fn new(bridge: B) -> Self {
        Self::with_config(bridge, BridgeConfig::default())
    }

    /// Create a facade with a custom configuration
    #[must_use]
    pub fn with_config(bridge: B, config: BridgeConfig) -> Self {
        Self {
            bridge: Arc::new(bridge),
            config,
            auth: Arc::new(RwLock::new(AuthState::Unauthorized)),
            registry: Arc::new(Mutex::new(SubscriptionRegistry::new())),
        }
    }

    /// The configuration in use
    #[must_use]
    pub const fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The underlying native bridge
    #[must_use]
    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    // ---------------------------------------------------------------------
    // Status and authorization
    // ---------------------------------------------------------------------

    /// Whether the fitness app is installed on the device
    ///
    /// # Errors
    ///
    /// Returns the native error, or [`FitError::InvalidResponse`] if the
    /// answer is not a boolean.
    pub async fn is_available(&self) -> Result<bool> {
        self.call_flag(NativeRequest::IsAvailable).await
    }

    /// Whether fitness permissions are currently granted
    ///
    /// # Errors
    ///
    /// Returns the native error, or [`FitError::InvalidResponse`] if the
    /// answer is not a boolean.
    pub async fn is_enabled(&self) -> Result<bool> {
        self.call_flag(NativeRequest::IsEnabled).await
    }

    /// Launch the fitness app
    ///
    /// # Errors
    ///
    /// Returns the native error if the app cannot be opened.
    pub async fn open_fit(&self) -> Result<()> {
        self.bridge.call(NativeRequest::OpenFit).await?;
        Ok(())
    }

    /// Ask the platform whether access is granted and refresh the cached state
    ///
    /// # Errors
    ///
    /// Returns the native error, or [`FitError::InvalidResponse`] if the
    /// answer carries no authorization flag.
    pub async fn check_is_authorized(&self) -> Result<bool> {
        let payload = self.bridge.call(NativeRequest::IsAuthorized).await?;
        let authorized = match &payload {
            Value::Bool(flag) => *flag,
            Value::Object(map) => map
                .get("isAuthorized")
                .and_then(Value::as_bool)
                .ok_or_else(|| {
                    FitError::InvalidResponse(format!("isAuthorized returned {payload}"))
                })?,
            other => {
                return Err(FitError::InvalidResponse(format!(
                    "isAuthorized returned {other}"
                )))
            }
        };

        self.set_auth_state(if authorized {
            AuthState::Authorized
        } else {
            AuthState::Unauthorized
        })
        .await;

        Ok(authorized)
    }

    /// Cached authorization flag
    pub async fn is_authorized(&self) -> bool {
        *self.auth.read().await == AuthState::Authorized
    }

    /// Current authorization state
    pub async fn auth_state(&self) -> AuthState {
        *self.auth.read().await
    }

    /// Request access to the given scopes
    ///
    /// An empty slice requests the configured scopes. When access is already
    /// granted the call resolves immediately without prompting. Otherwise the
    /// outcome listeners are installed before the native request is issued
    /// and the first outcome event decides the result.
    ///
    /// Failures are reported in the returned [`AuthorizeResult`], never as an
    /// error.
    pub async fn authorize(&self, scopes: &[Scope]) -> AuthorizeResult {
        if self.is_authorized().await {
            debug!("Already authorized, skipping native authorize");
            return AuthorizeResult::granted();
        }

        let scopes = if scopes.is_empty() {
            self.config.scopes.clone()
        } else {
            scopes.to_vec()
        };

        info!("Requesting authorization for {} scope(s)", scopes.len());
        self.set_auth_state(AuthState::Pending).await;

        let (tx, mut rx) = mpsc::unbounded::<AuthorizeResult>();
        {
            let success_tx = tx.clone();
            let on_success: Listener = Arc::new(move |_| {
                let _ = success_tx.unbounded_send(AuthorizeResult::granted());
            });
            let on_failure: Listener = Arc::new(move |payload| {
                let _ = tx.unbounded_send(AuthorizeResult::refused(failure_message(&payload)));
            });

            let mut registry = self.registry.lock().await;
            registry.push(
                self.bridge
                    .add_listener(EventChannel::AuthorizeSuccess, on_success),
            );
            registry.push(
                self.bridge
                    .add_listener(EventChannel::AuthorizeFailure, on_failure),
            );
        }

        if let Err(e) = self.bridge.call(NativeRequest::Authorize { scopes }).await {
            error!("Native authorize failed: {}", e);
            self.set_auth_state(AuthState::Failed).await;
            return AuthorizeResult::refused(e.to_string());
        }

        let outcome = rx
            .next()
            .await
            .unwrap_or_else(|| AuthorizeResult::refused(DEFAULT_FAILURE_MESSAGE));

        if outcome.success {
            info!("Authorization granted");
            self.set_auth_state(AuthState::Authorized).await;
        } else {
            warn!(
                "Authorization refused: {}",
                outcome.message.as_deref().unwrap_or(DEFAULT_FAILURE_MESSAGE)
            );
            self.set_auth_state(AuthState::Failed).await;
        }

        outcome
    }

    /// Revoke the session and remove every listener
    ///
    /// Listeners are removed even if the native call fails.
    ///
    /// # Errors
    ///
    /// Returns the native error of the disconnect request.
    pub async fn disconnect(&self) -> Result<()> {
        info!("Disconnecting from Google Fit");
        self.set_auth_state(AuthState::Unauthorized).await;

        let result = self.bridge.call(NativeRequest::Disconnect).await;
        let removed = self.remove_listeners().await;
        debug!("Removed {} listener(s) on disconnect", removed);

        if let Err(e) = &result {
            error!("Native disconnect failed: {}", e);
        }
        result.map(|_| ())
    }

    // ---------------------------------------------------------------------
    // Subscriptions
    // ---------------------------------------------------------------------

    /// Subscribe the recording API to data types
    ///
    /// Distance recording needs fine location; if that permission is missing
    /// the user is prompted, and on refusal distance is dropped while the
    /// remaining types are still recorded. `callback` receives the status
    /// event of each recorded type.
    ///
    /// Returns the data types actually subscribed.
    ///
    /// # Errors
    ///
    /// Returns the native error of the recording request.
    pub async fn start_recording<F>(
        &self,
        data_types: &[RecordingType],
        callback: F,
    ) -> Result<Vec<RecordingType>>
    where
        F: Fn(RecordingEvent) + Send + Sync + 'static,
    {
        let mut data_types = data_types.to_vec();

        if data_types.contains(&RecordingType::Distance)
            && !self.ensure_permission(Permission::FineLocation).await
        {
            warn!("Fine location refused, distance will not be recorded");
            data_types.retain(|t| *t != RecordingType::Distance);
        }

        if data_types.is_empty() {
            warn!("No data types left to record");
            return Ok(data_types);
        }

        let callback = Arc::new(callback);
        {
            let mut registry = self.registry.lock().await;
            for data_type in &data_types {
                let callback = Arc::clone(&callback);
                let listener: Listener = Arc::new(move |payload| {
                    match serde_json::from_value::<RecordingEvent>(payload) {
                        Ok(event) => callback(event),
                        Err(e) => warn!("Malformed recording event: {}", e),
                    }
                });
                registry.push(
                    self.bridge
                        .add_listener(EventChannel::Recording(*data_type), listener),
                );
            }
        }

        info!("Starting recording for {:?}", data_types);
        self.bridge
            .call(NativeRequest::StartFitnessRecording {
                data_types: data_types.clone(),
            })
            .await?;

        Ok(data_types)
    }

    /// Receive live step counter updates
    ///
    /// # Errors
    ///
    /// Returns the native error if the step sensor cannot be started.
    pub async fn observe_steps<F>(&self, callback: F) -> Result<()>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.listen(EventChannel::StepChanged, Arc::new(callback)).await;
        self.bridge.call(NativeRequest::ObserveSteps).await?;
        Ok(())
    }

    /// Receive step history change notifications
    pub async fn observe_history<F>(&self, callback: F)
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.listen(EventChannel::StepHistoryChanged, Arc::new(callback)).await;
    }

    /// Be notified whenever authorization succeeds
    pub async fn on_authorize<F>(&self, callback: F)
    where
        F: Fn(AuthorizeResult) + Send + Sync + 'static,
    {
        self.listen(
            EventChannel::AuthorizeSuccess,
            Arc::new(move |_| callback(AuthorizeResult::granted())),
        )
        .await;
    }

    /// Be notified whenever authorization is refused or fails
    pub async fn on_authorize_failure<F>(&self, callback: F)
    where
        F: Fn(AuthorizeResult) + Send + Sync + 'static,
    {
        self.listen(
            EventChannel::AuthorizeFailure,
            Arc::new(move |payload| callback(AuthorizeResult::refused(failure_message(&payload)))),
        )
        .await;
    }

    /// Remove every listener this facade installed
    ///
    /// Returns the number of listeners removed.
    pub async fn remove_listeners(&self) -> usize {
        let removed = self.registry.lock().await.remove_all();
        if removed > 0 {
            info!("Removed {} listener(s)", removed);
        }
        removed
    }

    /// Alias of [`GoogleFit::remove_listeners`]
    pub async fn unsubscribe_listeners(&self) -> usize {
        self.remove_listeners().await
    }

    /// Number of listeners currently held
    pub async fn listener_count(&self) -> usize {
        self.registry.lock().await.len()
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Step history grouped per data source
    ///
    /// # Errors
    ///
    /// Returns [`FitError::NoData`] if no source reported steps, or the
    /// native/shaping error.
    pub async fn get_daily_step_count_samples(
        &self,
        options: &QueryOptions,
    ) -> Result<Vec<StepSourceSamples>> {
        let payload = self
            .bridge
            .call(NativeRequest::GetDailyStepCountSamples {
                range: resolve_date_range(options),
                bucket: resolve_bucket_spec(options),
            })
            .await?;
        non_empty(
            "steps",
            shape_step_sources(payload, self.config.local_time_zone)?,
        )
    }

    /// Distance per bucket, in meters
    ///
    /// # Errors
    ///
    /// Returns [`FitError::NoData`] for an empty result, or the native/shaping error.
    pub async fn get_daily_distance_samples(
        &self,
        options: &QueryOptions,
    ) -> Result<Vec<DistanceSample>> {
        let payload = self
            .bridge
            .call(NativeRequest::GetDailyDistanceSamples {
                range: resolve_date_range(options),
                bucket: resolve_bucket_spec(options),
            })
            .await?;
        non_empty("distance", self.shaper("distance").shape_into(payload)?)
    }

    /// Activity segments with their calories, distance and step counts
    ///
    /// # Errors
    ///
    /// Returns [`FitError::NoData`] for an empty result, or the native/shaping error.
    pub async fn get_activity_samples(&self, options: &QueryOptions) -> Result<Vec<ActivitySample>> {
        let payload = self
            .bridge
            .call(NativeRequest::GetActivitySamples {
                range: resolve_date_range(options),
                bucket: resolve_bucket_spec(options),
            })
            .await?;
        non_empty(
            "activity",
            self.shaper("activityName")
                .date_fields(&["start", "end"])
                .shape_into(payload)?,
        )
    }

    /// Move minutes per bucket
    ///
    /// # Errors
    ///
    /// Returns [`FitError::NoData`] for an empty result, or the native/shaping error.
    pub async fn get_move_minutes(&self, options: &QueryOptions) -> Result<Vec<MoveMinutesSample>> {
        let payload = self
            .bridge
            .call(NativeRequest::GetMoveMinutes {
                range: resolve_date_range(options),
                bucket: resolve_bucket_spec(options),
            })
            .await?;
        non_empty("move minutes", self.shaper("duration").shape_into(payload)?)
    }

    /// Calories expended per bucket
    ///
    /// With `basal` set the basal metabolic rate is included in the totals.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::NoData`] for an empty result, or the native/shaping error.
    pub async fn get_daily_calorie_samples(
        &self,
        options: &QueryOptions,
        basal: bool,
    ) -> Result<Vec<CalorieSample>> {
        let payload = self
            .bridge
            .call(NativeRequest::GetDailyCalorieSamples {
                range: resolve_date_range(options),
                bucket: resolve_bucket_spec(options),
                basal,
            })
            .await?;
        non_empty("calorie", self.shaper("calorie").shape_into(payload)?)
    }

    /// Nutrient totals per day
    ///
    /// # Errors
    ///
    /// Returns [`FitError::NoData`] for an empty result, or the native/shaping error.
    pub async fn get_daily_nutrition_samples(
        &self,
        options: &QueryOptions,
    ) -> Result<Vec<NutritionSample>> {
        let payload = self
            .bridge
            .call(NativeRequest::GetDailyNutritionSamples {
                range: resolve_date_range(options),
                bucket: resolve_bucket_spec(options),
            })
            .await?;
        non_empty("nutrition", shape_daily_nutrition(payload)?)
    }

    /// Weight readings in the requested unit
    ///
    /// # Errors
    ///
    /// Returns [`FitError::NoData`] for an empty result, or the native/shaping error.
    pub async fn get_weight_samples(
        &self,
        options: &QueryOptions,
        unit: WeightUnit,
    ) -> Result<Vec<SampleRecord>> {
        let payload = self
            .bridge
            .call(NativeRequest::GetWeightSamples {
                range: resolve_date_range(options),
                bucket: resolve_bucket_spec(options),
            })
            .await?;
        let mut samples: Vec<SampleRecord> = self.shaper("value").shape_into(payload)?;

        if unit == WeightUnit::Pound {
            for sample in &mut samples {
                sample.value = kg_to_lbs(sample.value);
            }
        }

        non_empty("weight", samples)
    }

    /// Height readings in meters
    ///
    /// # Errors
    ///
    /// Returns [`FitError::NoData`] for an empty result, or the native/shaping error.
    pub async fn get_height_samples(&self, options: &QueryOptions) -> Result<Vec<SampleRecord>> {
        let payload = self
            .bridge
            .call(NativeRequest::GetHeightSamples {
                range: resolve_date_range(options),
            })
            .await?;
        non_empty("height", self.shaper("value").shape_into(payload)?)
    }

    /// Heart rate readings in beats per minute
    ///
    /// # Errors
    ///
    /// Returns [`FitError::NoData`] for an empty result, or the native/shaping error.
    pub async fn get_heart_rate_samples(&self, options: &QueryOptions) -> Result<Vec<SampleRecord>> {
        let payload = self
            .bridge
            .call(NativeRequest::GetHeartRateSamples {
                range: resolve_date_range(options),
                bucket: resolve_bucket_spec(options),
            })
            .await?;
        non_empty("heart rate", self.shaper("value").shape_into(payload)?)
    }

    /// Heart rate average, minimum and maximum per bucket
    ///
    /// # Errors
    ///
    /// Returns [`FitError::NoData`] for an empty result, or the native/shaping error.
    pub async fn get_aggregated_heart_rate_samples(
        &self,
        options: &QueryOptions,
    ) -> Result<Vec<HeartRateSummary>> {
        let payload = self
            .bridge
            .call(NativeRequest::GetAggregatedHeartRateSamples {
                range: resolve_date_range(options),
                bucket: resolve_bucket_spec(options),
            })
            .await?;
        non_empty("heart rate", self.shaper("average").shape_into(payload)?)
    }

    /// Resting heart rate readings in beats per minute
    ///
    /// # Errors
    ///
    /// Returns [`FitError::NoData`] for an empty result, or the native/shaping error.
    pub async fn get_resting_heart_rate_samples(
        &self,
        options: &QueryOptions,
    ) -> Result<Vec<SampleRecord>> {
        let payload = self
            .bridge
            .call(NativeRequest::GetRestingHeartRateSamples {
                range: resolve_date_range(options),
                bucket: resolve_bucket_spec(options),
            })
            .await?;
        non_empty(
            "resting heart rate",
            self.shaper("value").shape_into(payload)?,
        )
    }

    /// Blood pressure readings in mmHg
    ///
    /// # Errors
    ///
    /// Returns [`FitError::NoData`] for an empty result, or the native/shaping error.
    pub async fn get_blood_pressure_samples(
        &self,
        options: &QueryOptions,
    ) -> Result<Vec<BloodPressureSample>> {
        let payload = self
            .bridge
            .call(NativeRequest::GetBloodPressureSamples {
                range: resolve_date_range(options),
                bucket: resolve_bucket_spec(options),
            })
            .await?;
        non_empty("blood pressure", self.shaper("systolic").shape_into(payload)?)
    }

    /// Water intake entries
    ///
    /// # Errors
    ///
    /// Returns [`FitError::NoData`] for an empty result, or the native/shaping error.
    pub async fn get_hydration_samples(
        &self,
        options: &QueryOptions,
    ) -> Result<Vec<HydrationSample>> {
        let payload = self
            .bridge
            .call(NativeRequest::GetHydrationSamples {
                range: resolve_date_range(options),
            })
            .await?;
        non_empty(
            "hydration",
            shape_hydration(payload, self.config.local_time_zone)?,
        )
    }

    /// Sleep segments with their stages
    ///
    /// # Errors
    ///
    /// Returns [`FitError::NoData`] for an empty result, or the native/shaping error.
    pub async fn get_sleep_samples(&self, options: &QueryOptions) -> Result<Vec<SleepSample>> {
        let payload = self
            .bridge
            .call(NativeRequest::GetSleepSamples {
                range: resolve_date_range(options),
            })
            .await?;
        non_empty("sleep", self.shaper("value").shape_into(payload)?)
    }

    /// Recorded workout sessions
    ///
    /// # Errors
    ///
    /// Returns [`FitError::NoData`] for an empty result, or the native/shaping error.
    pub async fn get_workout_samples(&self, options: &QueryOptions) -> Result<Vec<WorkoutSample>> {
        let payload = self
            .bridge
            .call(NativeRequest::GetWorkoutSamples {
                range: resolve_date_range(options),
            })
            .await?;
        non_empty(
            "workout",
            self.shaper("workoutType")
                .date_fields(&["start", "end"])
                .shape_into(payload)?,
        )
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    /// Save a weight reading
    ///
    /// Pounds are converted to kilograms before they are stored.
    ///
    /// # Errors
    ///
    /// Returns the native error, or [`FitError::InvalidResponse`] if the
    /// answer is not a boolean.
    pub async fn save_weight(&self, entry: &WeightEntry) -> Result<bool> {
        let value = match entry.unit {
            WeightUnit::Kilogram => entry.value,
            WeightUnit::Pound => lbs_and_oz_to_kg(Imperial {
                pounds: entry.value,
                ounces: 0.0,
            }),
        };

        self.call_flag(NativeRequest::SaveWeight {
            value,
            date: to_epoch_millis(&entry.date),
        })
        .await
    }

    /// Delete weight readings in a range
    ///
    /// # Errors
    ///
    /// Returns the native error, or [`FitError::InvalidResponse`] if the
    /// answer is not a boolean.
    pub async fn delete_weight(&self, options: &QueryOptions) -> Result<bool> {
        self.call_flag(NativeRequest::DeleteWeight {
            range: resolve_delete_range(options),
        })
        .await
    }

    /// Save a height reading in meters
    ///
    /// # Errors
    ///
    /// Returns the native error, or [`FitError::InvalidResponse`] if the
    /// answer is not a boolean.
    pub async fn save_height(&self, entry: &HeightEntry) -> Result<bool> {
        self.call_flag(NativeRequest::SaveHeight {
            value: entry.value,
            date: to_epoch_millis(&entry.date),
        })
        .await
    }

    /// Delete height readings in a range
    ///
    /// # Errors
    ///
    /// Returns the native error, or [`FitError::InvalidResponse`] if the
    /// answer is not a boolean.
    pub async fn delete_height(&self, options: &QueryOptions) -> Result<bool> {
        self.call_flag(NativeRequest::DeleteHeight {
            range: resolve_delete_range(options),
        })
        .await
    }

    /// Save water intake entries
    ///
    /// Volumes are sent with exactly three decimals.
    ///
    /// # Errors
    ///
    /// Returns the native error, or [`FitError::InvalidResponse`] if the
    /// answer is not a boolean.
    #[allow(clippy::cast_possible_truncation)]
    pub async fn save_hydration(&self, entries: &[HydrationEntry]) -> Result<bool> {
        let samples = entries
            .iter()
            .map(|entry| HydrationPayload {
                date: to_epoch_millis(&entry.date) as i64,
                water_consumed: format_water_volume(entry.water_consumed),
            })
            .collect();

        self.call_flag(NativeRequest::SaveHydration { samples }).await
    }

    /// Delete water intake in a range
    ///
    /// # Errors
    ///
    /// Returns the native error, or [`FitError::InvalidResponse`] if the
    /// answer is not a boolean.
    pub async fn delete_hydration(&self, options: &QueryOptions) -> Result<bool> {
        self.call_flag(NativeRequest::DeleteHydration {
            range: resolve_delete_range(options),
        })
        .await
    }

    /// Save a food entry
    ///
    /// # Errors
    ///
    /// Returns the native error, or [`FitError::InvalidResponse`] if the
    /// answer is not a boolean.
    pub async fn save_food(&self, food: &FoodIntake) -> Result<bool> {
        self.call_flag(NativeRequest::SaveFood {
            meal_type: food.meal_type,
            food_name: food.food_name.clone(),
            nutrients: food.nutrients.clone(),
            date: to_epoch_millis(&food.date),
        })
        .await
    }

    /// Replace the food entry recorded at the entry's date
    ///
    /// # Errors
    ///
    /// Returns the native error, or [`FitError::InvalidResponse`] if the
    /// answer is not a boolean.
    pub async fn update_food(&self, food: &FoodIntake) -> Result<bool> {
        self.call_flag(NativeRequest::UpdateFood {
            meal_type: food.meal_type,
            food_name: food.food_name.clone(),
            nutrients: food.nutrients.clone(),
            date: to_epoch_millis(&food.date),
        })
        .await
    }

    /// Delete food entries in a range
    ///
    /// # Errors
    ///
    /// Returns the native error, or [`FitError::InvalidResponse`] if the
    /// answer is not a boolean.
    pub async fn delete_food(&self, options: &QueryOptions) -> Result<bool> {
        self.call_flag(NativeRequest::DeleteFood {
            range: resolve_delete_range(options),
        })
        .await
    }

    /// Save a blood pressure reading
    ///
    /// # Errors
    ///
    /// Returns the native error, or [`FitError::InvalidResponse`] if the
    /// answer is not a boolean.
    pub async fn save_blood_pressure(&self, entry: &BloodPressureEntry) -> Result<bool> {
        self.call_flag(NativeRequest::SaveBloodPressure {
            systolic: entry.systolic,
            diastolic: entry.diastolic,
            date: to_epoch_millis(&entry.date),
        })
        .await
    }

    /// Save a workout session
    ///
    /// # Errors
    ///
    /// Returns the native error, or [`FitError::InvalidResponse`] if the
    /// answer is not a boolean.
    pub async fn save_workout(&self, workout: &WorkoutEntry) -> Result<bool> {
        let range = resolve_date_range(
            &QueryOptions::new()
                .start_date(workout.start_date.clone())
                .end_date(workout.end_date.clone()),
        );

        self.call_flag(NativeRequest::SaveWorkout {
            activity_type: workout.activity_type.clone(),
            range,
            calories: workout.calories,
        })
        .await
    }

    /// Delete workout sessions in a range
    ///
    /// # Errors
    ///
    /// Returns the native error, or [`FitError::InvalidResponse`] if the
    /// answer is not a boolean.
    pub async fn delete_workout(&self, options: &QueryOptions) -> Result<bool> {
        self.call_flag(NativeRequest::DeleteWorkout {
            range: resolve_delete_range(options),
        })
        .await
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    const fn shaper<'a>(&self, presence_key: &'a str) -> ResponseShaper<'a> {
        ResponseShaper::new(presence_key).local_time_zone(self.config.local_time_zone)
    }

    async fn call_flag(&self, request: NativeRequest) -> Result<bool> {
        let method = request.method();
        debug!("Calling {}", method);

        match self.bridge.call(request).await? {
            Value::Bool(flag) => Ok(flag),
            other => Err(FitError::InvalidResponse(format!(
                "{method} returned {other}"
            ))),
        }
    }

    async fn listen(&self, channel: EventChannel, listener: Listener) {
        let subscription = self.bridge.add_listener(channel, listener);
        debug!("Listening on {}", channel);
        self.registry.lock().await.push(subscription);
    }

    async fn ensure_permission(&self, permission: Permission) -> bool {
        if self.bridge.has_permission(permission).await {
            return true;
        }

        info!("Requesting {}", permission.android_name());
        let status = self.bridge.request_permission(permission).await;
        debug!("{} answered with {:?}", permission.android_name(), status);
        status.is_granted()
    }

    async fn set_auth_state(&self, state: AuthState) {
        let mut auth = self.auth.write().await;
        if *auth != state {
            debug!("Authorization state {} -> {}", *auth, state);
            *auth = state;
        }
    }
}

fn non_empty<T>(kind: &'static str, records: Vec<T>) -> Result<Vec<T>> {
    if records.is_empty() {
        debug!("No {} data in range", kind);
        return Err(FitError::NoData { kind });
    }
    Ok(records)
}

fn failure_message(payload: &Value) -> String {
    payload
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| payload.as_str())
        .unwrap_or(DEFAULT_FAILURE_MESSAGE)
        .to_string()
}
