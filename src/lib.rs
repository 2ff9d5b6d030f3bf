#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

//! # googlefit-bridge
//!
//! An async Rust facade over the Google Fit platform module.
//!
//! The platform side is reached through a [`NativeBridge`] implementation
//! supplied by the host. This crate sits in front of it and takes care of
//! everything between the caller and the platform:
//!
//! - **Input normalization**: option bags with ISO-8601 strings, epoch
//!   milliseconds or `chrono` instants become epoch-millisecond ranges, with
//!   today-so-far and daily buckets as defaults
//! - **Response shaping**: raw record arrays are filtered, their dates
//!   rewritten as ISO-8601 and deserialized into typed records
//! - **Event subscriptions**: every listener the facade installs is tracked
//!   and can be torn down in one call
//! - **Authorization**: a small state machine that never prompts twice and
//!   installs its outcome listeners before the request is sent
//! - **Permission preflight**: distance recording degrades gracefully when
//!   fine location is refused
//!
//! Empty query results are reported as [`FitError::NoData`], distinct from
//! platform failures.
//!
//! ## Quick Start
//!
//! ```no_run
//! use googlefit_bridge::{GoogleFit, NativeBridge, QueryOptions, WeightUnit};
//!
//! async fn weight_report<B: NativeBridge>(bridge: B) -> googlefit_bridge::Result<()> {
//!     let fit = GoogleFit::new(bridge);
//!
//!     if !fit.authorize(&[]).await.success {
//!         return Ok(());
//!     }
//!
//!     let options = QueryOptions::new().start_date("2021-01-01T00:00:00.000Z");
//!     match fit.get_weight_samples(&options, WeightUnit::Pound).await {
//!         Ok(samples) => {
//!             for sample in samples {
//!                 println!("{}: {:.1} lbs", sample.start_date, sample.value);
//!             }
//!         }
//!         Err(e) if e.is_no_data() => println!("{e}"),
//!         Err(e) => return Err(e),
//!     }
//!
//!     fit.remove_listeners().await;
//!     Ok(())
//! }
//! ```

/// Native platform binding
pub mod bridge;
/// Callback adapter over the async facade
#[cfg(feature = "tokio")]
pub mod callback;
/// Google Fit facade
pub mod client;
/// Error types and handling
pub mod error;
/// Event listeners and subscription tracking
pub mod events;
/// Caller options to native request parameters
pub mod normalize;
/// Native requests, scopes and event channels
pub mod protocol;
/// Records returned to and accepted from callers
pub mod records;
/// Raw payload shaping and unit conversions
pub mod shape;
/// Type definitions and data structures
pub mod types;

// Re-export the main types for convenient usage
pub use bridge::NativeBridge;
pub use client::GoogleFit;
pub use error::{FitError, Result};
pub use events::{EmitterSubscription, EventEmitter, Listener, Subscription};
pub use protocol::{EventChannel, NativeRequest, Permission, PermissionStatus, RecordingType, Scope};
pub use types::{
    AuthState, AuthorizeResult, BridgeConfig, BucketSpec, BucketUnit, DateInput, DateRange,
    Imperial, QueryOptions, WeightUnit,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name of the Google Fit app on Android
///
/// Hosts use it to check whether the app is installed or to send the user to
/// its store listing.
pub const GOOGLE_FIT_PACKAGE: &str = "com.google.android.apps.fitness";
