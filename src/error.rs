use thiserror::Error;

/// Errors that can occur when talking to the native fitness platform
#[derive(Error, Debug)]
pub enum FitError {
    /// The native layer reported a failure
    #[error("Native call failed: {0}")]
    Native(String),

    /// The native layer answered with an empty result set
    #[error("There is no any {kind} data for this period")]
    NoData {
        /// Data kind that was queried (e.g. `steps`, `weight`)
        kind: &'static str,
    },

    /// The native payload did not have the expected shape
    #[error("Invalid native response: {0}")]
    InvalidResponse(String),

    /// Payload (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The native bridge is gone
    #[error("Native bridge disconnected")]
    Disconnected,
}

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, FitError>;

impl FitError {
    /// Check if this error only signals the absence of data
    #[must_use]
    pub const fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData { .. })
    }

    /// Check if this error originated in the native layer
    #[must_use]
    pub const fn is_native(&self) -> bool {
        matches!(self, Self::Native(_) | Self::Disconnected)
    }
}
