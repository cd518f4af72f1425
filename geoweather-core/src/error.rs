use reqwest::StatusCode;
use thiserror::Error;

/// Why a location request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The host offers no location capability at all.
    #[error("Geolocation is not supported by your browser.")]
    AbsentCapability,

    #[error("Location access is required.")]
    PermissionDenied,

    #[error("Location information is unavailable.")]
    PositionUnavailable,

    #[error("Location request timed out.")]
    Timeout,

    #[error("An unknown error occurred while accessing location.")]
    Unknown,
}

/// Failure of a forecast request.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// The request never produced a response (DNS, connect, TLS, body read).
    #[error("Failed to reach the forecast service: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Forecast request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Failed to parse forecast JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl WeatherError {
    /// HTTP status returned by the service, if it answered with a failure.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            WeatherError::Status { status, .. } => Some(*status),
            WeatherError::Transport(_) | WeatherError::Decode(_) => None,
        }
    }
}

/// Any failure of the two lookups, for callers that chain them.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Location(#[from] LocationError),

    #[error(transparent)]
    Weather(#[from] WeatherError),
}
