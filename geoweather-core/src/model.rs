use serde::{Deserialize, Serialize};

/// A point on Earth's surface, as handed back to the caller of a location request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// Position as reported by a geolocation platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Accuracy radius in metres, when the platform knows it.
    pub accuracy: Option<f64>,
}

impl From<Position> for Coordinate {
    fn from(position: Position) -> Self {
        Self {
            latitude: position.latitude,
            longitude: position.longitude,
        }
    }
}

/// Forecast body as returned by the upstream provider. Its schema belongs to
/// the provider, so it is kept as untyped JSON.
pub type WeatherForecast = serde_json::Value;
