//! Core library for the `geoweather` CLI.
//!
//! This crate defines:
//! - Device location lookup over a callback-style platform capability
//! - The OpenWeather forecast client
//! - Configuration & credentials handling
//!
//! It is used by `geoweather-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod weather;

pub use config::Config;
pub use error::{Error, LocationError, WeatherError};
pub use location::{FixedGeolocation, Geolocation, LocationResolver, PositionError};
pub use model::{Coordinate, Position, WeatherForecast};
pub use weather::{ForecastFetcher, OpenWeatherClient};

/// Resolve the device location, then fetch the forecast for it.
pub async fn forecast_here(
    resolver: &LocationResolver,
    fetcher: &dyn ForecastFetcher,
) -> Result<(Coordinate, WeatherForecast), Error> {
    let here = resolver.current_location().await?;
    let forecast = fetcher.fetch_forecast(here.latitude, here.longitude).await?;
    Ok((here, forecast))
}
