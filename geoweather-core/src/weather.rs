use async_trait::async_trait;
use reqwest::Client;
use std::fmt::Debug;
use tracing::{debug, error, instrument};

use crate::{error::WeatherError, model::WeatherForecast};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Anything able to return a multi-period forecast for a coordinate.
#[async_trait]
pub trait ForecastFetcher: Send + Sync + Debug {
    async fn fetch_forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherForecast, WeatherError>;
}

/// Client for the OpenWeather 5-day / 3-hour forecast endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Point the client at another deployment of the API (or a test server).
    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn forecast_url(&self) -> String {
        format!("{}/forecast", self.base_url.trim_end_matches('/'))
    }

    async fn request_forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherForecast, WeatherError> {
        let url = self.forecast_url();
        debug!(url = %url, "Fetching forecast");

        let lat = latitude.to_string();
        let lon = longitude.to_string();

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
                ("lang", "en"),
            ])
            .send()
            .await?;

        let status = res.status();

        if !status.is_success() {
            // The status is the useful part; a body that fails to arrive stays empty.
            let body = res.text().await.unwrap_or_default();
            return Err(WeatherError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        let body = res.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ForecastFetcher for OpenWeatherClient {
    /// Coordinates go upstream as given; range checks are left to the service.
    #[instrument(skip_all, fields(lat = %latitude, lon = %longitude))]
    async fn fetch_forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherForecast, WeatherError> {
        self.request_forecast(latitude, longitude)
            .await
            .inspect_err(|err| {
                error!(error = %err, "An error occurred while fetching the forecast data");
            })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
