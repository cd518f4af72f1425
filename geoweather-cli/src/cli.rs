use anyhow::Context;
use chrono::{DateTime, Local};
use clap::{Args, Parser, Subcommand};
use geoweather_core::{
    Config, Coordinate, ForecastFetcher, LocationResolver, WeatherForecast, forecast_here,
};
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "geoweather", version, about = "Forecast for where you are")]
pub struct Cli {
    /// Increase log output (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and this host's location.
    Configure,

    /// Print the current location.
    Locate,

    /// Show the forecast for a coordinate, or for the current location.
    Forecast(ForecastArgs),
}

#[derive(Debug, Args)]
pub struct ForecastArgs {
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    pub lat: Option<f64>,

    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    pub lon: Option<f64>,

    /// Print the provider's JSON as received.
    #[arg(long)]
    pub raw: bool,
}

impl ForecastArgs {
    fn coordinate(&self) -> Option<Coordinate> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => None,
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Locate => {
                let config = Config::load()?;
                let here = config.location_resolver().current_location().await?;
                println!("{here}");
                Ok(())
            }
            Command::Forecast(args) => {
                let config = Config::load()?;
                let client = config.weather_client()?;
                let (here, forecast) =
                    fetch(&args, &config.location_resolver(), &client).await?;

                if args.raw {
                    println!("{}", serde_json::to_string_pretty(&forecast)?);
                } else {
                    println!("Forecast for {here}");
                    for line in summarize(&forecast) {
                        println!("{line}");
                    }
                }
                Ok(())
            }
        }
    }
}

async fn fetch(
    args: &ForecastArgs,
    resolver: &LocationResolver,
    fetcher: &dyn ForecastFetcher,
) -> anyhow::Result<(Coordinate, WeatherForecast)> {
    match args.coordinate() {
        Some(here) => {
            let forecast = fetcher
                .fetch_forecast(here.latitude, here.longitude)
                .await?;
            Ok((here, forecast))
        }
        None => Ok(forecast_here(resolver, fetcher).await?),
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    loop {
        let entered = Password::new("OpenWeather API key:")
            .with_help_message("Leave blank to keep the stored key")
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?;

        match updated_api_key(config.api_key.as_deref(), &entered) {
            Some(key) => {
                config.api_key = Some(key);
                break;
            }
            None => eprintln!("An API key is required; none is stored yet."),
        }
    }

    let set_location = Confirm::new("Set this host's location?")
        .with_default(config.location.is_none())
        .prompt()
        .context("Failed to read answer")?;

    if set_location {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a number, e.g. 51.5")
            .prompt()
            .context("Failed to read latitude")?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a number, e.g. -0.12")
            .prompt()
            .context("Failed to read longitude")?;
        config.location = Some(Coordinate::new(latitude, longitude));
    }

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

/// Key to store after a prompt: the new entry, else the stored key. `None` when neither is usable.
fn updated_api_key(stored: Option<&str>, entered: &str) -> Option<String> {
    let entered = entered.trim();
    if !entered.is_empty() {
        return Some(entered.to_string());
    }
    stored
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}

/// One line per forecast period: local time, temperature and conditions.
fn summarize(forecast: &WeatherForecast) -> Vec<String> {
    let Some(list) = forecast.get("list").and_then(|l| l.as_array()) else {
        return vec!["(no forecast periods in response)".to_string()];
    };

    list.iter()
        .map(|entry| {
            let when = entry
                .get("dt")
                .and_then(|dt| dt.as_i64())
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
                .map(|dt| dt.with_timezone(&Local).format("%a %d %b %H:%M").to_string())
                .unwrap_or_else(|| "?".to_string());

            let temp = entry
                .pointer("/main/temp")
                .and_then(|t| t.as_f64())
                .map(|t| format!("{t:>5.1}°C"))
                .unwrap_or_else(|| "    ?°C".to_string());

            let condition = entry
                .pointer("/weather/0/description")
                .and_then(|d| d.as_str())
                .unwrap_or("Unknown");

            format!("{when}  {temp}  {condition}")
        })
        .collect()
}
