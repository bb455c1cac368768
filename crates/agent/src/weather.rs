use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use inventra_core::config::WeatherConfig;
use inventra_core::domain::weather::{clamp_forecast_days, DailyForecast, WeatherForecast};

use crate::tools::Tool;

pub const WEATHER_TOOL_NAME: &str = "get_weather_forecast";

const DEFAULT_TOOL_DAYS: u32 = 5;
const READINGS_PER_DAY: u32 = 8;
const MAX_READINGS: u32 = 40;

/// Representative city per region: Delhi, Chennai, Kolkata, Mumbai, Bhopal. Unknown regions
/// resolve to central.
pub fn region_coordinates(region: &str) -> (f64, f64) {
    match region.trim().to_ascii_lowercase().as_str() {
        "north" => (28.7041, 77.1025),
        "south" => (13.0827, 80.2707),
        "east" => (22.5726, 88.3639),
        "west" => (19.0760, 72.8777),
        _ => (23.2599, 77.4126),
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn daily_forecast(&self, region: &str, days: u32) -> Result<Vec<DailyForecast>>;
}

pub struct OpenWeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl OpenWeatherClient {
    /// `None` when no API key is configured.
    pub fn from_config(config: &WeatherConfig) -> Result<Option<Self>> {
        if !config.has_api_key() {
            return Ok(None);
        }
        let Some(api_key) = config.api_key.clone() else {
            return Ok(None);
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client for the weather provider")?;

        Ok(Some(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        }))
    }
}

#[derive(Debug, Deserialize)]
struct ReadingMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct ReadingCondition {
    main: String,
}

#[derive(Debug, Default, Deserialize)]
struct ReadingRain {
    #[serde(rename = "3h", default)]
    three_hours: f64,
}

#[derive(Debug, Deserialize)]
struct Reading {
    dt: i64,
    main: ReadingMain,
    #[serde(default)]
    weather: Vec<ReadingCondition>,
    #[serde(default)]
    rain: Option<ReadingRain>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<Reading>,
}

#[derive(Default)]
struct DayAccumulator {
    temperatures: Vec<f64>,
    humidity: Vec<f64>,
    rainfall: f64,
    conditions: Vec<String>,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Most frequent condition; ties go to the one seen first.
fn modal_condition(conditions: &[String]) -> String {
    let mut best: Option<(&String, usize)> = None;
    for condition in conditions {
        let count = conditions.iter().filter(|other| *other == condition).count();
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((condition, count));
        }
    }
    best.map(|(condition, _)| condition.clone()).unwrap_or_else(|| "Unknown".to_string())
}

/// Collapses 3-hourly readings into per-day mean temperature, summed rain, mean humidity and
/// modal condition, keeping the first `days` dates.
fn aggregate_daily(readings: Vec<Reading>, days: u32) -> Vec<DailyForecast> {
    let mut by_date: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
    for reading in readings {
        let Some(timestamp) = DateTime::<Utc>::from_timestamp(reading.dt, 0) else {
            continue;
        };
        let day = by_date.entry(timestamp.date_naive()).or_default();
        day.temperatures.push(reading.main.temp);
        day.humidity.push(reading.main.humidity);
        day.rainfall += reading.rain.map_or(0.0, |rain| rain.three_hours);
        if let Some(condition) = reading.weather.into_iter().next() {
            day.conditions.push(condition.main);
        }
    }

    by_date
        .into_iter()
        .take(days as usize)
        .map(|(date, day)| DailyForecast {
            date,
            temperature_c: round1(mean(&day.temperatures)),
            rainfall_mm: round1(day.rainfall),
            humidity_pct: round1(mean(&day.humidity)),
            condition: modal_condition(&day.conditions),
        })
        .collect()
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn daily_forecast(&self, region: &str, days: u32) -> Result<Vec<DailyForecast>> {
        let (lat, lon) = region_coordinates(region);
        let count = (days * READINGS_PER_DAY).min(MAX_READINGS);

        let response = self
            .client
            .get(format!("{}/forecast", self.base_url))
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.api_key.expose_secret().to_string()),
                ("units", "metric".to_string()),
                ("cnt", count.to_string()),
            ])
            .send()
            .await
            .context("weather request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("weather API error {}", response.status()));
        }

        let body: ForecastResponse =
            response.json().await.context("weather response was not valid JSON")?;
        Ok(aggregate_daily(body.list, days))
    }
}

/// Forecast lookup that never fails: provider errors, empty answers and a missing provider
/// all yield the clear-weather fallback series.
pub struct WeatherService {
    provider: Option<Arc<dyn WeatherProvider>>,
}

impl WeatherService {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider: Some(provider) }
    }

    pub fn offline() -> Self {
        Self { provider: None }
    }

    pub fn from_config(config: &WeatherConfig) -> Result<Self> {
        Ok(match OpenWeatherClient::from_config(config)? {
            Some(client) => Self::new(Arc::new(client)),
            None => Self::offline(),
        })
    }

    pub async fn forecast(&self, region: &str, days: u32) -> WeatherForecast {
        let days = clamp_forecast_days(days);
        let today = Utc::now().date_naive();

        let Some(provider) = &self.provider else {
            warn!(
                event_name = "weather.fallback_used",
                region,
                reason = "no provider configured",
                "using clear-weather fallback"
            );
            return WeatherForecast::clear_fallback(region, days, today);
        };

        match provider.daily_forecast(region, days).await {
            Ok(forecast) if !forecast.is_empty() => {
                WeatherForecast { region: region.to_string(), days, forecast, fallback: false }
            }
            Ok(_) => {
                warn!(
                    event_name = "weather.fallback_used",
                    region,
                    reason = "empty forecast",
                    "using clear-weather fallback"
                );
                WeatherForecast::clear_fallback(region, days, today)
            }
            Err(error) => {
                warn!(
                    event_name = "weather.fallback_used",
                    region,
                    error = %error,
                    "weather provider failed; using clear-weather fallback"
                );
                WeatherForecast::clear_fallback(region, days, today)
            }
        }
    }
}

/// `get_weather_forecast` tool handed to the analysis executor.
pub struct WeatherForecastTool {
    service: Arc<WeatherService>,
}

impl WeatherForecastTool {
    pub fn new(service: Arc<WeatherService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for WeatherForecastTool {
    fn name(&self) -> &'static str {
        WEATHER_TOOL_NAME
    }

    fn description(&self) -> &'static str {
        "Get weather forecast for a region (north/south/east/west/central) to help with \
         inventory planning. Returns temperature, rainfall, humidity and conditions for the \
         next 5 days."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "region": {
                    "type": "string",
                    "description": "Region name: north, south, east, west or central"
                },
                "days": {
                    "type": "integer",
                    "description": "Number of forecast days (max 5)",
                    "default": DEFAULT_TOOL_DAYS
                }
            },
            "required": ["region"]
        })
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let region = input
            .get("region")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|region| !region.is_empty())
            .ok_or_else(|| anyhow!("`region` is required"))?;
        let days = match input.get("days") {
            None | Some(Value::Null) => DEFAULT_TOOL_DAYS,
            Some(value) => value
                .as_u64()
                .map(|days| u32::try_from(days).unwrap_or(u32::MAX))
                .ok_or_else(|| anyhow!("`days` must be a non-negative integer"))?,
        };

        let forecast = self.service.forecast(region, days).await;
        Ok(Value::String(forecast.render()))
    }
}
