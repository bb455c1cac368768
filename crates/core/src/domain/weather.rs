use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

pub const MAX_FORECAST_DAYS: u32 = 5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temperature_c: f64,
    pub rainfall_mm: f64,
    pub humidity_pct: f64,
    pub condition: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherForecast {
    pub region: String,
    pub days: u32,
    pub forecast: Vec<DailyForecast>,
    /// True when the upstream provider was unavailable and the clear-weather series was used.
    pub fallback: bool,
}

impl WeatherForecast {
    /// Deterministic clear-weather series starting the day after `today`.
    pub fn clear_fallback(region: &str, days: u32, today: NaiveDate) -> Self {
        let days = clamp_forecast_days(days);
        let forecast = (1..=i64::from(days))
            .map(|offset| DailyForecast {
                date: today + Duration::days(offset),
                temperature_c: 25.0,
                rainfall_mm: 0.0,
                humidity_pct: 65.0,
                condition: "Clear".to_string(),
            })
            .collect();

        Self { region: region.to_string(), days, forecast, fallback: true }
    }

    /// Text block handed back to the model as the tool result.
    pub fn render(&self) -> String {
        let mut lines = vec![format!("Weather forecast for {} ({} days):", self.region, self.days)];
        lines.extend(self.forecast.iter().map(|day| {
            format!(
                "  {}: {:.1}°C, {:.1}mm rain, {:.1}% humidity, {}",
                day.date, day.temperature_c, day.rainfall_mm, day.humidity_pct, day.condition
            )
        }));
        lines.join("\n")
    }
}

pub fn clamp_forecast_days(days: u32) -> u32 {
    days.clamp(1, MAX_FORECAST_DAYS)
}
