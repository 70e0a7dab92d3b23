//! One-shot weather lookup builder.
//!
//! Fetches last week's daily maximum temperatures from Open-Meteo and keys
//! them by weekday. The resulting [`WeatherTable`] is built once at startup,
//! shared read-only for the life of the process, and rebuilt only on
//! restart. A fetch failure here is fatal: no table, no service.

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use shared::Weekday;
use std::collections::HashMap;
use std::time::Duration;

const OPEN_METEO_URL: &str = "https://api.open-meteo.com";

// Fixed geolocation and window: the past 7 days of daily maximums
const FORECAST_QUERY: [(&str, &str); 6] = [
    ("latitude", "55.7522"),
    ("longitude", "37.6156"),
    ("daily", "temperature_2m_max"),
    ("timezone", "Europe/Moscow"),
    ("past_days", "7"),
    ("forecast_days", "1"),
];

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unparseable date in weather data: {0}")]
    BadDate(String),
}

/// Read-only mapping from weekday to last week's max temperature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherTable {
    by_day: HashMap<Weekday, f64>,
}

impl WeatherTable {
    pub fn get(&self, day: Weekday) -> Option<f64> {
        self.by_day.get(&day).copied()
    }

    pub fn len(&self) -> usize {
        self.by_day.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_day.is_empty()
    }
}

impl FromIterator<(Weekday, f64)> for WeatherTable {
    fn from_iter<I: IntoIterator<Item = (Weekday, f64)>>(iter: I) -> Self {
        Self {
            by_day: iter.into_iter().collect(),
        }
    }
}

/// Open-Meteo response body: parallel `time` / `temperature_2m_max` arrays
/// under a `daily` object.
#[derive(Debug, Default, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    daily: DailySeries,
}

#[derive(Debug, Default, Deserialize)]
struct DailySeries {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_max: Vec<f64>,
}

/// Client for the external weather source.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    base_url: String,
}

impl WeatherClient {
    pub fn new() -> Result<Self, WeatherError> {
        Self::with_base_url(OPEN_METEO_URL)
    }

    /// Point the client at a different host (used by tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, WeatherError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Fetch the past week's daily maximums and key them by weekday.
    ///
    /// Not retried; the caller treats any failure as fatal to startup.
    pub async fn build_table(&self) -> Result<WeatherTable, WeatherError> {
        let url = format!("{}/v1/forecast", self.base_url);
        let response: ForecastResponse = self
            .http
            .get(&url)
            .query(&FORECAST_QUERY)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        table_from_series(&response.daily)
    }
}

/// Zip the parallel date/temperature arrays into a weekday-keyed table.
/// If a weekday somehow appears twice, the later entry wins.
fn table_from_series(daily: &DailySeries) -> Result<WeatherTable, WeatherError> {
    let mut by_day = HashMap::new();

    for (date, temperature) in daily.time.iter().zip(&daily.temperature_2m_max) {
        let parsed: NaiveDate = date
            .parse()
            .map_err(|_| WeatherError::BadDate(date.clone()))?;
        by_day.insert(Weekday::from(parsed.weekday()), *temperature);
    }

    Ok(WeatherTable { by_day })
}
