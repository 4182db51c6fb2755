use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::{
    error::ForecastError,
    model::{CurrentConditions, RawSample},
    normalize::normalize,
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: Option<String>,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    /// `timeout` bounds each request end to end.
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ForecastError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ForecastError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn api_key(&self) -> Result<&str, ForecastError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ForecastError::Configuration(
                    "No API key configured for OpenWeather.".to_string(),
                )
            })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        location: &str,
        what: &str,
    ) -> Result<T, ForecastError> {
        let api_key = self.api_key()?;
        let url = format!("{}/{endpoint}", self.base_url);

        tracing::debug!("Requesting OpenWeather {what} for {location}");

        // `without_url` keeps the appid query parameter out of error messages.
        let res = self
            .http
            .get(&url)
            .query(&[("q", location), ("appid", api_key), ("units", "metric")])
            .send()
            .await
            .map_err(|e| {
                ForecastError::Transport(format!(
                    "Failed to send request to OpenWeather ({what}): {}",
                    e.without_url()
                ))
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            ForecastError::Transport(format!(
                "Failed to read OpenWeather {what} response body: {}",
                e.without_url()
            ))
        })?;

        if !status.is_success() {
            return Err(ForecastError::Transport(format!(
                "OpenWeather {what} request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            ForecastError::Schema(format!("Failed to parse OpenWeather {what} JSON: {e}"))
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
    feels_like: Option<f64>,
    pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    sys: OwSys,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    visibility: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt_txt: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: Option<OwWind>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

impl OwMain {
    fn checked_humidity(&self, what: &str) -> Result<u8, ForecastError> {
        if self.humidity > 100 {
            return Err(ForecastError::Schema(format!(
                "OpenWeather {what} humidity out of range: {}",
                self.humidity
            )));
        }
        Ok(self.humidity)
    }
}

fn first_weather<'a>(weather: &'a [OwWeather], what: &str) -> Result<&'a OwWeather, ForecastError> {
    weather.first().ok_or_else(|| {
        ForecastError::Schema(format!("OpenWeather {what} response has an empty weather list"))
    })
}

impl OwCurrentResponse {
    fn into_current(self) -> Result<CurrentConditions, ForecastError> {
        let humidity_pct = self.main.checked_humidity("current")?;
        let weather = first_weather(&self.weather, "current")?;
        let (condition, _) = normalize(&weather.icon);

        Ok(CurrentConditions {
            location: format!("{}, {}", self.name, self.sys.country),
            temperature_c: self.main.temp,
            feels_like_c: self.main.feels_like,
            condition,
            description: weather.main.clone(),
            humidity_pct,
            wind_speed_kmh: self.wind.speed * 3.6,
            visibility_km: self.visibility / 1000.0,
            pressure_hpa: self.main.pressure.map(|p| p.round() as u32),
        })
    }
}

impl OwForecastResponse {
    fn into_samples(self) -> Result<Vec<RawSample>, ForecastError> {
        if self.list.is_empty() {
            return Err(ForecastError::Schema(
                "OpenWeather forecast response contained no data".to_string(),
            ));
        }

        self.list
            .into_iter()
            .map(|entry| -> Result<RawSample, ForecastError> {
                let humidity_pct = entry.main.checked_humidity("forecast")?;
                let weather = first_weather(&entry.weather, "forecast")?;

                Ok(RawSample {
                    temperature_c: entry.main.temp,
                    humidity_pct,
                    condition_code: weather.icon.clone(),
                    description: weather.main.clone(),
                    wind_speed_mps: entry.wind.map(|w| w.speed),
                    timestamp_label: entry.dt_txt,
                })
            })
            .collect()
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, location: &str) -> Result<CurrentConditions, ForecastError> {
        self.get_json::<OwCurrentResponse>("weather", location, "current")
            .await?
            .into_current()
    }

    async fn forecast(&self, location: &str) -> Result<Vec<RawSample>, ForecastError> {
        self.get_json::<OwForecastResponse>("forecast", location, "forecast")
            .await?
            .into_samples()
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
