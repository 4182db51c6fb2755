use crate::{
    Config, CurrentConditions, ForecastError, RawSample,
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Source of raw weather data.
///
/// Current conditions and the forecast are independent operations: either may
/// fail without affecting the other.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, location: &str) -> Result<CurrentConditions, ForecastError>;

    /// Chronologically ordered samples, a few hours apart.
    async fn forecast(&self, location: &str) -> Result<Vec<RawSample>, ForecastError>;
}

/// Construct the provider described by `config`.
///
/// A missing API key is not an error here; the provider reports it as
/// [`ForecastError::Configuration`] on every fetch without touching the network.
pub fn provider_from_config(config: &Config) -> Result<Arc<dyn WeatherProvider>, ForecastError> {
    let provider = OpenWeatherProvider::new(
        config.resolved_api_key(),
        &config.base_url,
        config.fetch_timeout(),
    )?;

    Ok(Arc::new(provider))
}
