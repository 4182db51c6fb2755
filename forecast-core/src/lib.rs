//! Core library for the `forecast` dashboard tool.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over the weather provider (OpenWeather)
//! - Normalization of provider condition codes
//! - Grouping of 3-hourly samples into daily summaries
//! - A refresh scheduler that keeps the last good data across failures
//!
//! It is used by `forecast-cli`, but any front end can drive the scheduler and
//! read [`ForecastView`] snapshots.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod scheduler;
pub mod view;

pub use config::Config;
pub use error::{ErrorKind, ForecastError};
pub use model::{
    Condition, CurrentConditions, DailySummary, DayBucket, NormalizedSample, RawSample,
};
pub use provider::{WeatherProvider, provider_from_config};
pub use scheduler::{CacheState, ForecastScheduler, SchedulerHandle, SchedulerSettings};
pub use view::ForecastView;
