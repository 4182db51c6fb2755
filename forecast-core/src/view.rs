use chrono::{DateTime, Utc};

use crate::{CurrentConditions, DailySummary, ForecastError, scheduler::CacheState};

/// What the rendering layer gets to see. Built from a published snapshot;
/// holding one never blocks or triggers a refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastView {
    pub current: Option<CurrentConditions>,
    /// Ordered by date; empty until the first successful forecast fetch.
    pub forecast: Vec<DailySummary>,
    pub error: Option<ForecastError>,
    pub refreshing: bool,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl From<&CacheState> for ForecastView {
    fn from(state: &CacheState) -> Self {
        Self {
            current: state.current.clone(),
            forecast: state.forecast.clone().unwrap_or_default(),
            error: state.last_error.clone(),
            refreshing: state.is_refreshing,
            refreshed_at: state.refreshed_at,
        }
    }
}

impl ForecastView {
    /// Banner to show above the data, if any.
    pub fn banner(&self) -> Option<String> {
        self.error.as_ref().map(ForecastError::user_message)
    }
}
