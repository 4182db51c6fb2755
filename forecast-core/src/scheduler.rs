//! Periodic refresh of current conditions and the daily forecast.
//!
//! A single background task owns the [`CacheState`]. It refreshes once on
//! start, then on a fixed grid of ticks (`start + k * interval`). Ticks that
//! come due while a refresh is in flight are skipped, never queued. Each
//! refresh publishes one fully built snapshot through a `watch` channel;
//! readers only ever see complete states.
//!
//! Stopping cancels the timer and drops any in-flight fetch, so a late
//! completion can never overwrite state after teardown.

use std::{ops::ControlFlow, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{Instant, sleep_until, timeout},
};
use tokio_util::sync::CancellationToken;

use crate::{
    Config, CurrentConditions, DailySummary, ForecastError,
    aggregate::daily_forecast,
    error::ErrorKind,
    provider::WeatherProvider,
    view::ForecastView,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerSettings {
    pub location: String,
    pub refresh_interval: Duration,
    /// Bound on each provider call; keep it below `refresh_interval`.
    pub fetch_timeout: Duration,
}

impl From<&Config> for SchedulerSettings {
    fn from(config: &Config) -> Self {
        Self {
            location: config.location.clone(),
            refresh_interval: config.refresh_interval(),
            fetch_timeout: config.fetch_timeout(),
        }
    }
}

/// Everything the scheduler knows. Cloned into each published snapshot.
///
/// `current` and `forecast` are the last good values of two independent
/// fetches; a failure of one never clears the other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheState {
    pub current: Option<CurrentConditions>,
    pub forecast: Option<Vec<DailySummary>>,
    pub last_error: Option<ForecastError>,
    pub is_refreshing: bool,
    /// Time of the last refresh that completed, successful or not.
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl CacheState {
    pub fn has_data(&self) -> bool {
        self.current.is_some() || self.forecast.is_some()
    }

    /// Fold the outcome of one refresh into the state.
    ///
    /// Successful results replace their slot wholesale; failed ones leave the
    /// previous value untouched. `last_error` is cleared only when both
    /// fetches succeeded.
    pub fn apply(&mut self, outcome: RefreshOutcome, now: DateTime<Utc>) {
        let mut error = None;

        match outcome.current {
            Ok(current) => self.current = Some(current),
            Err(e) => error = Some(e),
        }
        match outcome.forecast {
            Ok(forecast) => self.forecast = Some(forecast),
            Err(e) => {
                error.get_or_insert(e);
            }
        }

        self.last_error = error;
        self.is_refreshing = false;
        self.refreshed_at = Some(now);
    }
}

/// Results of one pass over both provider operations.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub current: Result<CurrentConditions, ForecastError>,
    pub forecast: Result<Vec<DailySummary>, ForecastError>,
}

impl RefreshOutcome {
    fn has_configuration_error(&self) -> bool {
        let is_config = |e: &ForecastError| e.kind() == ErrorKind::Configuration;
        self.current.as_ref().err().is_some_and(is_config)
            || self.forecast.as_ref().err().is_some_and(is_config)
    }
}

/// Run fetch, normalize, group and summarize once.
///
/// Both provider calls run concurrently and each is bounded by `fetch_timeout`.
pub async fn fetch_once(
    provider: &dyn WeatherProvider,
    location: &str,
    fetch_timeout: Duration,
) -> RefreshOutcome {
    let (current, forecast) = tokio::join!(
        bounded(fetch_timeout, "current conditions", provider.current(location)),
        bounded(fetch_timeout, "forecast", provider.forecast(location)),
    );

    RefreshOutcome {
        current,
        forecast: forecast.map(daily_forecast),
    }
}

async fn bounded<T>(
    limit: Duration,
    what: &str,
    fut: impl Future<Output = Result<T, ForecastError>>,
) -> Result<T, ForecastError> {
    timeout(limit, fut).await.unwrap_or_else(|_| {
        Err(ForecastError::Transport(format!(
            "{what} request timed out after {}s",
            limit.as_secs()
        )))
    })
}

#[derive(Debug)]
pub struct ForecastScheduler {
    provider: Arc<dyn WeatherProvider>,
    settings: SchedulerSettings,
}

impl ForecastScheduler {
    pub fn new(provider: Arc<dyn WeatherProvider>, settings: SchedulerSettings) -> Self {
        Self { provider, settings }
    }

    /// Spawn the refresh task. The first refresh starts immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(self) -> SchedulerHandle {
        let (state_tx, state_rx) = watch::channel(CacheState::default());
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        tracing::info!(
            "Starting forecast scheduler for {} (every {}s)",
            self.settings.location,
            self.settings.refresh_interval.as_secs()
        );

        let task = tokio::spawn(self.run(state_tx, trigger_rx, cancel.clone()));

        SchedulerHandle {
            state: state_rx,
            triggers: trigger_tx,
            cancel,
            task: Some(task),
        }
    }

    async fn run(
        self,
        state: watch::Sender<CacheState>,
        mut triggers: mpsc::Receiver<()>,
        cancel: CancellationToken,
    ) {
        let period = self.settings.refresh_interval;
        let mut next_tick = Instant::now() + period;

        while self.refresh(&state, &cancel).await.is_continue() {
            let now = Instant::now();
            while next_tick <= now {
                tracing::debug!("Skipping refresh tick that came due mid-refresh");
                next_tick += period;
            }
            // Manual triggers that arrived mid-refresh are dropped too.
            while triggers.try_recv().is_ok() {}

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep_until(next_tick) => next_tick += period,
                Some(()) = triggers.recv() => tracing::debug!("Manual refresh requested"),
            }
        }

        tracing::info!("Forecast scheduler stopped");
    }

    async fn refresh(
        &self,
        state: &watch::Sender<CacheState>,
        cancel: &CancellationToken,
    ) -> ControlFlow<()> {
        state.send_modify(|s| s.is_refreshing = true);
        tracing::debug!("Refreshing weather for {}", self.settings.location);

        let fetch = fetch_once(
            self.provider.as_ref(),
            &self.settings.location,
            self.settings.fetch_timeout,
        );

        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Discarding in-flight refresh after stop");
                state.send_modify(|s| s.is_refreshing = false);
                return ControlFlow::Break(());
            }
            outcome = fetch => outcome,
        };

        if cancel.is_cancelled() {
            tracing::debug!("Discarding refresh that completed after stop");
            return ControlFlow::Break(());
        }

        let configuration_error = outcome.has_configuration_error();
        state.send_modify(|s| s.apply(outcome, Utc::now()));

        let last_error = state.borrow().last_error.clone();
        match &last_error {
            None => tracing::info!("Weather refreshed for {}", self.settings.location),
            Some(e) if !e.is_retryable() => tracing::error!("{e}"),
            Some(e) => tracing::warn!("Weather refresh failed, keeping last good data: {e}"),
        }

        if configuration_error {
            tracing::error!("Refresh timer stopped until the provider is reconfigured");
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

/// Owner-side handle to a running scheduler.
///
/// Dropping the handle stops the scheduler as well; `stop` additionally waits
/// for the task to wind down.
#[derive(Debug)]
pub struct SchedulerHandle {
    state: watch::Receiver<CacheState>,
    triggers: mpsc::Sender<()>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Read-only view of the latest published snapshot.
    pub fn view(&self) -> ForecastView {
        ForecastView::from(&*self.state.borrow())
    }

    pub fn snapshot(&self) -> CacheState {
        self.state.borrow().clone()
    }

    /// Receiver that wakes on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<CacheState> {
        self.state.clone()
    }

    /// Ask for an immediate refresh.
    ///
    /// Returns `false` (and does nothing) when a refresh is already in flight
    /// or already requested.
    pub fn trigger(&self) -> bool {
        if self.state.borrow().is_refreshing {
            return false;
        }
        self.triggers.try_send(()).is_ok()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Forecast scheduler task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
