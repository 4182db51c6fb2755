//! Scheduler timing tests against a fake provider on a paused clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use forecast_core::{
    CacheState, Condition, CurrentConditions, ErrorKind, ForecastError, ForecastScheduler,
    RawSample, SchedulerHandle, SchedulerSettings, WeatherProvider,
};
use tokio::time::sleep;

const MINUTE: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
struct FakeProvider {
    current_calls: AtomicUsize,
    forecast_calls: AtomicUsize,
    failing: AtomicBool,
    delay_secs: AtomicU64,
}

impl FakeProvider {
    fn with_delay(delay: Duration) -> Self {
        let fake = Self::default();
        fake.delay_secs.store(delay.as_secs(), Ordering::SeqCst);
        fake
    }

    fn forecast_calls(&self) -> usize {
        self.forecast_calls.load(Ordering::SeqCst)
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    async fn respond<T>(&self, value: T) -> Result<T, ForecastError> {
        sleep(Duration::from_secs(self.delay_secs.load(Ordering::SeqCst))).await;
        if self.failing.load(Ordering::SeqCst) {
            return Err(ForecastError::Transport("connection refused".into()));
        }
        Ok(value)
    }
}

fn sample(label: &str, temp: f64) -> RawSample {
    RawSample {
        timestamp_label: label.to_string(),
        temperature_c: temp,
        humidity_pct: 70,
        condition_code: "10d".to_string(),
        description: "Rain".to_string(),
        wind_speed_mps: Some(2.0),
    }
}

#[async_trait]
impl WeatherProvider for FakeProvider {
    async fn current(&self, _location: &str) -> Result<CurrentConditions, ForecastError> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        self.respond(CurrentConditions {
            location: "Testville, IN".into(),
            temperature_c: 28.0,
            feels_like_c: Some(31.0),
            condition: Condition::PartlyCloudy,
            description: "Clouds".into(),
            humidity_pct: 75,
            wind_speed_kmh: 12.0,
            visibility_km: 8.0,
            pressure_hpa: Some(1008),
        })
        .await
    }

    async fn forecast(&self, _location: &str) -> Result<Vec<RawSample>, ForecastError> {
        self.forecast_calls.fetch_add(1, Ordering::SeqCst);
        self.respond(vec![
            sample("2025-06-01 09:00:00", 20.0),
            sample("2025-06-01 12:00:00", 22.0),
            sample("2025-06-01 15:00:00", 24.0),
            sample("2025-06-02 09:00:00", 18.0),
            sample("2025-06-02 12:00:00", 19.0),
            sample("2025-06-03 09:00:00", 25.0),
        ])
        .await
    }
}

fn settings() -> SchedulerSettings {
    SchedulerSettings {
        location: "Testville".to_string(),
        refresh_interval: 10 * MINUTE,
        fetch_timeout: 60 * MINUTE,
    }
}

fn start(fake: &Arc<FakeProvider>, settings: SchedulerSettings) -> SchedulerHandle {
    ForecastScheduler::new(fake.clone(), settings).start()
}

#[tokio::test(start_paused = true)]
async fn test_first_refresh_runs_immediately() {
    let fake = Arc::new(FakeProvider::default());
    let handle = start(&fake, settings());

    sleep(Duration::from_secs(1)).await;

    assert_eq!(fake.forecast_calls(), 1);
    assert_eq!(fake.current_calls.load(Ordering::SeqCst), 1);

    let view = handle.view();
    assert_eq!(view.current.as_ref().map(|c| c.location.as_str()), Some("Testville, IN"));
    assert_eq!(view.forecast.len(), 3);
    assert_eq!(view.forecast[0].day_label, "Today");
    assert_eq!((view.forecast[2].low_c, view.forecast[2].high_c), (25.0, 25.0));
    assert!(view.error.is_none());
    assert!(!view.refreshing);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_refreshes_on_fixed_interval() {
    let fake = Arc::new(FakeProvider::default());
    let handle = start(&fake, settings());

    sleep(Duration::from_secs(1)).await;
    assert_eq!(fake.forecast_calls(), 1);

    sleep(10 * MINUTE).await;
    assert_eq!(fake.forecast_calls(), 2);

    sleep(10 * MINUTE).await;
    assert_eq!(fake.forecast_calls(), 3);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_failure_keeps_last_good_snapshot() {
    let fake = Arc::new(FakeProvider::default());
    let handle = start(&fake, settings());

    sleep(Duration::from_secs(1)).await;
    let before = handle.snapshot();
    assert!(before.has_data());

    fake.set_failing(true);
    sleep(10 * MINUTE).await;
    assert_eq!(fake.forecast_calls(), 2);

    let after = handle.snapshot();
    assert_eq!(after.current, before.current);
    assert_eq!(after.forecast, before.forecast);
    assert_eq!(after.last_error.as_ref().map(ForecastError::kind), Some(ErrorKind::Transport));

    let view = handle.view();
    assert_eq!(view.forecast.len(), 3);
    assert!(view.banner().is_some());

    // Transient failures keep the timer going; recovery clears the error.
    fake.set_failing(false);
    sleep(10 * MINUTE).await;
    assert_eq!(fake.forecast_calls(), 3);
    assert!(handle.view().error.is_none());

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_tick_during_refresh_is_skipped() {
    // Each refresh takes 25 minutes; ticks at 10 and 20 minutes land mid-refresh.
    let fake = Arc::new(FakeProvider::with_delay(25 * MINUTE));
    let handle = start(&fake, settings());

    sleep(Duration::from_secs(1)).await;
    assert_eq!(fake.forecast_calls(), 1);
    assert!(handle.view().refreshing);

    sleep(25 * MINUTE).await;
    assert_eq!(fake.forecast_calls(), 1);
    assert!(!handle.view().refreshing);
    assert_eq!(handle.view().forecast.len(), 3);

    sleep(3 * MINUTE).await; // t = 28m
    assert_eq!(fake.forecast_calls(), 1);

    sleep(3 * MINUTE).await; // t = 31m, the 30 minute tick has fired
    assert_eq!(fake.forecast_calls(), 2);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_discards_in_flight_refresh() {
    let fake = Arc::new(FakeProvider::with_delay(5 * MINUTE));
    let handle = start(&fake, settings());
    let rx = handle.subscribe();

    sleep(MINUTE).await;
    assert!(handle.is_running());
    handle.stop().await;

    sleep(30 * MINUTE).await;

    let state: CacheState = rx.borrow().clone();
    assert!(state.current.is_none());
    assert!(state.forecast.is_none());
    assert!(state.refreshed_at.is_none());
    assert!(!state.is_refreshing);
    assert_eq!(fake.forecast_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_stops_timer() {
    let fake = Arc::new(FakeProvider::default());
    let handle = start(&fake, settings());

    sleep(Duration::from_secs(1)).await;
    drop(handle);

    sleep(30 * MINUTE).await;
    assert_eq!(fake.forecast_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_manual_trigger_refreshes_now() {
    let fake = Arc::new(FakeProvider::default());
    let handle = start(&fake, settings());

    sleep(Duration::from_secs(1)).await;
    assert!(handle.trigger());

    sleep(Duration::from_secs(1)).await;
    assert_eq!(fake.forecast_calls(), 2);

    // The timer grid is unaffected: next tick still at 10 minutes.
    sleep(10 * MINUTE - Duration::from_secs(3)).await;
    assert_eq!(fake.forecast_calls(), 2);
    sleep(Duration::from_secs(2)).await;
    assert_eq!(fake.forecast_calls(), 3);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_trigger_during_refresh_is_noop() {
    let fake = Arc::new(FakeProvider::with_delay(5 * MINUTE));
    let handle = start(&fake, settings());

    sleep(Duration::from_secs(1)).await;
    assert!(!handle.trigger());

    sleep(8 * MINUTE).await; // t = 8m, first refresh done at 5m
    assert_eq!(fake.forecast_calls(), 1);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_fetch_timeout_is_transport_error() {
    let fake = Arc::new(FakeProvider::with_delay(120 * MINUTE));
    let handle = start(
        &fake,
        SchedulerSettings {
            fetch_timeout: MINUTE,
            ..settings()
        },
    );

    sleep(2 * MINUTE).await;

    let view = handle.view();
    assert!(!view.refreshing);
    assert!(view.current.is_none());
    let err = view.error.expect("timeout recorded");
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.to_string().contains("timed out"));

    handle.stop().await;
}
