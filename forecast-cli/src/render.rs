//! Plain-text rendering of a [`ForecastView`].

use std::fmt::Write;

use chrono::Local;
use forecast_core::{CurrentConditions, DailySummary, ForecastView};

/// Whole degrees, rounding halves up like the dashboard does.
fn deg(value: f64) -> i64 {
    value.round() as i64
}

pub fn render(view: &ForecastView) -> String {
    let mut out = String::new();

    if let Some(banner) = view.banner() {
        let _ = writeln!(out, "! {banner}\n");
    }

    match &view.current {
        Some(current) => render_current(&mut out, current),
        None => out.push_str("Current weather: unavailable\n"),
    }

    out.push('\n');
    if view.forecast.is_empty() {
        out.push_str("Forecast: unavailable\n");
    } else {
        out.push_str("Forecast\n");
        for day in &view.forecast {
            render_day(&mut out, day);
        }
    }

    if let Some(at) = view.refreshed_at {
        let _ = writeln!(out, "\nUpdated {}", at.with_timezone(&Local).format("%H:%M"));
    }

    out
}

fn render_current(out: &mut String, current: &CurrentConditions) {
    let _ = writeln!(out, "Current weather: {}", current.location);

    let _ = write!(
        out,
        "  {}°C  {} ({})",
        deg(current.temperature_c),
        current.description,
        current.icon()
    );
    if let Some(feels_like) = current.feels_like_c {
        let _ = write!(out, "  feels like {}°C", deg(feels_like));
    }
    out.push('\n');

    let _ = write!(
        out,
        "  Humidity {}%  Wind {} km/h  Visibility {} km",
        current.humidity_pct,
        deg(current.wind_speed_kmh),
        deg(current.visibility_km)
    );
    if let Some(pressure) = current.pressure_hpa {
        let _ = write!(out, "  Pressure {pressure} hPa");
    }
    out.push('\n');
}

fn render_day(out: &mut String, day: &DailySummary) {
    let _ = writeln!(
        out,
        "  {:<10} {}  {:>3}° / {:>3}°  {:<14} humidity {}%",
        day.day_label,
        day.date,
        deg(day.high_c),
        deg(day.low_c),
        format!("{} ({})", day.description, day.icon()),
        day.avg_humidity_pct
    );
}
