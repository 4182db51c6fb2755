use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use forecast_core::{
    CacheState, Config, ForecastScheduler, ForecastView, SchedulerSettings, provider_from_config,
    scheduler::fetch_once,
};

use crate::render::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Daily weather forecast for the farm dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and default location.
    Configure {
        /// API key; prompted for when absent.
        #[arg(long)]
        api_key: Option<String>,

        /// Location query, e.g. "Bhubaneswar,IN"; prompted for when absent.
        #[arg(long)]
        location: Option<String>,
    },

    /// Fetch once and print current conditions and the daily forecast.
    Show {
        /// Override the configured location.
        #[arg(long)]
        location: Option<String>,
    },

    /// Keep refreshing on the configured interval until Ctrl-C.
    Watch {
        /// Override the configured location.
        #[arg(long)]
        location: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure { api_key, location } => configure(api_key, location),
            Command::Show { location } => show(load_config(location)?).await,
            Command::Watch { location } => watch(load_config(location)?).await,
        }
    }
}

fn load_config(location: Option<String>) -> Result<Config> {
    let mut cfg = Config::load()?;
    if let Some(location) = location {
        cfg.location = location;
    }
    cfg.validate().context("Invalid configuration")?;
    Ok(cfg)
}

fn configure(api_key: Option<String>, location: Option<String>) -> Result<()> {
    let mut cfg = Config::load()?;

    let api_key = match api_key {
        Some(key) => key,
        None => inquire::Password::new("OpenWeather API key:")
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?,
    };
    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    let location = match location {
        Some(location) => location,
        None => inquire::Text::new("Location:")
            .with_default(&cfg.location)
            .prompt()
            .context("Failed to read location")?,
    };

    cfg.set_api_key(api_key.trim().to_string());
    cfg.location = location;
    cfg.validate().context("Invalid configuration")?;
    cfg.save()?;

    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(cfg: Config) -> Result<()> {
    let provider = provider_from_config(&cfg)?;
    let outcome = fetch_once(provider.as_ref(), &cfg.location, cfg.fetch_timeout()).await;

    let mut state = CacheState::default();
    state.apply(outcome, Utc::now());
    print!("{}", render(&ForecastView::from(&state)));

    if !state.has_data() {
        if let Some(err) = state.last_error {
            return Err(err.into());
        }
    }
    Ok(())
}

async fn watch(cfg: Config) -> Result<()> {
    let provider = provider_from_config(&cfg)?;
    let handle = ForecastScheduler::new(provider, SchedulerSettings::from(&cfg)).start();
    let mut updates = handle.subscribe();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    // The scheduler gave up (missing credential); nothing more will arrive.
                    break;
                }
                let view = ForecastView::from(&*updates.borrow_and_update());
                if !view.refreshing {
                    print!("{}", render(&view));
                }
            }
        }
    }

    let stopped_with = handle.snapshot().last_error.filter(|e| !e.is_retryable());
    handle.stop().await;

    match stopped_with {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}
