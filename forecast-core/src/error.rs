//! Error taxonomy for the forecast pipeline.
//!
//! Every failure a refresh can hit falls into one of three kinds. The
//! scheduler records the error next to the last good data instead of
//! propagating it, so the type is `Clone` and lives inside published
//! snapshots.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Transport,
    Schema,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Missing or invalid credential. No request is attempted.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Network failure, timeout or non-success HTTP status.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider answered, but not with the shape we expect.
    #[error("Schema error: {0}")]
    Schema(String),
}

impl ForecastError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Schema(_) => ErrorKind::Schema,
        }
    }

    /// Whether waiting for the next scheduled refresh can fix this.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Configuration(_))
    }

    /// Banner text for the presentation layer.
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(msg) => format!(
                "{msg}\nHint: run `forecast configure` or set OPENWEATHER_API_KEY."
            ),
            Self::Transport(_) => {
                "Could not reach the weather service. Showing the last known data.".to_string()
            }
            Self::Schema(_) => {
                "The weather service returned unexpected data. Showing the last known data."
                    .to_string()
            }
        }
    }
}
