//! Error types for the weather card pipeline.

use reqwest::StatusCode;
use thiserror::Error;

/// Message surfaced to the caller for every unrecoverable failure.
pub const PUBLIC_FAILURE_MESSAGE: &str = "Sorry, an error occurred.";

/// Signing secret configuration errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("signing secret is not valid base64: {0}")]
    InvalidSecret(#[from] base64::DecodeError),

    #[error("signing secret is empty")]
    EmptySecret,
}

/// Failures of either weather provider lookup.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Transport failure, including timeouts.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status other than the recoverable not-found.
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The extended lookup answered 404 for coordinates the provider itself returned.
    #[error("extended lookup reported not found for ({lat}, {lon})")]
    UnexpectedNotFound { lat: f64, lon: f64 },

    #[error("failed to decode provider response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("provider response carried no weather condition")]
    MissingCondition,

    #[error("timestamp {0} is out of range")]
    InvalidTimestamp(i64),
}

/// Card template errors.
#[derive(Debug, Error)]
pub enum CardError {
    #[error("invalid card template: {0}")]
    Template(#[source] serde_json::Error),

    #[error("failed to serialize card data: {0}")]
    Data(#[source] serde_json::Error),
}

/// Unrecoverable request handling failure.
///
/// Always displays as [`PUBLIC_FAILURE_MESSAGE`]; the cause is reachable
/// through [`std::error::Error::source`] for logging.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{}", PUBLIC_FAILURE_MESSAGE)]
    MalformedInput(#[source] serde_json::Error),

    #[error("{}", PUBLIC_FAILURE_MESSAGE)]
    Acquisition(#[from] WeatherError),

    #[error("{}", PUBLIC_FAILURE_MESSAGE)]
    Render(#[from] CardError),
}

pub type Result<T> = std::result::Result<T, WeatherError>;
