//! Core library for the weather card bot.
//!
//! This crate defines:
//! - Request signature verification
//! - Location extraction from chat messages
//! - The OpenWeather client and data normalization
//! - Adaptive Card rendering
//! - The request handler that ties them together
//!
//! It is used by `weathercard-bot`, but carries no transport of its own.

pub mod auth;
pub mod card;
pub mod config;
pub mod error;
pub mod handler;
pub mod location;
pub mod model;
pub mod provider;

pub use auth::{SigningKey, Verification};
pub use card::CardRenderer;
pub use config::Config;
pub use error::{HandlerError, PUBLIC_FAILURE_MESSAGE, WeatherError};
pub use handler::{Handler, RequestState};
pub use location::extract_location;
pub use model::{CardResult, LocationQuery, OutgoingActivity, WeatherCardModel};
pub use provider::{Acquisition, Lookup, WeatherProvider, WeatherService};
