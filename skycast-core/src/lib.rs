//! Core library for the `skycast` weather app.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client and the forecast-aggregation routine
//! - The request lifecycle controller (debounced loading indicator,
//!   stale-response protection, one-shot event guard)
//! - Shared domain models
//!
//! It is used by `skycast-cli`, but can also back other front ends that
//! need point weather with a 5-day outlook.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod provider;

pub use aggregator::fetch_forecast;
pub use config::Config;
pub use error::FetchError;
pub use lifecycle::{FetchController, LocationSource, SPINNER_DELAY};
pub use model::{
    Coordinate, CoordinateEvent, CurrentWeather, DailySampleSeries, FetchState, ForecastSample,
};
pub use provider::{WeatherApi, provider_from_config};
