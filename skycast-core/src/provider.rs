use crate::{
    Config,
    error::FetchError,
    model::{Coordinate, CurrentWeather, ForecastSample},
    provider::openweather::OpenWeatherApi,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Remote weather source for a geographic point.
///
/// The two operations are independent; the aggregator issues them
/// concurrently and joins the results.
#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    /// Live conditions at the coordinate.
    async fn current_conditions(&self, coordinate: Coordinate)
    -> Result<CurrentWeather, FetchError>;

    /// Chronologically ordered 3-hour forecast entries for the coming days.
    async fn forecast(&self, coordinate: Coordinate) -> Result<Vec<ForecastSample>, FetchError>;
}

/// Construct the OpenWeather client from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<OpenWeatherApi> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured.\n\
             Hint: run `skycast configure` and enter your OpenWeather API key."
        )
    })?;

    Ok(OpenWeatherApi::new(api_key.to_owned()))
}
