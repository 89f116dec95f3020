use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::{
    error::FetchError,
    model::{Coordinate, CurrentWeather, ForecastSample},
};

use super::WeatherApi;

const CURRENT_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const FORECAST_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";

/// Display language requested from the provider.
const LANG: &str = "tr";

/// Application-level success code embedded in the response body.
const OK_CODE: i64 = 200;

#[derive(Debug, Clone)]
pub struct OpenWeatherApi {
    api_key: String,
    http: Client,
}

impl OpenWeatherApi {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            http: Client::new(),
        }
    }

    async fn get(&self, url: &str, coordinate: Coordinate) -> Result<String, FetchError> {
        let res = self
            .http
            .get(url)
            .query(&[
                ("lat", format!("{:.6}", coordinate.latitude())),
                ("lon", format!("{:.6}", coordinate.longitude())),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_owned()),
                ("lang", LANG.to_owned()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::NetworkFailure(e.to_string()))?;

        res.text().await.map_err(|e| FetchError::NetworkFailure(e.to_string()))
    }
}

#[async_trait]
impl WeatherApi for OpenWeatherApi {
    async fn current_conditions(
        &self,
        coordinate: Coordinate,
    ) -> Result<CurrentWeather, FetchError> {
        debug!(%coordinate, "requesting current conditions");
        let body = self.get(CURRENT_URL, coordinate).await?;
        parse_current(&body, coordinate)
    }

    async fn forecast(&self, coordinate: Coordinate) -> Result<Vec<ForecastSample>, FetchError> {
        debug!(%coordinate, "requesting 3-hour forecast");
        let body = self.get(FORECAST_URL, coordinate).await?;
        parse_forecast(&body)
    }
}

/// The provider reports success or failure inside the JSON body; `cod`
/// arrives as a number on some paths and a string on others.
#[derive(Debug, Deserialize)]
struct OwStatus {
    #[serde(default, deserialize_with = "de_code")]
    cod: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

fn de_code<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }))
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    #[serde(default)]
    coord: Option<OwCoord>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

/// Validate and convert the current-conditions body.
///
/// The `cod` check runs before the full schema parse so a provider error
/// envelope (which lacks the weather fields) still surfaces as a
/// rejection rather than a malformed payload.
pub(crate) fn parse_current(
    body: &str,
    requested: Coordinate,
) -> Result<CurrentWeather, FetchError> {
    let status: OwStatus = serde_json::from_str(body)
        .map_err(|e| FetchError::MalformedResponse(format!("current conditions: {e}")))?;

    if let Some(code) = status.cod {
        if code != OK_CODE {
            let message =
                status.message.unwrap_or_else(|| "provider reported an error".to_owned());
            return Err(FetchError::ProviderRejected(message));
        }
    }

    let parsed: OwCurrentResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::MalformedResponse(format!("current conditions: {e}")))?;

    let condition = parsed.weather.into_iter().next().ok_or_else(|| {
        FetchError::MalformedResponse("current conditions: empty weather list".to_owned())
    })?;

    // Prefer the echoed coordinate; the provider rounds it and sometimes
    // drops it, so fall back to the requested one.
    let coordinate = parsed
        .coord
        .and_then(|c| Coordinate::new(c.lat, c.lon))
        .unwrap_or(requested);

    Ok(CurrentWeather {
        location_name: parsed.name,
        temperature_c: parsed.main.temp,
        condition_text: condition.description,
        condition_icon: condition.icon,
        coordinate,
    })
}

/// Validate and convert the forecast body into chronological samples.
pub(crate) fn parse_forecast(body: &str) -> Result<Vec<ForecastSample>, FetchError> {
    let parsed: OwForecastResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::MalformedResponse(format!("forecast: {e}")))?;

    parsed
        .list
        .into_iter()
        .map(|entry| {
            let condition = entry.weather.into_iter().next().ok_or_else(|| {
                FetchError::MalformedResponse("forecast: entry with empty weather list".to_owned())
            })?;
            Ok(ForecastSample {
                timestamp: entry.dt,
                temperature_c: entry.main.temp,
                condition_text: condition.description,
                condition_icon: condition.icon,
            })
        })
        .collect()
}
