use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::FetchError;

/// A validated geographic point.
///
/// Latitude is clamped to [-90, 90] and longitude to [-180, 180] at
/// construction; both components are rounded to 6 decimal places, the
/// precision the provider accepts and the map picker emits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Ankara city centre, the app's fallback map point.
    pub const ANKARA: Coordinate = Coordinate { latitude: 39.92077, longitude: 32.85411 };

    /// Returns `None` for non-finite or out-of-range components.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return None;
        }
        Some(Self { latitude: round6(latitude), longitude: round6(longitude) })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

fn round6(v: f64) -> f64 {
    (v * 1_000_000.0).round() / 1_000_000.0
}

/// The `{ lat, lon }` string pair a navigation event carries after the
/// map-picker round trip. Both values are decimal encodings to 6 places.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateEvent {
    pub lat: String,
    pub lon: String,
}

impl CoordinateEvent {
    /// Parse the pair into a coordinate.
    ///
    /// Malformed strings mean "no coordinate provided": the caller must
    /// not start a fetch for them.
    pub fn coordinate(&self) -> Option<Coordinate> {
        let lat = self.lat.trim().parse::<f64>().ok()?;
        let lon = self.lon.trim().parse::<f64>().ok()?;
        Coordinate::new(lat, lon)
    }
}

/// Live conditions at a point, produced once per fetch and replaced
/// wholesale by the next one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentWeather {
    pub location_name: String,
    pub temperature_c: f64,
    pub condition_text: String,
    pub condition_icon: String,
    pub coordinate: Coordinate,
}

impl CurrentWeather {
    /// Large icon for the main weather card.
    pub fn icon_url(&self) -> String {
        format!("https://openweathermap.org/img/wn/{}@4x.png", self.condition_icon)
    }
}

/// One forecast entry: either a 3-hour slot from the provider or the
/// "now" reading derived from [`CurrentWeather`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSample {
    /// Unix seconds.
    pub timestamp: i64,
    pub temperature_c: f64,
    pub condition_text: String,
    pub condition_icon: String,
}

impl ForecastSample {
    /// Small icon for outlook rows.
    pub fn icon_url(&self) -> String {
        format!("https://openweathermap.org/img/wn/{}@2x.png", self.condition_icon)
    }

    /// Sample time in the display timezone. `None` only for timestamps
    /// outside the representable range.
    pub fn local_time(&self) -> Option<DateTime<Local>> {
        DateTime::from_timestamp(self.timestamp, 0).map(|dt| dt.with_timezone(&Local))
    }
}

/// Today's live reading followed by up to four future midday readings,
/// one per calendar day in strictly increasing order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailySampleSeries {
    samples: Vec<ForecastSample>,
}

impl DailySampleSeries {
    pub(crate) fn new(samples: Vec<ForecastSample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[ForecastSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The "now" entry, present on any series built from a successful fetch.
    pub fn today(&self) -> Option<&ForecastSample> {
        self.samples.first()
    }
}

/// Lifecycle of a fetch. Exactly one value is live at a time, owned by
/// the controller; presentation layers read snapshots of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FetchState {
    #[default]
    Idle,
    Pending,
    Succeeded(CurrentWeather, DailySampleSeries),
    Failed(FetchError),
}

impl FetchState {
    pub fn is_pending(&self) -> bool {
        matches!(self, FetchState::Pending)
    }
}
