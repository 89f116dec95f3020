//! Forecast aggregation: one coordinate in, a live reading plus a
//! daily-sampled outlook out.

use chrono::{DateTime, Local, Timelike};
use tracing::debug;

use crate::{
    error::FetchError,
    model::{Coordinate, CurrentWeather, DailySampleSeries, ForecastSample},
    provider::WeatherApi,
};

/// Future samples are taken at this local hour. A day without an exact
/// match is omitted from the series rather than substituted with the
/// nearest slot.
const MIDDAY_HOUR: u32 = 12;

/// Future samples per series; with the "now" entry the series holds at
/// most five days.
const MAX_FUTURE_DAYS: usize = 4;

/// Fetch current conditions and the multi-day forecast for `coordinate`
/// and merge them into one daily sample series.
///
/// The two remote requests run concurrently and the operation fails as a
/// whole if either of them does; no partial result is ever returned. The
/// aggregator keeps no state between calls.
pub async fn fetch_forecast<P: WeatherApi + ?Sized>(
    provider: &P,
    coordinate: Coordinate,
) -> Result<(CurrentWeather, DailySampleSeries), FetchError> {
    let (current, entries) = tokio::join!(
        provider.current_conditions(coordinate),
        provider.forecast(coordinate),
    );
    let current = current?;
    let entries = entries?;

    let series = daily_series(&current, &entries, Local::now());
    debug!(days = series.len(), location = %current.location_name, "assembled daily sample series");

    Ok((current, series))
}

/// Build the series: one entry for "now" carrying the real fetch
/// timestamp, then the midday entry of each strictly later calendar day
/// in encounter order, capped at [`MAX_FUTURE_DAYS`].
fn daily_series(
    current: &CurrentWeather,
    entries: &[ForecastSample],
    now: DateTime<Local>,
) -> DailySampleSeries {
    let mut samples = Vec::with_capacity(MAX_FUTURE_DAYS + 1);
    samples.push(ForecastSample {
        timestamp: now.timestamp(),
        temperature_c: current.temperature_c,
        condition_text: current.condition_text.clone(),
        condition_icon: current.condition_icon.clone(),
    });

    // The day comparison is truncated to the calendar date; last_day
    // advancing on every accepted entry keeps the days strictly
    // increasing even if the provider repeats a slot.
    let mut last_day = now.date_naive();
    for entry in entries {
        if samples.len() == MAX_FUTURE_DAYS + 1 {
            break;
        }
        let Some(local) = entry.local_time() else { continue };
        if local.date_naive() > last_day && local.hour() == MIDDAY_HOUR {
            last_day = local.date_naive();
            samples.push(entry.clone());
        }
    }

    DailySampleSeries::new(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::openweather::{parse_current, parse_forecast};
    use async_trait::async_trait;
    use chrono::{Days, TimeZone};

    fn ankara() -> Coordinate {
        Coordinate::new(39.9334, 32.8597).expect("in range")
    }

    fn current(temp: f64) -> CurrentWeather {
        CurrentWeather {
            location_name: "Ankara".into(),
            temperature_c: temp,
            condition_text: "açık".into(),
            condition_icon: "01d".into(),
            coordinate: ankara(),
        }
    }

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 10, 15, 30, 0).unwrap()
    }

    /// A forecast entry `days_ahead` days from `now` at the given local hour.
    fn entry_at(now: DateTime<Local>, days_ahead: u64, hour: u32, temp: f64) -> ForecastSample {
        let ts = (now.date_naive() + Days::new(days_ahead))
            .and_hms_opt(hour, 0, 0)
            .expect("valid time")
            .and_local_timezone(Local)
            .unwrap()
            .timestamp();
        ForecastSample {
            timestamp: ts,
            temperature_c: temp,
            condition_text: "bulutlu".into(),
            condition_icon: "03d".into(),
        }
    }

    #[test]
    fn series_starts_with_the_live_reading_at_fetch_time() {
        let now = fixed_now();
        let series = daily_series(&current(21.4), &[], now);

        assert_eq!(series.len(), 1);
        let today = series.today().expect("today entry");
        assert_eq!(today.timestamp, now.timestamp());
        assert_eq!(today.temperature_c, 21.4);
    }

    #[test]
    fn series_takes_one_midday_entry_per_future_day() {
        let now = fixed_now();
        let entries = vec![
            entry_at(now, 1, 12, 10.0),
            entry_at(now, 2, 12, 11.0),
            entry_at(now, 3, 12, 12.0),
            entry_at(now, 4, 12, 13.0),
        ];
        let series = daily_series(&current(21.4), &entries, now);

        assert_eq!(series.len(), 5);
        let temps: Vec<f64> =
            series.samples().iter().map(|s| s.temperature_c).collect();
        assert_eq!(temps, vec![21.4, 10.0, 11.0, 12.0, 13.0]);
    }

    #[test]
    fn non_midday_hours_are_never_selected() {
        let now = fixed_now();
        let entries = vec![
            entry_at(now, 1, 9, 10.0),
            entry_at(now, 1, 15, 10.5),
            entry_at(now, 2, 11, 11.0),
            entry_at(now, 3, 13, 12.0),
        ];
        let series = daily_series(&current(21.4), &entries, now);

        // Hour filter is exact-match: days without a 12:00 slot are
        // silently omitted, not substituted.
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn todays_midday_entry_is_excluded() {
        let now = Local.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap();
        let entries = vec![entry_at(now, 0, 12, 9.0), entry_at(now, 1, 12, 10.0)];
        let series = daily_series(&current(21.4), &entries, now);

        assert_eq!(series.len(), 2);
        assert_eq!(series.samples()[1].temperature_c, 10.0);
    }

    #[test]
    fn series_is_capped_at_five_days() {
        let now = fixed_now();
        let entries: Vec<ForecastSample> =
            (1..=7).map(|d| entry_at(now, d, 12, f64::from(d as u32))).collect();
        let series = daily_series(&current(21.4), &entries, now);

        assert_eq!(series.len(), 5);
        assert_eq!(series.samples()[4].temperature_c, 4.0);
    }

    #[test]
    fn repeated_midday_slots_keep_days_distinct() {
        let now = fixed_now();
        let entries = vec![
            entry_at(now, 1, 12, 10.0),
            entry_at(now, 1, 12, 99.0),
            entry_at(now, 2, 12, 11.0),
        ];
        let series = daily_series(&current(21.4), &entries, now);

        assert_eq!(series.len(), 3);
        assert_eq!(series.samples()[1].temperature_c, 10.0);

        let days: Vec<_> = series
            .samples()
            .iter()
            .filter_map(|s| s.local_time().map(|t| t.date_naive()))
            .collect();
        let mut deduped = days.clone();
        deduped.dedup();
        assert_eq!(deduped, days);
    }

    #[derive(Debug)]
    struct StubApi {
        current_body: String,
        forecast_body: String,
    }

    #[async_trait]
    impl WeatherApi for StubApi {
        async fn current_conditions(
            &self,
            coordinate: Coordinate,
        ) -> Result<CurrentWeather, FetchError> {
            parse_current(&self.current_body, coordinate)
        }

        async fn forecast(&self, _: Coordinate) -> Result<Vec<ForecastSample>, FetchError> {
            parse_forecast(&self.forecast_body)
        }
    }

    fn forecast_body_with_next_four_middays() -> String {
        let now = Local::now();
        let entries: Vec<String> = (1..=4)
            .map(|d| {
                let ts = (now.date_naive() + Days::new(d))
                    .and_hms_opt(12, 0, 0)
                    .expect("valid time")
                    .and_local_timezone(Local)
                    .unwrap()
                    .timestamp();
                format!(
                    r#"{{ "dt": {ts}, "main": {{ "temp": {} }}, "weather": [{{ "description": "bulutlu", "icon": "03d" }}] }}"#,
                    10 + d
                )
            })
            .collect();
        format!(r#"{{ "cod": "200", "list": [{}] }}"#, entries.join(","))
    }

    #[tokio::test]
    async fn end_to_end_payloads_yield_a_five_day_series() {
        let stub = StubApi {
            current_body: r#"{
                "cod": 200,
                "name": "Ankara",
                "main": { "temp": 21.4 },
                "weather": [{ "description": "açık", "icon": "01d" }]
            }"#
            .to_owned(),
            forecast_body: forecast_body_with_next_four_middays(),
        };

        let (current, series) =
            fetch_forecast(&stub, ankara()).await.expect("both payloads valid");

        assert_eq!(current.location_name, "Ankara");
        assert_eq!(series.len(), 5);
        assert_eq!(series.today().expect("today entry").temperature_c.round(), 21.0);
    }

    #[tokio::test]
    async fn provider_rejection_wins_over_a_valid_forecast() {
        let stub = StubApi {
            current_body: r#"{ "cod": 401, "message": "Invalid API key" }"#.to_owned(),
            forecast_body: forecast_body_with_next_four_middays(),
        };

        let err = fetch_forecast(&stub, ankara()).await.unwrap_err();
        assert_eq!(err, FetchError::ProviderRejected("Invalid API key".to_owned()));
    }

    #[tokio::test]
    async fn malformed_forecast_fails_the_whole_operation() {
        let stub = StubApi {
            current_body: r#"{
                "cod": 200,
                "name": "Ankara",
                "main": { "temp": 21.4 },
                "weather": [{ "description": "açık", "icon": "01d" }],
                "coord": { "lat": 39.9334, "lon": 32.8597 }
            }"#
            .to_owned(),
            forecast_body: r#"{ "cod": "200" }"#.to_owned(),
        };

        let err = fetch_forecast(&stub, ankara()).await.unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }
}
