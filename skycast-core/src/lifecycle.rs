//! Request lifecycle: one fetch at a time, debounced loading feedback,
//! stale-response protection, and an idempotent trigger guard for
//! navigation-style coordinate events.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{
    aggregator,
    error::FetchError,
    model::{Coordinate, CoordinateEvent, CurrentWeather, DailySampleSeries, FetchState},
    provider::WeatherApi,
};

/// How long a fetch must stay pending before the loading indicator
/// becomes visible. Operations settling earlier never flash it.
pub const SPINNER_DELAY: Duration = Duration::from_millis(300);

/// Device-side source of the user's position.
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Ask the platform for the location permission.
    async fn request_permission(&self) -> bool;

    /// Read the device's current position. Only called after permission
    /// was granted; `None` means the read failed.
    async fn current_coordinate(&self) -> Option<Coordinate>;
}

struct Inner {
    state: FetchState,
    spinner: bool,
    /// Sequence number of the latest issued fetch. A result may commit
    /// only while its own number is still the latest.
    seq: u64,
    /// The last map event that triggered a fetch. Re-observing the same
    /// event must not trigger again.
    consumed_event: Option<CoordinateEvent>,
    debounce: Option<JoinHandle<()>>,
}

/// Owns the [`FetchState`] for one weather view and sequences fetches
/// against it.
///
/// Clones share the same state, so the controller can be handed to the
/// presentation layer and to event handlers at the same time.
pub struct FetchController<P> {
    provider: Arc<P>,
    inner: Arc<Mutex<Inner>>,
}

impl<P> Clone for FetchController<P> {
    fn clone(&self) -> Self {
        Self { provider: Arc::clone(&self.provider), inner: Arc::clone(&self.inner) }
    }
}

impl<P: WeatherApi> FetchController<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
            inner: Arc::new(Mutex::new(Inner {
                state: FetchState::Idle,
                spinner: false,
                seq: 0,
                consumed_event: None,
                debounce: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Latest state snapshot for the presentation layer.
    pub fn state(&self) -> FetchState {
        self.lock().state.clone()
    }

    /// Whether the debounced loading indicator should be shown.
    pub fn spinner_visible(&self) -> bool {
        self.lock().spinner
    }

    /// Start a fetch for `coordinate`, superseding any in-flight one.
    ///
    /// Drives the operation to settlement: on return the state reflects
    /// this fetch's outcome unless a newer request took over while it was
    /// in flight, in which case the result was discarded.
    pub async fn request_fetch(&self, coordinate: Coordinate) {
        let my_seq = self.begin(coordinate);
        let result = aggregator::fetch_forecast(self.provider.as_ref(), coordinate).await;
        self.settle(my_seq, result);
    }

    /// Consume a map-picker event, firing at most one fetch per distinct
    /// event no matter how often the hosting view re-evaluates.
    ///
    /// Malformed strings leave the guard untouched and trigger nothing.
    pub async fn handle_map_event(&self, event: &CoordinateEvent) {
        let Some(coordinate) = event.coordinate() else {
            warn!(lat = %event.lat, lon = %event.lon, "ignoring malformed coordinate event");
            return;
        };

        {
            let mut inner = self.lock();
            if inner.consumed_event.as_ref() == Some(event) {
                return;
            }
            inner.consumed_event = Some(event.clone());
        }

        self.request_fetch(coordinate).await;
    }

    /// Fetch for the device's own position.
    ///
    /// A refused permission or a failed position read settles the state
    /// without the provider ever being contacted.
    pub async fn request_current_location<L: LocationSource + ?Sized>(&self, source: &L) {
        if !source.request_permission().await {
            self.fail_without_fetch(FetchError::PermissionDenied);
            return;
        }

        match source.current_coordinate().await {
            Some(coordinate) => self.request_fetch(coordinate).await,
            None => self.fail_without_fetch(FetchError::LocationUnavailable),
        }
    }

    /// View-unmount semantics: cancel the debounce timer and reset the
    /// one-shot guard so a recreated view may consume the same event
    /// again.
    pub fn teardown(&self) {
        let mut inner = self.lock();
        if let Some(handle) = inner.debounce.take() {
            handle.abort();
        }
        inner.spinner = false;
        inner.consumed_event = None;
    }

    /// Enter `Pending`: clear the previous result, restart the spinner
    /// debounce, and claim the next sequence number.
    fn begin(&self, coordinate: Coordinate) -> u64 {
        let mut inner = self.lock();
        inner.seq += 1;
        let my_seq = inner.seq;
        inner.state = FetchState::Pending;
        inner.spinner = false;

        if let Some(handle) = inner.debounce.take() {
            handle.abort();
        }
        let shared = Arc::clone(&self.inner);
        inner.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(SPINNER_DELAY).await;
            let mut inner = shared.lock().unwrap_or_else(PoisonError::into_inner);
            if inner.seq == my_seq && inner.state.is_pending() {
                inner.spinner = true;
            }
        }));

        debug!(seq = my_seq, %coordinate, "fetch started");
        my_seq
    }

    /// Commit a settled result, unless a newer fetch superseded it.
    fn settle(
        &self,
        my_seq: u64,
        result: Result<(CurrentWeather, DailySampleSeries), FetchError>,
    ) {
        let mut inner = self.lock();
        if inner.seq != my_seq {
            debug!(seq = my_seq, latest = inner.seq, "discarding stale fetch result");
            return;
        }

        if let Some(handle) = inner.debounce.take() {
            handle.abort();
        }
        inner.spinner = false;
        inner.state = match result {
            Ok((current, series)) => FetchState::Succeeded(current, series),
            Err(err) => {
                warn!(seq = my_seq, error = %err, "fetch failed");
                FetchState::Failed(err)
            }
        };
    }

    /// Settle into `Failed` for errors raised before any fetch started
    /// (permission and position-read failures).
    fn fail_without_fetch(&self, err: FetchError) {
        let mut inner = self.lock();
        inner.seq += 1;
        if let Some(handle) = inner.debounce.take() {
            handle.abort();
        }
        inner.spinner = false;
        warn!(error = %err, "location request failed");
        inner.state = FetchState::Failed(err);
    }
}
