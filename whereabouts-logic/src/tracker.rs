use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::{
    geocode::Geocoder,
    location::{Coordinate, LocationService},
    store::LocationStore,
};

/// Convenience alias for UTC DT
pub type UtcDT = DateTime<Utc>;

pub trait StateUpdateSender: Send + Sync {
    fn send_update(&self);
}

/// How often to pull a fresh fix from the platform while tracking
pub const UPDATE_INTERVAL: Duration = Duration::from_millis(1000);

struct TrackerState<S: StateUpdateSender> {
    store: LocationStore<S>,
    /// Last resolved address, keyed by the fix it was resolved for so a new
    /// fix invalidates it
    address: Option<(Coordinate, String)>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, specta::Type)]
/// Snapshot of everything the screen needs to render
pub struct DisplayState {
    /// Latest accepted fix, `None` before the first one arrives
    pub coordinate: Option<Coordinate>,
    /// Address for `coordinate` if it has been resolved already
    pub address: Option<String>,
    /// When the latest fix was accepted
    pub last_updated: Option<UtcDT>,
}

impl DisplayState {
    /// Derive the text shown on screen
    pub fn render(&self) -> String {
        match (self.coordinate, &self.address) {
            (Some(c), Some(address)) => format!("Address: {}, {}\n{address}", c.lat, c.long),
            (Some(c), None) => format!("Address: {}, {}", c.lat, c.long),
            (None, _) => "Location not available!".to_string(),
        }
    }
}

/// Struct representing an active location subscription. Pulls fixes with
/// [LocationService], pushes them into a [LocationStore], and resolves
/// addresses with [Geocoder] on demand.
///
/// This is a scoped resource: the loop runs until [Tracker::stop] is called,
/// the consuming UI is expected to stop it when it goes away.
pub struct Tracker<L: LocationService, G: Geocoder, S: StateUpdateSender> {
    state: RwLock<TrackerState<S>>,
    location: L,
    geocoder: G,
    interval: Duration,
    cancel: CancellationToken,
}

impl<L: LocationService, G: Geocoder, S: StateUpdateSender> Tracker<L, G, S> {
    pub fn new(interval: Duration, location: L, geocoder: G, sender: S) -> Self {
        Self::with_initial(interval, location, geocoder, sender, None)
    }

    /// Like [Tracker::new] but seeds the store with a persisted fix so the
    /// screen isn't empty before the first live one arrives
    pub fn with_initial(
        interval: Duration,
        location: L,
        geocoder: G,
        sender: S,
        initial: Option<Coordinate>,
    ) -> Self {
        let mut store = LocationStore::new(sender);
        if let Some(fix) = initial {
            store.preload(fix);
        }

        Self {
            state: RwLock::new(TrackerState {
                store,
                address: None,
            }),
            location,
            geocoder,
            interval,
            cancel: CancellationToken::new(),
        }
    }

    /// Pull one fix and store it if the platform has one. A miss is silent,
    /// the screen just keeps whatever it had.
    async fn tick(&self) {
        let Some(fix) = self.location.get_loc() else {
            return;
        };

        let mut state = self.state.write().await;
        if state.store.update(fix) && state.address.as_ref().is_some_and(|(key, _)| *key != fix) {
            // Moved since the last lookup, the cached address is stale
            state.address = None;
        }
    }

    /// Main loop, pulls a fix every interval until [Tracker::stop] is called.
    ///
    /// Callers must have verified permission via
    /// [crate::ensure_location_access] before spawning this, the platform is
    /// never relied on to enforce it.
    pub async fn main_loop(&self) {
        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    break;
                }

                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    /// Cancel the subscription, a running [Tracker::main_loop] exits
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn ui_state(&self) -> DisplayState {
        let state = self.state.read().await;
        let coordinate = state.store.current();

        DisplayState {
            coordinate,
            address: state
                .address
                .as_ref()
                .and_then(|(key, address)| (Some(*key) == coordinate).then(|| address.clone())),
            last_updated: state.store.last_updated(),
        }
    }

    /// Resolve the address for the current fix, reusing the cached result
    /// while the fix hasn't moved. Returns `None` before the first fix.
    ///
    /// The geocoder may block on I/O so no lock is held across it.
    pub async fn resolve_address(&self) -> Option<String> {
        let (coordinate, cached) = {
            let state = self.state.read().await;
            let coordinate = state.store.current()?;
            let cached = state
                .address
                .as_ref()
                .and_then(|(key, address)| (*key == coordinate).then(|| address.clone()));
            (coordinate, cached)
        };

        if let Some(address) = cached {
            return Some(address);
        }

        let address = self.geocoder.reverse(coordinate).await;

        let mut state = self.state.write().await;
        // Only cache (and notify) if the fix didn't move mid-lookup
        if state.store.current() == Some(coordinate) {
            state.address = Some((coordinate, address.clone()));
            state.store.notify();
        }

        Some(address)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        ADDRESS_NOT_FOUND, PermissionOutcome, ensure_location_access,
        tests::{CountingSender, MockGate, MockGeocoder, MockLocation},
    };
    use tokio::{task::yield_now, test};

    type TestTracker = Tracker<MockLocation, MockGeocoder, CountingSender>;

    struct Harness {
        tracker: Arc<TestTracker>,
        location: MockLocation,
        geocoder: MockGeocoder,
        sender: CountingSender,
    }

    impl Harness {
        fn new(fixes: impl IntoIterator<Item = Coordinate>) -> Self {
            tokio::time::pause();
            let location = MockLocation::new(fixes);
            let geocoder = MockGeocoder::new();
            let sender = CountingSender::new();
            let tracker = Arc::new(TestTracker::new(
                UPDATE_INTERVAL,
                location.clone(),
                geocoder.clone(),
                sender.clone(),
            ));

            Self {
                tracker,
                location,
                geocoder,
                sender,
            }
        }

        /// Spawn the loop and let its first (immediate) tick run
        async fn start(&self) {
            let tracker = self.tracker.clone();
            tokio::spawn(async move {
                tracker.main_loop().await;
            });
            // Under paused time the interval's first tick only fires once the
            // runtime parks, so yielding alone never delivers it
            tokio::time::sleep(Duration::ZERO).await;
            yield_now().await;
        }

        /// Advance past one interval and let the loop run
        async fn tick(&self) {
            tokio::time::sleep(UPDATE_INTERVAL + Duration::from_millis(100)).await;
            yield_now().await;
            yield_now().await;
        }
    }

    #[test]
    async fn test_fix_flows_to_store() {
        let fix = Coordinate::new(37.4219, -122.0841);
        let harness = Harness::new([fix]);

        harness.start().await;

        let state = harness.tracker.ui_state().await;
        assert_eq!(state.coordinate, Some(fix));
        assert!(state.last_updated.is_some());
        assert_eq!(harness.sender.count(), 1);

        let rendered = state.render();
        assert!(rendered.contains("37.4219"), "Missing lat: {rendered}");
        assert!(rendered.contains("-122.0841"), "Missing long: {rendered}");
    }

    #[test]
    async fn test_last_write_wins() {
        let first = Coordinate::new(1.0, 2.0);
        let second = Coordinate::new(3.0, 4.0);
        let harness = Harness::new([first, second]);

        harness.start().await;
        harness.tick().await;

        assert_eq!(harness.tracker.ui_state().await.coordinate, Some(second));
        assert_eq!(harness.sender.count(), 2);
    }

    #[test]
    async fn test_out_of_range_fix_rejected() {
        let harness = Harness::new([Coordinate::new(91.0, 0.0)]);

        harness.start().await;

        let state = harness.tracker.ui_state().await;
        assert_eq!(state.coordinate, None);
        assert_eq!(harness.sender.count(), 0);
        assert_eq!(state.render(), "Location not available!");
    }

    #[test]
    async fn test_no_fix_is_silent() {
        let harness = Harness::new([]);

        harness.start().await;
        harness.tick().await;

        assert_eq!(harness.tracker.ui_state().await.coordinate, None);
        assert_eq!(harness.sender.count(), 0);
        // The loop kept polling despite the misses
        assert!(harness.location.calls() >= 2);
    }

    #[test]
    async fn test_stop_cancels_subscription() {
        let fix = Coordinate::new(5.0, 5.0);
        let harness = Harness::new([fix, fix, fix]);

        harness.start().await;
        harness.tracker.stop();
        harness.tick().await;
        harness.tick().await;

        assert!(harness.tracker.is_stopped());
        // Only the pre-stop tick consumed a fix
        assert_eq!(harness.location.calls(), 1);
    }

    #[test]
    async fn test_address_cached_per_fix() {
        let fix = Coordinate::new(48.8584, 2.2945);
        let harness = Harness::new([fix]);
        harness.geocoder.insert(fix, "5 Avenue Anatole France");

        harness.start().await;

        let first = harness.tracker.resolve_address().await;
        let second = harness.tracker.resolve_address().await;
        assert_eq!(first.as_deref(), Some("5 Avenue Anatole France"));
        assert_eq!(second.as_deref(), Some("5 Avenue Anatole France"));
        assert_eq!(harness.geocoder.calls(), 1);

        // Resolving notifies observers so the screen re-reads state
        assert_eq!(harness.sender.count(), 2);
        assert_eq!(
            harness.tracker.ui_state().await.address.as_deref(),
            Some("5 Avenue Anatole France")
        );
    }

    #[test]
    async fn test_new_fix_invalidates_address() {
        let first = Coordinate::new(48.8584, 2.2945);
        let second = Coordinate::new(51.5007, -0.1246);
        let harness = Harness::new([first, second]);
        harness.geocoder.insert(first, "5 Avenue Anatole France");
        harness.geocoder.insert(second, "Westminster, London");

        harness.start().await;
        harness.tracker.resolve_address().await;

        harness.tick().await;
        assert_eq!(harness.tracker.ui_state().await.address, None);

        let resolved = harness.tracker.resolve_address().await;
        assert_eq!(resolved.as_deref(), Some("Westminster, London"));
        assert_eq!(harness.geocoder.calls(), 2);
    }

    #[test]
    async fn test_geocode_miss_falls_back_to_sentinel() {
        let fix = Coordinate::new(0.0, 0.0);
        let harness = Harness::new([fix]);

        harness.start().await;

        let resolved = harness.tracker.resolve_address().await;
        assert_eq!(resolved.as_deref(), Some(ADDRESS_NOT_FOUND));
        assert!(!resolved.unwrap().is_empty());
    }

    #[test]
    async fn test_resolve_before_first_fix() {
        let harness = Harness::new([]);

        harness.start().await;

        assert_eq!(harness.tracker.resolve_address().await, None);
        assert_eq!(harness.geocoder.calls(), 0);
    }

    #[test]
    async fn test_preloaded_fix_shows_without_notify() {
        tokio::time::pause();
        let persisted = Coordinate::new(12.0, 34.0);
        let sender = CountingSender::new();
        let tracker = TestTracker::with_initial(
            UPDATE_INTERVAL,
            MockLocation::new([]),
            MockGeocoder::new(),
            sender.clone(),
            Some(persisted),
        );

        let state = tracker.ui_state().await;
        assert_eq!(state.coordinate, Some(persisted));
        assert_eq!(sender.count(), 0);
    }

    #[test]
    async fn test_end_to_end_after_grant() {
        let fix = Coordinate::new(37.4219, -122.0841);
        let harness = Harness::new([fix]);
        harness.geocoder.insert(fix, "1600 Amphitheatre Parkway");

        // The button flow: permission first, only then start updates
        let gate = MockGate::grant_on_request();
        assert_eq!(ensure_location_access(&gate), PermissionOutcome::Granted);

        harness.start().await;
        let address = harness.tracker.resolve_address().await;

        let state = harness.tracker.ui_state().await;
        assert_eq!(state.coordinate, Some(fix));
        assert_eq!(address.as_deref(), Some("1600 Amphitheatre Parkway"));

        let rendered = state.render();
        assert!(rendered.contains("37.4219"));
        assert!(rendered.contains("-122.0841"));
        assert!(rendered.contains("1600 Amphitheatre Parkway"));
    }
}
