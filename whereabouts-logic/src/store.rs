use chrono::Utc;
use log::warn;

use crate::{
    location::Coordinate,
    tracker::{StateUpdateSender, UtcDT},
};

/// Single-slot observable holder of the latest accepted fix.
///
/// Single-writer (the tracker loop), multi-reader (the UI). No history,
/// last write wins. Every accepted write notifies the UI synchronously via
/// [StateUpdateSender].
pub struct LocationStore<S: StateUpdateSender> {
    slot: Option<Coordinate>,
    last_updated: Option<UtcDT>,
    sender: S,
}

impl<S: StateUpdateSender> LocationStore<S> {
    pub fn new(sender: S) -> Self {
        Self {
            slot: None,
            last_updated: None,
            sender,
        }
    }

    /// Seed the slot with a previously persisted fix. Does not notify and
    /// never clobbers a live fix, only meant for startup.
    pub fn preload(&mut self, coordinate: Coordinate) {
        if self.slot.is_none() && coordinate.in_bounds() {
            self.slot = Some(coordinate);
        }
    }

    /// Overwrite the slot with a new fix and notify observers. Out-of-range
    /// readings from the platform are dropped rather than stored. Returns
    /// whether the fix was accepted.
    pub fn update(&mut self, coordinate: Coordinate) -> bool {
        if !coordinate.in_bounds() {
            warn!(
                "Dropping out-of-range fix: {}, {}",
                coordinate.lat, coordinate.long
            );
            return false;
        }

        self.slot = Some(coordinate);
        self.last_updated = Some(Utc::now());
        self.sender.send_update();
        true
    }

    pub fn current(&self) -> Option<Coordinate> {
        self.slot
    }

    pub fn last_updated(&self) -> Option<UtcDT> {
        self.last_updated
    }

    /// Notify observers that derived state (e.g. a resolved address) changed
    /// without a new fix arriving
    pub fn notify(&self) {
        self.sender.send_update();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::CountingSender;

    #[test]
    fn test_starts_empty() {
        let store = LocationStore::new(CountingSender::new());
        assert_eq!(store.current(), None);
        assert_eq!(store.last_updated(), None);
    }

    #[test]
    fn test_update_round_trip() {
        let sender = CountingSender::new();
        let mut store = LocationStore::new(sender.clone());
        let fix = Coordinate::new(37.4219, -122.0841);

        assert!(store.update(fix));
        assert_eq!(store.current(), Some(fix));
        assert!(store.last_updated().is_some());
        assert_eq!(sender.count(), 1);
    }

    #[test]
    fn test_last_write_wins() {
        let sender = CountingSender::new();
        let mut store = LocationStore::new(sender.clone());
        let first = Coordinate::new(1.0, 2.0);
        let second = Coordinate::new(3.0, 4.0);

        store.update(first);
        store.update(second);

        assert_eq!(store.current(), Some(second));
        assert_eq!(sender.count(), 2);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let sender = CountingSender::new();
        let mut store = LocationStore::new(sender.clone());
        let good = Coordinate::new(45.0, 90.0);

        store.update(good);
        assert!(!store.update(Coordinate::new(120.0, 0.0)));
        assert!(!store.update(Coordinate::new(0.0, -200.0)));

        // Slot untouched, no notifications for the rejects
        assert_eq!(store.current(), Some(good));
        assert_eq!(sender.count(), 1);
    }

    #[test]
    fn test_preload_is_silent_and_yielding() {
        let sender = CountingSender::new();
        let mut store = LocationStore::new(sender.clone());
        let persisted = Coordinate::new(10.0, 10.0);

        store.preload(persisted);
        assert_eq!(store.current(), Some(persisted));
        assert_eq!(sender.count(), 0);

        // A live fix wins over a later preload
        let live = Coordinate::new(20.0, 20.0);
        store.update(live);
        store.preload(persisted);
        assert_eq!(store.current(), Some(live));
    }
}
