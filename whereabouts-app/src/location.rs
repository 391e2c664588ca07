use log::warn;
use tauri::AppHandle;
use tauri_plugin_geolocation::{GeolocationExt, PositionOptions};

use whereabouts_logic::{Coordinate, LocationService};

/// [LocationService] backed by the platform's fused provider via the
/// geolocation plugin
pub struct TauriLocation(AppHandle);

impl TauriLocation {
    pub fn new(app: AppHandle) -> Self {
        Self(app)
    }
}

const OPTIONS: PositionOptions = PositionOptions {
    enable_high_accuracy: true,
    timeout: 10000, // Unused in our case, set to default
    maximum_age: 2000,
};

impl LocationService for TauriLocation {
    fn get_loc(&self) -> Option<Coordinate> {
        match self.0.geolocation().get_current_position(Some(OPTIONS)) {
            Ok(position) => Some(Coordinate::new(
                position.coords.latitude,
                position.coords.longitude,
            )),
            Err(why) => {
                // Best-effort feed, the next poll may succeed
                warn!("Failed to get a fix: {why:?}");
                None
            }
        }
    }
}
