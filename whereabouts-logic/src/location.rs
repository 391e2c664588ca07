use serde::{Deserialize, Serialize};

/// A "part" of a coordinate
pub type CoordinateComponent = f64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, specta::Type)]
/// Some position in the world as gotten from a Geolocation API
pub struct Coordinate {
    /// Latitude
    pub lat: CoordinateComponent,
    /// Longitude
    pub long: CoordinateComponent,
}

impl Coordinate {
    pub fn new(lat: CoordinateComponent, long: CoordinateComponent) -> Self {
        Self { lat, long }
    }

    /// Whether this reading is a physically possible position.
    /// Platforms occasionally report garbage, anything failing this is dropped
    /// before it reaches the store.
    pub fn in_bounds(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.long)
    }
}

pub trait LocationService: Send + Sync {
    /// Get a single best-effort fix from the platform, `None` when it has
    /// nothing to report (no provider, GPS off). The feed is polled
    /// continuously so a miss is not an error.
    fn get_loc(&self) -> Option<Coordinate>;
}
