mod geocode;
mod location;
mod permissions;
mod store;
mod tracker;

pub use geocode::{ADDRESS_NOT_FOUND, Geocoder};
pub use location::{Coordinate, LocationService};
pub use permissions::{
    PermissionGate, PermissionOutcome, PermissionSnapshot, denial_message, ensure_location_access,
};
pub use store::LocationStore;
pub use tracker::{DisplayState, StateUpdateSender, Tracker, UPDATE_INTERVAL, UtcDT};

pub mod prelude {
    use anyhow::Error as AnyhowError;
    use std::result::Result as StdResult;
    pub type Result<T = (), E = AnyhowError> = StdResult<T, E>;
    pub use anyhow::Context;
}
