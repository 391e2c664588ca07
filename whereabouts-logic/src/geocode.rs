use crate::location::Coordinate;

/// Shown in place of an address when the geocoder has no match for a fix
pub const ADDRESS_NOT_FOUND: &str = "Address not found!";

/// Reverse-geocoding collaborator, turns a fix into a human-readable address.
/// Implementations may block on network I/O, so this is only awaited on
/// demand (see [crate::Tracker::resolve_address]), never on the update path.
pub trait Geocoder: Send + Sync {
    /// Resolve a coordinate to its first matching address line, or
    /// [ADDRESS_NOT_FOUND] when there is no match. Never empty.
    fn reverse(&self, coordinate: Coordinate) -> impl Future<Output = String> + Send;
}
