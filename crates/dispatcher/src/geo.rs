//! Great-circle distance and travel-time estimates.
//!
//! - Latitude: degrees north (-90 to 90)
//! - Longitude: degrees east (-180 to 180)
//! - Distance: kilometres
//! - Time: minutes

use fleet_domain::Coordinates;

/// Mean earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Assumed urban driving speed used for every ETA.
pub const AVERAGE_SPEED_KMH: f64 = 40.0;

/// Haversine distance between two positions, in kilometres.
///
/// ```
/// use fleet_dispatcher::geo::distance_km;
/// use fleet_domain::Coordinates;
///
/// let a = Coordinates::new(0.0, 0.0).unwrap();
/// let b = Coordinates::new(1.0, 0.0).unwrap();
/// assert!((distance_km(a, b) - 111.19).abs() < 0.01);
/// ```
pub fn distance_km(from: Coordinates, to: Coordinates) -> f64 {
    let (lat1, lon1) = from.as_tuple();
    let (lat2, lon2) = to.as_tuple();

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Clamp guards against rounding pushing `a` just above 1 for antipodes.
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// Minutes needed to cover `distance_km` at [`AVERAGE_SPEED_KMH`].
pub fn eta_minutes(distance_km: f64) -> f64 {
    distance_km / AVERAGE_SPEED_KMH * 60.0
}

/// Distance and ETA between two optional positions; `None` when either is unknown.
pub fn route_between(from: Option<Coordinates>, to: Option<Coordinates>) -> Option<(f64, f64)> {
    let (from, to) = (from?, to?);
    let distance = distance_km(from, to);
    Some((distance, eta_minutes(distance)))
}
