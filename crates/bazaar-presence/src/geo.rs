//! Great-circle distance helpers.

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Meters per degree of latitude, close enough for small offsets.
pub(crate) const METERS_PER_DEGREE: f64 = 111_320.0;

/// Haversine distance in meters between two coordinates given in degrees.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Shift a coordinate by a local east/north offset in meters.
pub(crate) fn offset(lat: f64, lon: f64, east_m: f64, north_m: f64) -> (f64, f64) {
    let d_lat = north_m / METERS_PER_DEGREE;
    let cos_lat = lat.to_radians().cos().abs().max(1e-6);
    let d_lon = east_m / (METERS_PER_DEGREE * cos_lat);
    let new_lat = (lat + d_lat).clamp(-90.0, 90.0);
    let mut new_lon = lon + d_lon;
    if new_lon > 180.0 {
        new_lon -= 360.0;
    } else if new_lon < -180.0 {
        new_lon += 360.0;
    }
    (new_lat, new_lon)
}
