use rollcall_canonical::ValidationError;
use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A WGS84 latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, `[-90, 90]`.
    pub lat: f64,
    /// Longitude in degrees, `[-180, 180]`.
    pub lng: f64,
}

impl Coordinate {
    /// Builds a coordinate after checking that both components are finite and in range.
    pub fn new(lat: f64, lng: f64) -> Result<Self, ValidationError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::OutOfBounds {
                field: "lat",
                value: lat.to_string(),
            });
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(ValidationError::OutOfBounds {
                field: "lng",
                value: lng.to_string(),
            });
        }
        Ok(Self { lat, lng })
    }
}

/// Great-circle distance between two coordinates in meters (haversine).
///
/// Inputs are assumed to be range-checked; see [`Coordinate::new`].
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).abs().to_radians();
    let d_lambda = (b.lng - a.lng).abs().to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // rounding can push h marginally outside [0, 1] for antipodal points
    let h = h.clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().atan2((1.0 - h).sqrt())
}
