//! Coordinates and the great-circle distance estimator.
//!
//! Distances use the haversine formula on a sphere of radius [`EARTH_RADIUS_KM`]. The
//! estimator is pure; callers decide which origin to measure from.

use crate::constants::{DEFAULT_ORIGIN_LATITUDE, DEFAULT_ORIGIN_LONGITUDE, EARTH_RADIUS_KM};
use crate::{PortalError, PortalResult};
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a validated coordinate.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::InvalidCoordinate` if either value is not finite, the latitude is
    /// outside `[-90, 90]` or the longitude is outside `[-180, 180]`.
    pub fn new(latitude: f64, longitude: f64) -> PortalResult<Self> {
        let coordinate = Self {
            latitude,
            longitude,
        };
        coordinate.validate().map_err(PortalError::InvalidCoordinate)?;
        Ok(coordinate)
    }

    /// The fallback origin used when no location is known (Nairobi).
    pub const fn default_origin() -> Self {
        Self {
            latitude: DEFAULT_ORIGIN_LATITUDE,
            longitude: DEFAULT_ORIGIN_LONGITUDE,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(format!(
                "({}, {}) is not a finite coordinate",
                self.latitude, self.longitude
            ));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!("latitude {} is outside [-90, 90]", self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(format!("longitude {} is outside [-180, 180]", self.longitude));
        }
        Ok(())
    }
}

impl std::str::FromStr for Coordinate {
    type Err = PortalError;

    /// Parses `"lat,lon"`, for example `"-1.2921,36.8219"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| PortalError::InvalidCoordinate(format!("expected LAT,LON: {s}")))?;
        let latitude = lat
            .trim()
            .parse::<f64>()
            .map_err(|e| PortalError::InvalidCoordinate(format!("latitude {lat:?}: {e}")))?;
        let longitude = lon
            .trim()
            .parse::<f64>()
            .map_err(|e| PortalError::InvalidCoordinate(format!("longitude {lon:?}: {e}")))?;
        Self::new(latitude, longitude)
    }
}

/// Great-circle distance between two coordinates in kilometres.
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();
    let a = (d_lat / 2.0).sin() * (d_lat / 2.0).sin()
        + from.latitude.to_radians().cos()
            * to.latitude.to_radians().cos()
            * (d_lon / 2.0).sin()
            * (d_lon / 2.0).sin();
    // Rounding can push `a` just past 1 near antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Formats a distance with one decimal place and a `km` suffix, e.g. `"12.3 km"`.
pub fn format_km(km: f64) -> String {
    format!("{km:.1} km")
}

/// Distance label shown on a clinic card.
///
/// Returns `None` when either coordinate is not finite; there is no meaningful distance to
/// show in that case.
pub fn distance_label(from: Coordinate, to: Coordinate) -> Option<String> {
    let km = haversine_km(from, to);
    km.is_finite().then(|| format_km(km))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate {
            latitude,
            longitude,
        }
    }

    #[test]
    fn test_antipodal_points_are_half_the_circumference() {
        let south = coord(-87.5, -180.0);
        let north = coord(87.5, 0.0);
        assert!(haversine_km(south, north).is_finite());
        assert_eq!(distance_label(south, north).as_deref(), Some("20015.1 km"));
        assert_eq!(
            distance_label(coord(0.0, 0.0), coord(0.0, 180.0)).as_deref(),
            Some("20015.1 km")
        );
    }

    #[test]
    fn test_identical_points_are_zero_km() {
        let nairobi = coord(-1.2921, 36.8219);
        assert_eq!(distance_label(nairobi, nairobi).as_deref(), Some("0.0 km"));

        for point in [coord(0.0, 0.0), coord(89.9, -179.9), coord(-45.5, 120.25)] {
            assert_eq!(distance_label(point, point).as_deref(), Some("0.0 km"));
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let pairs = [
            (coord(-1.2921, 36.8219), coord(-4.0435, 39.6682)),
            (coord(51.5074, -0.1278), coord(40.7128, -74.0060)),
            (coord(-33.8688, 151.2093), coord(35.6762, 139.6503)),
        ];
        for (a, b) in pairs {
            assert_eq!(haversine_km(a, b), haversine_km(b, a));
            assert_eq!(distance_label(a, b), distance_label(b, a));
        }
    }

    #[test]
    fn test_known_distance_nairobi_to_mombasa() {
        let km = haversine_km(coord(-1.2921, 36.8219), coord(-4.0435, 39.6682));
        assert!((km - 440.0).abs() < 5.0, "unexpected distance {km}");
    }

    #[test]
    fn test_non_finite_input_has_no_label() {
        assert_eq!(distance_label(coord(f64::NAN, 0.0), coord(0.0, 0.0)), None);
    }

    #[test]
    fn test_parse_coordinate() {
        let parsed: Coordinate = " -1.2921, 36.8219 ".parse().expect("should parse");
        assert_eq!(parsed, Coordinate::default_origin());

        assert!("91,0".parse::<Coordinate>().is_err());
        assert!("0,181".parse::<Coordinate>().is_err());
        assert!("nairobi".parse::<Coordinate>().is_err());
    }
}
