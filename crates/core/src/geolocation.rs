//! One-shot device location with a fixed fallback.

use crate::geo::Coordinate;

#[derive(Debug, thiserror::Error)]
pub enum GeolocationError {
    #[error("location access denied")]
    Denied,
    #[error("location unavailable: {0}")]
    Unavailable(String),
}

/// A source of the device's current position.
///
/// Queried once per view; there is no live tracking and no retry.
pub trait Geolocator: Send + Sync {
    fn current_position(&self) -> Result<Coordinate, GeolocationError>;
}

/// A geolocator answering with a position known up front, or failing when it has none.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation(pub Option<Coordinate>);

impl Geolocator for FixedLocation {
    fn current_position(&self) -> Result<Coordinate, GeolocationError> {
        self.0
            .ok_or_else(|| GeolocationError::Unavailable("no position configured".into()))
    }
}

/// Asks the geolocator once and falls back to [`Coordinate::default_origin`] on any error.
pub fn locate_or_default(locator: &dyn Geolocator) -> Coordinate {
    match locator.current_position() {
        Ok(position) => position,
        Err(e) => {
            tracing::warn!("{e}, using default location");
            Coordinate::default_origin()
        }
    }
}

/// Picks the origin for distance badges: an explicit override wins, then the detected
/// location, then the fallback.
pub fn resolve_origin(origin_override: Option<Coordinate>, locator: &dyn Geolocator) -> Coordinate {
    origin_override.unwrap_or_else(|| locate_or_default(locator))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DeniedLocation;

    impl Geolocator for DeniedLocation {
        fn current_position(&self) -> Result<Coordinate, GeolocationError> {
            Err(GeolocationError::Denied)
        }
    }

    #[test]
    fn test_denied_location_falls_back_to_nairobi() {
        assert_eq!(locate_or_default(&DeniedLocation), Coordinate::default_origin());
    }

    #[test]
    fn test_detected_location_is_used_without_override() {
        let eldoret = Coordinate::new(0.5143, 35.2698).unwrap();
        assert_eq!(resolve_origin(None, &FixedLocation(Some(eldoret))), eldoret);
    }

    #[test]
    fn test_override_wins_over_detection() {
        let eldoret = Coordinate::new(0.5143, 35.2698).unwrap();
        let kisumu = Coordinate::new(-0.0917, 34.7680).unwrap();
        assert_eq!(
            resolve_origin(Some(kisumu), &FixedLocation(Some(eldoret))),
            kisumu
        );
        assert_eq!(
            resolve_origin(None, &FixedLocation(None)),
            Coordinate::default_origin()
        );
    }
}
