//! Data handed to the map SDK.
//!
//! The map itself (tiles, projection, pan/zoom, click handling) is the SDK's business. This
//! module only builds what the SDK is given: access settings, a centre, markers with popups,
//! and the bounds for the "fit all markers" camera move.

use crate::constants::{FIT_BOUNDS_PADDING, POPUP_SERVICE_LIMIT};
use crate::geo::Coordinate;
use crate::models::ClinicRecord;
use serde::Serialize;
use uuid::Uuid;

/// Map SDK settings. The access token is embedded in clients and is not a secret.
#[derive(Clone, Debug, PartialEq)]
pub struct MapConfig {
    pub access_token: String,
    pub style: String,
    pub zoom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    User,
    Clinic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerPopup {
    pub title: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub rating: Option<f64>,
    pub services: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub kind: MarkerKind,
    pub position: Coordinate,
    /// Set for clinic markers; passed back through the selection callback.
    pub clinic_id: Option<Uuid>,
    pub popup: MarkerPopup,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub south_west: Coordinate,
    pub north_east: Coordinate,
}

impl Bounds {
    /// Smallest box containing every point, or `None` for no points.
    pub fn around(points: impl IntoIterator<Item = Coordinate>) -> Option<Self> {
        points.into_iter().fold(None, |bounds, p| {
            Some(match bounds {
                None => Bounds {
                    south_west: p,
                    north_east: p,
                },
                Some(Bounds {
                    south_west,
                    north_east,
                }) => Bounds {
                    south_west: Coordinate {
                        latitude: south_west.latitude.min(p.latitude),
                        longitude: south_west.longitude.min(p.longitude),
                    },
                    north_east: Coordinate {
                        latitude: north_east.latitude.max(p.latitude),
                        longitude: north_east.longitude.max(p.longitude),
                    },
                },
            })
        })
    }
}

/// Camera move for "show all clinics".
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraFit {
    pub bounds: Bounds,
    pub padding: u32,
}

/// Everything the map SDK needs to draw the clinic locator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapScene {
    pub access_token: String,
    pub style: String,
    pub zoom: f64,
    pub center: Coordinate,
    pub markers: Vec<MapMarker>,
}

impl MapScene {
    /// Builds the scene centred on the user, with the user marker first and one marker per
    /// clinic in list order.
    pub fn new(cfg: &MapConfig, user_location: Coordinate, clinics: &[ClinicRecord]) -> Self {
        let mut markers = Vec::with_capacity(clinics.len() + 1);
        markers.push(MapMarker {
            kind: MarkerKind::User,
            position: user_location,
            clinic_id: None,
            popup: MarkerPopup {
                title: "Your Location".into(),
                address: None,
                phone: None,
                rating: None,
                services: Vec::new(),
            },
        });
        markers.extend(clinics.iter().map(|clinic| MapMarker {
            kind: MarkerKind::Clinic,
            position: clinic.coordinate(),
            clinic_id: Some(clinic.id),
            popup: MarkerPopup {
                title: clinic.name.clone(),
                address: Some(clinic.address.clone()),
                phone: clinic.phone.clone(),
                rating: clinic.rating,
                services: clinic
                    .services()
                    .iter()
                    .take(POPUP_SERVICE_LIMIT)
                    .cloned()
                    .collect(),
            },
        }));

        Self {
            access_token: cfg.access_token.clone(),
            style: cfg.style.clone(),
            zoom: cfg.zoom,
            center: user_location,
            markers,
        }
    }

    /// Bounds covering the user and every clinic. `None` when there are no clinics to show.
    pub fn fit_all(&self) -> Option<CameraFit> {
        if !self.markers.iter().any(|m| m.kind == MarkerKind::Clinic) {
            return None;
        }
        Bounds::around(self.markers.iter().map(|m| m.position)).map(|bounds| CameraFit {
            bounds,
            padding: FIT_BOUNDS_PADDING,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::clinic::fixtures::clinic;

    fn cfg() -> MapConfig {
        MapConfig {
            access_token: "pk.test".into(),
            style: "mapbox://styles/mapbox/streets-v12".into(),
            zoom: 12.0,
        }
    }

    #[test]
    fn test_scene_has_user_marker_then_clinics() {
        let mut far = clinic("Coast General", "Moi Ave, Mombasa", &["Maternity", "Surgery", "Dental"], Some(4.1));
        far.latitude = -4.0435;
        far.longitude = 39.6682;
        let clinics = vec![clinic("Nairobi West", "Langata Rd, Nairobi", &[], None), far];

        let scene = MapScene::new(&cfg(), Coordinate::default_origin(), &clinics);

        assert_eq!(scene.markers.len(), 3);
        assert_eq!(scene.markers[0].kind, MarkerKind::User);
        assert_eq!(scene.markers[2].clinic_id, Some(clinics[1].id));
        assert_eq!(scene.markers[2].popup.services, vec!["Maternity", "Surgery"]);
        assert_eq!(scene.center, Coordinate::default_origin());
    }

    #[test]
    fn test_fit_all_covers_user_and_clinics() {
        let mut far = clinic("Coast General", "Moi Ave, Mombasa", &[], None);
        far.latitude = -4.0435;
        far.longitude = 39.6682;
        let scene = MapScene::new(&cfg(), Coordinate::default_origin(), &[far]);

        let fit = scene.fit_all().expect("should fit with one clinic");
        assert_eq!(fit.padding, 50);
        assert_eq!(fit.bounds.south_west.latitude, -4.0435);
        assert_eq!(fit.bounds.north_east.latitude, -1.2921);
        assert_eq!(fit.bounds.south_west.longitude, 36.8219);
        assert_eq!(fit.bounds.north_east.longitude, 39.6682);
    }

    #[test]
    fn test_fit_all_without_clinics_does_nothing() {
        let scene = MapScene::new(&cfg(), Coordinate::default_origin(), &[]);
        assert_eq!(scene.fit_all(), None);
    }
}
