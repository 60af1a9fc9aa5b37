use super::RemoteRow;
use crate::gateway::Collection;
use crate::geo::Coordinate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A clinic row. Maintained out-of-band; the portal only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicRecord {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub services: Option<Vec<String>>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub google_place_id: Option<String>,
    #[serde(default)]
    pub operating_hours: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClinicRecord {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// Service tags, empty when the row has none.
    pub fn services(&self) -> &[String] {
        self.services.as_deref().unwrap_or_default()
    }

    /// Rating as shown on a card, `"N/A"` when unrated.
    pub fn rating_label(&self) -> String {
        match self.rating {
            Some(rating) if rating != 0.0 => rating.to_string(),
            _ => "N/A".into(),
        }
    }
}

impl RemoteRow for ClinicRecord {
    const COLLECTION: Collection = Collection::Clinics;

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err(format!("clinic {} has no name", self.id));
        }
        self.coordinate()
            .validate()
            .map_err(|reason| format!("clinic {}: {reason}", self.id))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub(crate) fn clinic(name: &str, address: &str, services: &[&str], rating: Option<f64>) -> ClinicRecord {
        let now = Utc::now();
        ClinicRecord {
            id: Uuid::new_v4(),
            name: name.into(),
            address: address.into(),
            latitude: -1.2864,
            longitude: 36.8172,
            phone: Some("+254 700 000 000".into()),
            email: None,
            website: None,
            services: Some(services.iter().map(|s| s.to_string()).collect()),
            rating,
            google_place_id: None,
            operating_hours: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::clinic;
    use super::*;

    #[test]
    fn test_validate_rejects_out_of_range_coordinates() {
        let mut row = clinic("Aga Khan", "3rd Parklands Ave, Nairobi", &[], Some(4.5));
        assert!(row.validate().is_ok());

        row.latitude = 95.0;
        assert!(row.validate().is_err(), "latitude above 90 should be rejected");

        row.latitude = 0.0;
        row.longitude = -200.0;
        assert!(row.validate().is_err(), "longitude below -180 should be rejected");
    }

    #[test]
    fn test_decode_accepts_null_optionals() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "name": "Kenyatta National Hospital",
            "address": "Hospital Rd, Nairobi",
            "latitude": -1.3006,
            "longitude": 36.8066,
            "phone": null,
            "services": null,
            "rating": null,
            "operating_hours": {"mon": "08:00-17:00"},
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        });
        let row: ClinicRecord = serde_json::from_value(json).expect("should decode");
        assert!(row.services().is_empty());
        assert_eq!(row.rating_label(), "N/A");
        assert!(row.operating_hours.is_some());
    }
}
