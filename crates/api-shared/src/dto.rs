//! Request and response bodies shared by the portal's surfaces.
//!
//! Identifiers and dates cross the wire as strings; every response that follows a load or a
//! mutation carries the notifications that load or mutation raised.

use portal_core::map::{MapMarker, MapScene, MarkerKind};
use portal_core::symptoms::{Assessment, Severity};
use portal_core::views::{ClinicCard, ClinicLocator, ListingStatus, Overview, ProfileStatus, RecordForm};
use portal_core::{HealthRecord, Notification, NotificationKind, ProfileRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// A transient, user-visible message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NotificationRes {
    pub title: String,
    pub description: String,
    /// `info`, `success` or `error`.
    pub kind: String,
}

impl From<Notification> for NotificationRes {
    fn from(n: Notification) -> Self {
        let kind = match n.kind {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
        };
        Self {
            title: n.title,
            description: n.description,
            kind: kind.into(),
        }
    }
}

pub fn notifications_res(notifications: Vec<Notification>) -> Vec<NotificationRes> {
    notifications.into_iter().map(NotificationRes::from).collect()
}

// ====================
// Clinics
// ====================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClinicCardRes {
    pub id: String,
    pub name: String,
    pub address: String,
    pub rating: String,
    pub distance: Option<String>,
    pub services: Vec<String>,
    pub more_services: Option<String>,
    pub phone: Option<String>,
    pub selected: bool,
}

impl From<ClinicCard> for ClinicCardRes {
    fn from(card: ClinicCard) -> Self {
        Self {
            id: card.id.to_string(),
            name: card.name,
            address: card.address,
            rating: card.rating,
            distance: card.distance,
            services: card.services,
            more_services: card.more_services,
            phone: card.phone,
            selected: card.selected,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MarkerRes {
    /// `user` or `clinic`.
    pub kind: String,
    pub latitude: f64,
    pub longitude: f64,
    pub clinic_id: Option<String>,
    pub title: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub rating: Option<f64>,
    pub services: Vec<String>,
}

impl From<MapMarker> for MarkerRes {
    fn from(marker: MapMarker) -> Self {
        Self {
            kind: match marker.kind {
                MarkerKind::User => "user".into(),
                MarkerKind::Clinic => "clinic".into(),
            },
            latitude: marker.position.latitude,
            longitude: marker.position.longitude,
            clinic_id: marker.clinic_id.map(|id| id.to_string()),
            title: marker.popup.title,
            address: marker.popup.address,
            phone: marker.popup.phone,
            rating: marker.popup.rating,
            services: marker.popup.services,
        }
    }
}

/// Camera bounds covering the user and every shown clinic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CameraFitRes {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
    /// Pixels of padding around the bounds.
    pub padding: u32,
}

/// Clinic locator listing: the cards, their markers and the empty-state message if any.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClinicListRes {
    /// `loading`, `no_results` or `results`.
    pub status: String,
    pub title: Option<String>,
    pub hint: Option<String>,
    pub count: usize,
    pub origin_latitude: f64,
    pub origin_longitude: f64,
    pub clinics: Vec<ClinicCardRes>,
    pub markers: Vec<MarkerRes>,
    /// Absent when no clinic is shown.
    pub fit: Option<CameraFitRes>,
    pub notifications: Vec<NotificationRes>,
}

impl ClinicListRes {
    /// Renders the locator's current subset. Drains its pending notifications.
    pub fn from_locator(locator: &mut ClinicLocator, scene: MapScene) -> Self {
        let status = locator.status();
        let (title, hint) = match status.message() {
            Some((title, hint)) => (Some(title.to_string()), Some(hint.to_string())),
            None => (None, None),
        };
        let (status, count) = match status {
            ListingStatus::Loading => ("loading", 0),
            ListingStatus::NoResults => ("no_results", 0),
            ListingStatus::Results(n) => ("results", n),
        };
        let fit = scene.fit_all().map(|fit| CameraFitRes {
            south: fit.bounds.south_west.latitude,
            west: fit.bounds.south_west.longitude,
            north: fit.bounds.north_east.latitude,
            east: fit.bounds.north_east.longitude,
            padding: fit.padding,
        });
        Self {
            status: status.into(),
            title,
            hint,
            count,
            origin_latitude: locator.origin().latitude,
            origin_longitude: locator.origin().longitude,
            clinics: locator.cards().into_iter().map(ClinicCardRes::from).collect(),
            markers: scene.markers.into_iter().map(MarkerRes::from).collect(),
            fit,
            notifications: notifications_res(locator.take_notifications()),
        }
    }
}

// ====================
// Health records
// ====================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRecordRes {
    pub id: String,
    pub record_type: String,
    pub type_label: String,
    pub title: String,
    pub description: Option<String>,
    /// `Dr. <name>` when a doctor is recorded.
    pub doctor: Option<String>,
    pub clinic_name: Option<String>,
    pub date_recorded: String,
    /// e.g. `October 10, 2026`.
    pub date_label: String,
}

impl From<&HealthRecord> for HealthRecordRes {
    fn from(record: &HealthRecord) -> Self {
        Self {
            id: record.id.to_string(),
            record_type: record.record_type.as_str().into(),
            type_label: record.record_type.label().into(),
            title: record.title.clone(),
            description: record.description.clone(),
            doctor: record.doctor_label(),
            clinic_name: record.clinic_name.clone(),
            date_recorded: record.date_recorded.to_string(),
            date_label: record.date_label(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecordListRes {
    pub records: Vec<HealthRecordRes>,
    pub notifications: Vec<NotificationRes>,
}

/// A new health record as submitted from the composer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreateRecordReq {
    pub record_type: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub clinic_name: Option<String>,
    /// `YYYY-MM-DD`; today when omitted.
    #[serde(default)]
    pub date_recorded: Option<String>,
}

impl CreateRecordReq {
    /// Copies the request into a composer buffer. An omitted date keeps the buffer's date.
    pub fn fill(self, form: &mut RecordForm) {
        form.record_type = self.record_type;
        form.title = self.title;
        form.description = self.description.unwrap_or_default();
        form.doctor_name = self.doctor_name.unwrap_or_default();
        form.clinic_name = self.clinic_name.unwrap_or_default();
        if let Some(date) = self.date_recorded {
            form.date_recorded = date;
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OverviewRes {
    pub total_records: usize,
    pub recent_records: usize,
    /// `complete` or `incomplete`.
    pub profile_status: String,
    pub latest: Vec<HealthRecordRes>,
    pub empty_message: Option<String>,
    pub notifications: Vec<NotificationRes>,
}

impl OverviewRes {
    pub fn new(overview: Overview, notifications: Vec<Notification>) -> Self {
        Self {
            total_records: overview.total_records,
            recent_records: overview.recent_records,
            profile_status: match overview.profile_status {
                ProfileStatus::Complete => "complete".into(),
                ProfileStatus::Incomplete => "incomplete".into(),
            },
            latest: overview.latest.iter().map(HealthRecordRes::from).collect(),
            empty_message: overview.empty_message.map(String::from),
            notifications: notifications_res(notifications),
        }
    }
}

// ====================
// Profile
// ====================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProfileDto {
    pub id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub complete: bool,
}

impl From<&ProfileRecord> for ProfileDto {
    fn from(profile: &ProfileRecord) -> Self {
        Self {
            id: profile.id.to_string(),
            email: profile.email.clone(),
            full_name: profile.full_name.clone(),
            phone: profile.phone.clone(),
            date_of_birth: profile.date_of_birth.map(|d| d.to_string()),
            gender: profile.gender.map(|g| g.as_str().to_string()),
            emergency_contact_name: profile.emergency_contact_name.clone(),
            emergency_contact_phone: profile.emergency_contact_phone.clone(),
            complete: profile.is_complete(),
        }
    }
}

/// The caller's profile; `profile` is absent when none is stored yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProfileRes {
    pub profile: Option<ProfileDto>,
    pub notifications: Vec<NotificationRes>,
}

/// Field edits keyed by column name (`full_name`, `phone`, `date_of_birth`, `gender`,
/// `emergency_contact_name`, `emergency_contact_phone`). Blank values clear the field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfileReq {
    pub fields: BTreeMap<String, String>,
}

// ====================
// Symptom checker
// ====================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeReq {
    pub symptoms: String,
    /// `english`, `kiswahili` or `sheng`; English when omitted.
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConditionRes {
    pub name: String,
    pub probability: u8,
    /// `low`, `medium` or `high`.
    pub severity: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AssessmentRes {
    pub conditions: Vec<ConditionRes>,
    pub recommendations: Vec<String>,
}

impl From<Assessment> for AssessmentRes {
    fn from(assessment: Assessment) -> Self {
        Self {
            conditions: assessment
                .conditions
                .into_iter()
                .map(|c| ConditionRes {
                    name: c.name,
                    probability: c.probability,
                    severity: match c.severity {
                        Severity::Low => "low".into(),
                        Severity::Medium => "medium".into(),
                        Severity::High => "high".into(),
                    },
                })
                .collect(),
            recommendations: assessment.recommendations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use portal_core::RecordType;
    use uuid::Uuid;

    #[test]
    fn test_record_res_carries_display_labels() {
        let record = HealthRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            record_type: RecordType::LabResult,
            title: "Full blood count".into(),
            description: None,
            doctor_name: Some("Wanjiru".into()),
            clinic_name: None,
            date_recorded: NaiveDate::from_ymd_opt(2026, 10, 10).unwrap(),
            created_at: Utc::now(),
        };

        let res = HealthRecordRes::from(&record);
        assert_eq!(res.record_type, "lab_result");
        assert_eq!(res.type_label, "Lab Result");
        assert_eq!(res.doctor.as_deref(), Some("Dr. Wanjiru"));
        assert_eq!(res.date_recorded, "2026-10-10");
        assert_eq!(res.date_label, "October 10, 2026");
    }

    #[test]
    fn test_create_request_keeps_form_date_when_omitted() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let mut form = RecordForm::blank(today);
        let req: CreateRecordReq =
            serde_json::from_str(r#"{"record_type":"allergy","title":"Penicillin"}"#)
                .expect("request should parse");

        req.fill(&mut form);
        assert_eq!(form.record_type, "allergy");
        assert_eq!(form.title, "Penicillin");
        assert_eq!(form.date_recorded, "2026-10-18");
        assert_eq!(form.doctor_name, "");
    }

    #[test]
    fn test_notification_kind_is_lowercase() {
        let res = NotificationRes::from(Notification::error("Error adding record", "denied"));
        assert_eq!(res.kind, "error");
        assert_eq!(res.description, "denied");
    }
}
