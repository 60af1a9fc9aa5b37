use super::RemoteRow;
use crate::gateway::Collection;
use crate::PortalError;
use chrono::{DateTime, NaiveDate, Utc};
use portal_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The enumerated kinds of health record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Diagnosis,
    Medication,
    LabResult,
    Vaccination,
    Visit,
    Allergy,
}

impl RecordType {
    pub const ALL: [RecordType; 6] = [
        RecordType::Diagnosis,
        RecordType::Medication,
        RecordType::LabResult,
        RecordType::Vaccination,
        RecordType::Visit,
        RecordType::Allergy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Diagnosis => "diagnosis",
            RecordType::Medication => "medication",
            RecordType::LabResult => "lab_result",
            RecordType::Vaccination => "vaccination",
            RecordType::Visit => "visit",
            RecordType::Allergy => "allergy",
        }
    }

    /// Human-readable label, e.g. `"Lab Result"`.
    pub fn label(&self) -> &'static str {
        match self {
            RecordType::Diagnosis => "Diagnosis",
            RecordType::Medication => "Medication",
            RecordType::LabResult => "Lab Result",
            RecordType::Vaccination => "Vaccination",
            RecordType::Visit => "Visit",
            RecordType::Allergy => "Allergy",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecordType {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        RecordType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| PortalError::UnknownRecordType(s.to_string()))
    }
}

/// A stored health record. Created through the portal, never updated or deleted by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub record_type: RecordType,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub clinic_name: Option<String>,
    pub date_recorded: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl HealthRecord {
    /// Long-form date, e.g. `"October 18, 2026"`.
    pub fn date_label(&self) -> String {
        self.date_recorded.format("%B %-d, %Y").to_string()
    }

    /// `"Dr. <name>"` when a doctor is recorded.
    pub fn doctor_label(&self) -> Option<String> {
        self.doctor_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .map(|name| format!("Dr. {name}"))
    }
}

impl RemoteRow for HealthRecord {
    const COLLECTION: Collection = Collection::HealthRecords;

    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err(format!("health record {} has no title", self.id));
        }
        Ok(())
    }
}

/// The row inserted for a new health record.
///
/// Built from a validated form buffer, so the required fields are guaranteed present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewHealthRecord {
    pub user_id: Uuid,
    pub record_type: RecordType,
    pub title: NonEmptyText,
    pub description: Option<String>,
    pub doctor_name: Option<String>,
    pub clinic_name: Option<String>,
    pub date_recorded: NaiveDate,
}
