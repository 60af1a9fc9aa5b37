use super::RemoteRow;
use crate::gateway::{Collection, Row};
use crate::{PortalError, PortalResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(PortalError::UnknownGender(other.to_string())),
        }
    }
}

/// One row per authenticated identity; `id` is the identity key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub emergency_contact_name: Option<String>,
    #[serde(default)]
    pub emergency_contact_phone: Option<String>,
    /// Last write time, used as the stale-write guard when present.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProfileRecord {
    /// A profile counts as complete once phone and date of birth are filled in.
    pub fn is_complete(&self) -> bool {
        self.phone.as_deref().is_some_and(|p| !p.is_empty()) && self.date_of_birth.is_some()
    }

    /// The field's current value as form text, empty when unset.
    pub fn field_value(&self, field: ProfileField) -> String {
        match field {
            ProfileField::FullName => self.full_name.clone().unwrap_or_default(),
            ProfileField::Phone => self.phone.clone().unwrap_or_default(),
            ProfileField::DateOfBirth => self
                .date_of_birth
                .map(|d| d.to_string())
                .unwrap_or_default(),
            ProfileField::Gender => self
                .gender
                .map(|g| g.as_str().to_string())
                .unwrap_or_default(),
            ProfileField::EmergencyContactName => {
                self.emergency_contact_name.clone().unwrap_or_default()
            }
            ProfileField::EmergencyContactPhone => {
                self.emergency_contact_phone.clone().unwrap_or_default()
            }
        }
    }
}

impl RemoteRow for ProfileRecord {
    const COLLECTION: Collection = Collection::Profiles;
}

/// Profile fields the portal may edit. Email is managed by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProfileField {
    FullName,
    Phone,
    DateOfBirth,
    Gender,
    EmergencyContactName,
    EmergencyContactPhone,
}

impl ProfileField {
    pub const ALL: [ProfileField; 6] = [
        ProfileField::FullName,
        ProfileField::Phone,
        ProfileField::DateOfBirth,
        ProfileField::Gender,
        ProfileField::EmergencyContactName,
        ProfileField::EmergencyContactPhone,
    ];

    /// Column name in the `profiles` collection.
    pub fn column(&self) -> &'static str {
        match self {
            ProfileField::FullName => "full_name",
            ProfileField::Phone => "phone",
            ProfileField::DateOfBirth => "date_of_birth",
            ProfileField::Gender => "gender",
            ProfileField::EmergencyContactName => "emergency_contact_name",
            ProfileField::EmergencyContactPhone => "emergency_contact_phone",
        }
    }

    /// Select-style fields are committed as soon as they change, text fields on blur.
    pub fn commits_on_change(&self) -> bool {
        matches!(self, ProfileField::Gender)
    }
}

impl std::fmt::Display for ProfileField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

impl std::str::FromStr for ProfileField {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_");
        if wanted == "email" {
            return Err(PortalError::ReadOnlyField);
        }
        ProfileField::ALL
            .into_iter()
            .find(|f| f.column() == wanted)
            .ok_or_else(|| PortalError::UnknownProfileField(s.to_string()))
    }
}

/// A partial profile update: only the fields it names are written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilePatch {
    fields: BTreeMap<ProfileField, Option<String>>,
}

impl ProfilePatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one field from form text. Blank text clears the field.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::InvalidDate` or `PortalError::UnknownGender` if the text does not
    /// parse for that field.
    pub fn set(&mut self, field: ProfileField, text: &str) -> PortalResult<()> {
        let trimmed = text.trim();
        let value = if trimmed.is_empty() {
            None
        } else {
            match field {
                ProfileField::DateOfBirth => {
                    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                        .map_err(|_| PortalError::InvalidDate(trimmed.to_string()))?;
                    Some(date.to_string())
                }
                ProfileField::Gender => Some(trimmed.parse::<Gender>()?.as_str().to_string()),
                _ => Some(trimmed.to_string()),
            }
        };
        self.fields.insert(field, value);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = ProfileField> + '_ {
        self.fields.keys().copied()
    }

    pub fn to_row(&self) -> Row {
        self.fields
            .iter()
            .map(|(field, value)| {
                let json = value
                    .as_ref()
                    .map_or(serde_json::Value::Null, |v| serde_json::Value::String(v.clone()));
                (field.column().to_string(), json)
            })
            .collect()
    }
}
