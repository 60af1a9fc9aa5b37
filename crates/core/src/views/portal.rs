//! Patient portal view.
//!
//! One view per signed-in visitor holding their profile, their health records, the record
//! composer and any unsaved profile edits. Record handlers live in `records.rs`, profile
//! handlers in `profile.rs`; both operate on the state defined here.

use super::LoadSequence;
use crate::constants::{NO_RECORDS_MESSAGE, OVERVIEW_RECENT_LIMIT, RECENT_RECORD_WINDOW_DAYS};
use crate::gateway::Gateway;
use crate::identity::{gate, AuthState, Gate, Identity, Session};
use crate::models::{HealthRecord, ProfileField, ProfileRecord};
use crate::notify::{Notification, Notifications};
use chrono::{Duration, Local, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// The record composer's form buffer. Fields hold form text exactly as entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordForm {
    pub record_type: String,
    pub title: String,
    pub description: String,
    pub doctor_name: String,
    pub clinic_name: String,
    /// `YYYY-MM-DD`.
    pub date_recorded: String,
}

impl RecordForm {
    /// An empty form dated `today`.
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            record_type: String::new(),
            title: String::new(),
            description: String::new(),
            doctor_name: String::new(),
            clinic_name: String::new(),
            date_recorded: today.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProfileStatus {
    Complete,
    Incomplete,
}

/// Summary shown on the portal's overview tab.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total_records: usize,
    /// Records dated within the last 30 days.
    pub recent_records: usize,
    pub profile_status: ProfileStatus,
    pub latest: Vec<HealthRecord>,
    /// Shown instead of the list when there are no records.
    pub empty_message: Option<&'static str>,
}

/// Result of mounting the portal for the current auth state.
#[derive(Debug)]
pub enum Mount {
    Loading(&'static str),
    Redirect(String),
    Ready(PatientPortal),
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Debug)]
pub struct PatientPortal {
    pub(super) identity: Identity,
    pub(super) records: Vec<HealthRecord>,
    pub(super) record_loads: LoadSequence,
    pub(super) composer_open: bool,
    pub(super) form: RecordForm,
    pub(super) profile: Option<ProfileRecord>,
    pub(super) profile_loads: LoadSequence,
    pub(super) drafts: BTreeMap<ProfileField, String>,
    pub(super) today: fn() -> NaiveDate,
    pub(super) notifications: Notifications,
}

impl PatientPortal {
    /// Gates the portal on the identity provider's answer.
    pub fn mount(auth: &AuthState, sign_in_path: &str) -> Mount {
        match gate(auth, sign_in_path) {
            Gate::Loading(message) => Mount::Loading(message),
            Gate::Redirect(to) => {
                tracing::info!("no identity, redirecting to {to}");
                Mount::Redirect(to)
            }
            Gate::Ready(identity) => Mount::Ready(Self::new(identity.clone())),
        }
    }

    /// A portal for a known identity, using the local calendar for "today".
    pub fn new(identity: Identity) -> Self {
        Self::with_clock(identity, local_today)
    }

    /// A portal whose notion of "today" comes from `today`.
    pub fn with_clock(identity: Identity, today: fn() -> NaiveDate) -> Self {
        Self {
            identity,
            records: Vec::new(),
            record_loads: LoadSequence::default(),
            composer_open: false,
            form: RecordForm::blank(today()),
            profile: None,
            profile_loads: LoadSequence::default(),
            drafts: BTreeMap::new(),
            today,
            notifications: Notifications::default(),
        }
    }

    /// Runs the activation loaders: profile and health records, fetched concurrently.
    pub async fn activate(&mut self, gateway: &dyn Gateway) {
        let profile_ticket = self.profile_loads.issue();
        let records_ticket = self.record_loads.issue();
        let user = self.identity.id;

        let (profile, records) = tokio::join!(
            super::profile::fetch_profile(gateway, user),
            super::records::fetch_records(gateway, user)
        );

        self.apply_profile_load(profile_ticket, profile);
        self.apply_records_load(records_ticket, records);
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn today(&self) -> NaiveDate {
        (self.today)()
    }

    pub fn overview(&self) -> Overview {
        let cutoff = self.today() - Duration::days(RECENT_RECORD_WINDOW_DAYS);
        let profile_status = match &self.profile {
            Some(profile) if profile.is_complete() => ProfileStatus::Complete,
            _ => ProfileStatus::Incomplete,
        };
        Overview {
            total_records: self.records.len(),
            recent_records: self
                .records
                .iter()
                .filter(|r| r.date_recorded > cutoff)
                .count(),
            profile_status,
            latest: self
                .records
                .iter()
                .take(OVERVIEW_RECENT_LIMIT)
                .cloned()
                .collect(),
            empty_message: self.records.is_empty().then_some(NO_RECORDS_MESSAGE),
        }
    }

    /// Signs out and drops everything the view holds for this identity.
    pub fn sign_out(self, session: &mut Session) {
        tracing::info!(user = %self.identity.id, "closing portal");
        session.sign_out();
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.take()
    }

    pub fn notifications(&self) -> &[Notification] {
        self.notifications.pending()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::gateway::{encode_row, Collection, MemoryGateway, Row};
    use chrono::Utc;
    use uuid::Uuid;

    pub(crate) fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    pub(crate) fn identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: Some("amina@example.com".into()),
        }
    }

    pub(crate) fn record_row(owner: Uuid, title: &str, date: &str) -> Row {
        let record = HealthRecord {
            id: Uuid::new_v4(),
            user_id: owner,
            record_type: crate::models::RecordType::Visit,
            title: title.into(),
            description: None,
            doctor_name: None,
            clinic_name: None,
            date_recorded: date.parse().expect("test date should parse"),
            created_at: Utc::now(),
        };
        encode_row(Collection::HealthRecords, &record).expect("record should encode")
    }

    pub(crate) fn profile_row(owner: Uuid) -> Row {
        let profile = ProfileRecord {
            id: owner,
            email: Some("amina@example.com".into()),
            full_name: Some("Amina Otieno".into()),
            phone: None,
            date_of_birth: None,
            gender: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
            updated_at: Some(Utc::now()),
        };
        encode_row(Collection::Profiles, &profile).expect("profile should encode")
    }

    pub(crate) fn portal_with(rows: Vec<(Collection, Row)>) -> (PatientPortal, MemoryGateway) {
        let portal = PatientPortal::with_clock(identity(), fixed_today);
        let gateway = rows
            .into_iter()
            .fold(MemoryGateway::new(), |gateway, (collection, row)| {
                gateway.and_rows(collection, vec![row])
            });
        (portal, gateway)
    }
}
