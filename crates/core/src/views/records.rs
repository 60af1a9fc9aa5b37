//! Health record loader and the record composer's mutation handler.

use super::portal::{PatientPortal, RecordForm};
use super::LoadTicket;
use crate::error::GatewayResult;
use crate::gateway::{decode_rows, encode_row, Collection, Gateway, Select};
use crate::models::{HealthRecord, NewHealthRecord, RecordType};
use crate::notify::Notification;
use crate::{PortalError, PortalResult};
use chrono::NaiveDate;
use portal_types::NonEmptyText;
use uuid::Uuid;

/// Reads one identity's records, most recent first.
pub(super) async fn fetch_records(
    gateway: &dyn Gateway,
    user: Uuid,
) -> GatewayResult<Vec<HealthRecord>> {
    let rows = gateway
        .select(
            &Select::from(Collection::HealthRecords)
                .eq("user_id", user.to_string())
                .order_by("date_recorded", true),
        )
        .await?;
    Ok(decode_rows(rows))
}

fn optional(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Checks the composer's required fields and builds the row to insert.
fn validate_form(form: &RecordForm, user: Uuid) -> PortalResult<NewHealthRecord> {
    if form.record_type.trim().is_empty() {
        return Err(PortalError::MissingField("record type"));
    }
    let record_type: RecordType = form.record_type.parse()?;
    let title =
        NonEmptyText::new(&form.title).map_err(|_| PortalError::MissingField("title"))?;
    let date = form.date_recorded.trim();
    if date.is_empty() {
        return Err(PortalError::MissingField("date"));
    }
    let date_recorded = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| PortalError::InvalidDate(date.to_string()))?;

    Ok(NewHealthRecord {
        user_id: user,
        record_type,
        title,
        description: optional(&form.description),
        doctor_name: optional(&form.doctor_name),
        clinic_name: optional(&form.clinic_name),
        date_recorded,
    })
}

impl PatientPortal {
    /// Records in display order: `date_recorded` descending.
    pub fn records(&self) -> &[HealthRecord] {
        &self.records
    }

    pub async fn load_records(&mut self, gateway: &dyn Gateway) {
        let ticket = self.begin_records_load();
        let result = fetch_records(gateway, self.identity.id).await;
        self.apply_records_load(ticket, result);
    }

    pub fn begin_records_load(&mut self) -> LoadTicket {
        self.record_loads.issue()
    }

    /// Replaces the record list on success; keeps it and notifies on failure.
    pub fn apply_records_load(
        &mut self,
        ticket: LoadTicket,
        result: GatewayResult<Vec<HealthRecord>>,
    ) {
        if !self.record_loads.is_current(ticket) {
            tracing::debug!("dropping stale health record load");
            return;
        }
        match result {
            Ok(mut records) => {
                // Stable, so the store's order survives among equal dates.
                records.sort_by(|a, b| b.date_recorded.cmp(&a.date_recorded));
                tracing::info!(user = %self.identity.id, "loaded {} health records", records.len());
                self.records = records;
            }
            Err(e) => self.notifications.push(Notification::error(
                "Error loading health records",
                e.to_string(),
            )),
        }
    }

    pub fn composer_open(&self) -> bool {
        self.composer_open
    }

    pub fn open_composer(&mut self) {
        self.composer_open = true;
    }

    /// Closes the composer without clearing what was typed.
    pub fn cancel_composer(&mut self) {
        self.composer_open = false;
    }

    pub fn toggle_composer(&mut self) {
        self.composer_open = !self.composer_open;
    }

    pub fn form(&self) -> &RecordForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut RecordForm {
        &mut self.form
    }

    /// Submits the composer's buffer as a new health record.
    ///
    /// On success the buffer is reset, the composer closes and the record list reloads. On
    /// any failure the buffer and composer are left as they are so the user can retry.
    ///
    /// # Errors
    ///
    /// Returns a validation error when record type, title or date is missing or malformed,
    /// or the gateway error when the insert fails. Either way a notification is queued.
    pub async fn submit_record(&mut self, gateway: &dyn Gateway) -> PortalResult<()> {
        let outcome = match validate_form(&self.form, self.identity.id) {
            Ok(new_record) => self.insert_record(gateway, &new_record).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &outcome {
            self.notifications
                .push(Notification::error("Error adding record", e.to_string()));
            return outcome;
        }

        self.notifications.push(Notification::success(
            "Record added successfully",
            "Your health record has been saved.",
        ));
        self.composer_open = false;
        self.form = RecordForm::blank(self.today());
        self.load_records(gateway).await;
        Ok(())
    }

    async fn insert_record(
        &self,
        gateway: &dyn Gateway,
        new_record: &NewHealthRecord,
    ) -> PortalResult<()> {
        let row = encode_row(Collection::HealthRecords, new_record)?;
        gateway.insert(Collection::HealthRecords, row).await?;
        tracing::info!(
            user = %self.identity.id,
            record_type = %new_record.record_type,
            "health record added"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::portal::test_support::*;
    use super::*;
    use crate::gateway::{MemoryGateway, Operation};
    use crate::notify::NotificationKind;

    fn fill(portal: &mut PatientPortal) {
        portal.open_composer();
        let form = portal.form_mut();
        form.record_type = "vaccination".into();
        form.title = "Yellow fever".into();
        form.doctor_name = "Kamau".into();
        form.date_recorded = "2026-09-30".into();
    }

    #[tokio::test]
    async fn test_successful_submit_resets_closes_and_reloads() {
        let (mut portal, gateway) = portal_with(vec![]);
        fill(&mut portal);

        portal
            .submit_record(&gateway)
            .await
            .expect("submit should succeed");

        assert!(!portal.composer_open());
        assert_eq!(portal.form(), &RecordForm::blank(fixed_today()));
        assert_eq!(portal.form().date_recorded, "2026-10-18");
        assert_eq!(
            gateway.requests().await,
            vec![
                (Operation::Insert, Collection::HealthRecords),
                (Operation::Select, Collection::HealthRecords),
            ]
        );
        assert_eq!(portal.records().len(), 1);
        let record = &portal.records()[0];
        assert_eq!(record.record_type, RecordType::Vaccination);
        assert_eq!(record.doctor_name.as_deref(), Some("Kamau"));
        assert_eq!(record.description, None);

        let notes = portal.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Success);
        assert_eq!(notes[0].title, "Record added successfully");
    }

    #[tokio::test]
    async fn test_failed_insert_keeps_buffer_and_composer() {
        let (mut portal, gateway) = portal_with(vec![]);
        gateway
            .fail_next(
                Operation::Insert,
                Collection::HealthRecords,
                "new row violates row-level security policy",
            )
            .await;
        fill(&mut portal);
        let before = portal.form().clone();

        let err = portal
            .submit_record(&gateway)
            .await
            .expect_err("insert should fail");

        assert!(matches!(err, PortalError::Gateway(_)));
        assert!(portal.composer_open());
        assert_eq!(portal.form(), &before);
        assert_eq!(gateway.requests().await.len(), 1, "no reload after failure");

        let notes = portal.take_notifications();
        assert_eq!(notes[0].title, "Error adding record");
        assert_eq!(
            notes[0].description,
            "new row violates row-level security policy"
        );
    }

    #[tokio::test]
    async fn test_missing_required_fields_never_reach_gateway() {
        let (mut portal, gateway) = portal_with(vec![]);
        portal.open_composer();
        portal.form_mut().title = "Penicillin".into();

        let err = portal
            .submit_record(&gateway)
            .await
            .expect_err("missing type should fail");
        assert!(matches!(err, PortalError::MissingField("record type")));

        portal.form_mut().record_type = "allergy".into();
        portal.form_mut().title = "   ".into();
        let err = portal
            .submit_record(&gateway)
            .await
            .expect_err("blank title should fail");
        assert!(matches!(err, PortalError::MissingField("title")));

        portal.form_mut().title = "Penicillin".into();
        portal.form_mut().record_type = "superstition".into();
        let err = portal
            .submit_record(&gateway)
            .await
            .expect_err("unknown type should fail");
        assert!(matches!(err, PortalError::UnknownRecordType(_)));

        assert!(gateway.requests().await.is_empty());
        assert!(portal.composer_open());
    }

    #[tokio::test]
    async fn test_records_are_listed_newest_first() {
        let who = identity();
        let gateway = MemoryGateway::with_rows(
            Collection::HealthRecords,
            vec![
                record_row(who.id, "Middle", "2025-06-01"),
                record_row(who.id, "Oldest", "2024-01-15"),
                record_row(who.id, "Newest", "2026-10-01"),
            ],
        );
        let mut portal = PatientPortal::with_clock(who, fixed_today);

        portal.load_records(&gateway).await;

        let titles: Vec<_> = portal.records().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Newest", "Middle", "Oldest"]);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_records() {
        let who = identity();
        let gateway = MemoryGateway::with_rows(
            Collection::HealthRecords,
            vec![record_row(who.id, "Checkup", "2026-10-01")],
        );
        let mut portal = PatientPortal::with_clock(who, fixed_today);
        portal.load_records(&gateway).await;
        gateway
            .fail_next(Operation::Select, Collection::HealthRecords, "timeout")
            .await;

        portal.load_records(&gateway).await;

        assert_eq!(portal.records().len(), 1);
        let notes = portal.take_notifications();
        assert_eq!(notes[0].title, "Error loading health records");
        assert_eq!(notes[0].description, "timeout");
    }

    #[test]
    fn test_cancel_keeps_typed_values() {
        let (mut portal, _gateway) = portal_with(vec![]);
        fill(&mut portal);
        portal.cancel_composer();
        assert!(!portal.composer_open());
        assert_eq!(portal.form().title, "Yellow fever");
    }
}
