//! Profile loader and the profile editor's mutation handlers.
//!
//! Edits are buffered per field as drafts. Text fields commit on blur, select fields commit
//! as soon as they change, and [`PatientPortal::save_profile`] commits every draft at once.
//! Each write is guarded by the profile's `updated_at` so an edit made against a stale copy
//! is refused rather than silently overwriting a newer one.

use super::portal::PatientPortal;
use super::LoadTicket;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{decode_row, Collection, Gateway, Select, Update};
use crate::models::{ProfileField, ProfilePatch, ProfileRecord};
use crate::notify::Notification;
use crate::{PortalError, PortalResult};
use uuid::Uuid;

/// Reads the profile of one identity. A missing profile is `Ok(None)`, not an error; a
/// stored profile that does not decode is.
pub(super) async fn fetch_profile(
    gateway: &dyn Gateway,
    user: Uuid,
) -> GatewayResult<Option<ProfileRecord>> {
    let query = Select::from(Collection::Profiles)
        .eq("id", user.to_string())
        .limit(1);
    match gateway.select(&query).await {
        Ok(rows) => rows.into_iter().next().map(decode_row::<ProfileRecord>).transpose(),
        Err(e) if e.is_no_rows() => Ok(None),
        Err(e) => Err(e),
    }
}

impl PatientPortal {
    pub fn profile(&self) -> Option<&ProfileRecord> {
        self.profile.as_ref()
    }

    pub async fn load_profile(&mut self, gateway: &dyn Gateway) {
        let ticket = self.begin_profile_load();
        let result = fetch_profile(gateway, self.identity.id).await;
        self.apply_profile_load(ticket, result);
    }

    pub fn begin_profile_load(&mut self) -> LoadTicket {
        self.profile_loads.issue()
    }

    pub fn apply_profile_load(
        &mut self,
        ticket: LoadTicket,
        result: GatewayResult<Option<ProfileRecord>>,
    ) {
        if !self.profile_loads.is_current(ticket) {
            tracing::debug!("dropping stale profile load");
            return;
        }
        match result {
            Ok(profile) => {
                if profile.is_none() {
                    tracing::info!(user = %self.identity.id, "no profile stored yet");
                }
                self.profile = profile;
            }
            Err(e) => self
                .notifications
                .push(Notification::error("Error loading profile", e.to_string())),
        }
    }

    /// What the editor shows for `field`: the unsaved draft if there is one, else the stored
    /// value.
    pub fn profile_value(&self, field: ProfileField) -> String {
        if let Some(draft) = self.drafts.get(&field) {
            return draft.clone();
        }
        self.profile
            .as_ref()
            .map(|p| p.field_value(field))
            .unwrap_or_default()
    }

    /// Fields edited but not yet committed.
    pub fn pending_fields(&self) -> impl Iterator<Item = ProfileField> + '_ {
        self.drafts.keys().copied()
    }

    /// Buffers an edit without writing it.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::ProfileNotLoaded` when there is no profile to edit.
    pub fn edit_profile(&mut self, field: ProfileField, text: impl Into<String>) -> PortalResult<()> {
        if self.profile.is_none() {
            return Err(PortalError::ProfileNotLoaded);
        }
        self.drafts.insert(field, text.into());
        Ok(())
    }

    /// Commits the draft of one field, as a text input does on blur.
    ///
    /// A field with no draft is left alone and nothing is sent.
    ///
    /// # Errors
    ///
    /// See [`PatientPortal::save_profile`].
    pub async fn commit_profile_field(
        &mut self,
        gateway: &dyn Gateway,
        field: ProfileField,
    ) -> PortalResult<()> {
        if !self.drafts.contains_key(&field) {
            return Ok(());
        }
        self.write_profile(gateway, &[field]).await
    }

    /// Edits a select-style field and commits it straight away when the field commits on
    /// change. Text fields are only buffered.
    ///
    /// # Errors
    ///
    /// See [`PatientPortal::save_profile`].
    pub async fn change_profile_select(
        &mut self,
        gateway: &dyn Gateway,
        field: ProfileField,
        value: impl Into<String>,
    ) -> PortalResult<()> {
        self.edit_profile(field, value)?;
        if field.commits_on_change() {
            self.commit_profile_field(gateway, field).await?;
        }
        Ok(())
    }

    /// Commits every pending draft in one write.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::ProfileNotLoaded` with no profile, a parse error for a malformed
    /// date or gender, or the gateway error when the write fails. A stale profile is answered
    /// with `GatewayError::Conflict`, after which the profile is reloaded and drafts are kept.
    pub async fn save_profile(&mut self, gateway: &dyn Gateway) -> PortalResult<()> {
        let fields: Vec<ProfileField> = self.drafts.keys().copied().collect();
        if fields.is_empty() {
            return Ok(());
        }
        self.write_profile(gateway, &fields).await
    }

    async fn write_profile(
        &mut self,
        gateway: &dyn Gateway,
        fields: &[ProfileField],
    ) -> PortalResult<()> {
        let outcome = self.send_profile_patch(gateway, fields).await;
        match outcome {
            Ok(()) => {
                for field in fields {
                    self.drafts.remove(field);
                }
                self.notifications.push(Notification::success(
                    "Profile updated",
                    "Your profile has been successfully updated.",
                ));
                self.load_profile(gateway).await;
                Ok(())
            }
            Err(e) => {
                self.notifications
                    .push(Notification::error("Error updating profile", e.to_string()));
                if matches!(e, PortalError::Gateway(GatewayError::Conflict { .. })) {
                    self.load_profile(gateway).await;
                }
                Err(e)
            }
        }
    }

    async fn send_profile_patch(
        &self,
        gateway: &dyn Gateway,
        fields: &[ProfileField],
    ) -> PortalResult<()> {
        let profile = self.profile.as_ref().ok_or(PortalError::ProfileNotLoaded)?;
        let mut patch = ProfilePatch::new();
        for field in fields {
            let text = self.drafts.get(field).map(String::as_str).unwrap_or_default();
            patch.set(*field, text)?;
        }

        gateway
            .update(&Update {
                collection: Collection::Profiles,
                id: profile.id,
                patch: patch.to_row(),
                unmodified_since: profile.updated_at,
            })
            .await?;
        tracing::info!(user = %profile.id, fields = patch.len(), "profile updated");
        Ok(())
    }
}
