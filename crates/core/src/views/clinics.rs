//! Clinic locator view.
//!
//! Loads every clinic once on activation (highest rated first), filters locally on search,
//! and exposes cards, selection and the map scene for the current subset.

use super::{LoadSequence, LoadTicket};
use crate::constants::{
    CARD_SERVICE_LIMIT, LOADING_CLINICS_HINT, LOADING_CLINICS_TITLE, NO_CLINICS_HINT,
    NO_CLINICS_TITLE,
};
use crate::error::GatewayResult;
use crate::gateway::{decode_rows, Collection, Gateway, Select};
use crate::geo::{distance_label, Coordinate};
use crate::map::{MapConfig, MapMarker, MapScene};
use crate::models::ClinicRecord;
use crate::notify::{Notification, Notifications};
use crate::search::filter_clinics;
use serde::Serialize;
use uuid::Uuid;

/// What the list area shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "count")]
pub enum ListingStatus {
    /// No response has arrived yet.
    Loading,
    /// A response arrived but nothing matches (or nothing exists).
    NoResults,
    Results(usize),
}

impl ListingStatus {
    /// Title and hint for the empty list area, `None` when there are cards to show.
    pub fn message(&self) -> Option<(&'static str, &'static str)> {
        match self {
            ListingStatus::Loading => Some((LOADING_CLINICS_TITLE, LOADING_CLINICS_HINT)),
            ListingStatus::NoResults => Some((NO_CLINICS_TITLE, NO_CLINICS_HINT)),
            ListingStatus::Results(_) => None,
        }
    }
}

/// A clinic as rendered in the result grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClinicCard {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub rating: String,
    pub distance: Option<String>,
    pub services: Vec<String>,
    /// `"+N more"` when services were cut off.
    pub more_services: Option<String>,
    pub phone: Option<String>,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct ClinicLocator {
    clinics: Vec<ClinicRecord>,
    filtered: Vec<ClinicRecord>,
    query: String,
    selected: Option<Uuid>,
    origin: Coordinate,
    loaded: bool,
    loads: LoadSequence,
    notifications: Notifications,
}

impl ClinicLocator {
    /// Creates an empty locator measuring distances from `origin`.
    pub fn new(origin: Coordinate) -> Self {
        Self {
            clinics: Vec::new(),
            filtered: Vec::new(),
            query: String::new(),
            selected: None,
            origin,
            loaded: false,
            loads: LoadSequence::default(),
            notifications: Notifications::default(),
        }
    }

    /// Loads the clinic list: issue, fetch and apply in one step.
    pub async fn load(&mut self, gateway: &dyn Gateway) {
        let ticket = self.begin_load();
        let result = fetch_clinics(gateway).await;
        self.apply_load(ticket, result);
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.loads.issue()
    }

    /// Applies a load result. Stale tickets are ignored; failures keep the current list.
    pub fn apply_load(&mut self, ticket: LoadTicket, result: GatewayResult<Vec<ClinicRecord>>) {
        if !self.loads.is_current(ticket) {
            tracing::debug!("dropping stale clinic load");
            return;
        }
        match result {
            Ok(clinics) => {
                tracing::info!("loaded {} clinics", clinics.len());
                self.filtered = filter_clinics(&clinics, &self.query);
                self.clinics = clinics;
                self.loaded = true;
                self.retain_selection();
            }
            Err(e) => self
                .notifications
                .push(Notification::error("Error loading clinics", e.to_string())),
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Filters the loaded list by the current query.
    ///
    /// A non-blank query matching nothing raises one "No clinics found" notification.
    pub fn search(&mut self) -> &[ClinicRecord] {
        self.filtered = filter_clinics(&self.clinics, &self.query);
        self.retain_selection();
        if self.filtered.is_empty() && !self.query.trim().is_empty() {
            self.notifications.push(Notification::info(
                NO_CLINICS_TITLE,
                "Try searching with different keywords or location.",
            ));
        }
        &self.filtered
    }

    pub fn clinics(&self) -> &[ClinicRecord] {
        &self.clinics
    }

    pub fn filtered(&self) -> &[ClinicRecord] {
        &self.filtered
    }

    pub fn status(&self) -> ListingStatus {
        if !self.loaded {
            ListingStatus::Loading
        } else if self.filtered.is_empty() {
            ListingStatus::NoResults
        } else {
            ListingStatus::Results(self.filtered.len())
        }
    }

    pub fn origin(&self) -> Coordinate {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Coordinate) {
        self.origin = origin;
    }

    /// Selects a clinic from the current subset. Returns `false` if it is not shown.
    pub fn select(&mut self, id: Uuid) -> bool {
        let shown = self.filtered.iter().any(|c| c.id == id);
        if shown {
            self.selected = Some(id);
        }
        shown
    }

    /// Selection callback for map markers.
    pub fn select_marker(&mut self, marker: &MapMarker) -> bool {
        marker.clinic_id.is_some_and(|id| self.select(id))
    }

    pub fn selected(&self) -> Option<&ClinicRecord> {
        let id = self.selected?;
        self.filtered.iter().find(|c| c.id == id)
    }

    pub fn cards(&self) -> Vec<ClinicCard> {
        self.filtered
            .iter()
            .map(|clinic| {
                let services = clinic.services();
                let hidden = services.len().saturating_sub(CARD_SERVICE_LIMIT);
                ClinicCard {
                    id: clinic.id,
                    name: clinic.name.clone(),
                    address: clinic.address.clone(),
                    rating: clinic.rating_label(),
                    distance: distance_label(self.origin, clinic.coordinate()),
                    services: services.iter().take(CARD_SERVICE_LIMIT).cloned().collect(),
                    more_services: (hidden > 0).then(|| format!("+{hidden} more")),
                    phone: clinic.phone.clone(),
                    selected: self.selected == Some(clinic.id),
                }
            })
            .collect()
    }

    /// Map scene for the current subset, centred on the origin.
    pub fn map_scene(&self, cfg: &MapConfig) -> MapScene {
        MapScene::new(cfg, self.origin, &self.filtered)
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.take()
    }

    fn retain_selection(&mut self) {
        if let Some(id) = self.selected {
            if !self.filtered.iter().any(|c| c.id == id) {
                self.selected = None;
            }
        }
    }
}

/// Reads every clinic, highest rated first.
pub async fn fetch_clinics(gateway: &dyn Gateway) -> GatewayResult<Vec<ClinicRecord>> {
    let rows = gateway
        .select(&Select::from(Collection::Clinics).order_by("rating", true))
        .await?;
    Ok(decode_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{encode_row, MemoryGateway, Operation};
    use crate::models::clinic::fixtures::clinic;
    use crate::notify::NotificationKind;

    fn seeded() -> MemoryGateway {
        let clinics = [
            clinic("Coast General", "Moi Ave, Mombasa", &["Maternity"], Some(4.1)),
            clinic(
                "Aga Khan University Hospital",
                "3rd Parklands Ave, Nairobi",
                &["Cardiology", "Emergency", "Radiology", "Oncology", "Pharmacy", "Dental"],
                Some(4.7),
            ),
            clinic("Kisumu Eye Centre", "Oginga Odinga St, Kisumu", &["Ophthalmology"], None),
        ];
        let rows = clinics
            .iter()
            .map(|c| encode_row(Collection::Clinics, c).expect("clinic should encode"))
            .collect();
        MemoryGateway::with_rows(Collection::Clinics, rows)
    }

    #[tokio::test]
    async fn test_load_orders_by_rating_descending() {
        let gateway = seeded();
        let mut locator = ClinicLocator::new(Coordinate::default_origin());
        locator.load(&gateway).await;

        let names: Vec<_> = locator.clinics().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Aga Khan University Hospital", "Coast General", "Kisumu Eye Centre"]
        );
        assert_eq!(locator.filtered(), locator.clinics());
        assert_eq!(locator.status(), ListingStatus::Results(3));
    }

    #[tokio::test]
    async fn test_status_moves_from_loading_to_no_results_for_empty_collection() {
        let gateway = MemoryGateway::new();
        let mut locator = ClinicLocator::new(Coordinate::default_origin());

        assert_eq!(locator.status(), ListingStatus::Loading);
        assert_eq!(locator.status().message().unwrap().0, "Loading clinics...");

        locator.load(&gateway).await;
        assert_eq!(locator.status(), ListingStatus::NoResults);
        assert_eq!(locator.status().message().unwrap().0, "No clinics found");
        assert!(locator.take_notifications().is_empty());
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_list_and_notifies() {
        let gateway = seeded();
        let mut locator = ClinicLocator::new(Coordinate::default_origin());
        locator.load(&gateway).await;
        gateway
            .fail_next(Operation::Select, Collection::Clinics, "JWT expired")
            .await;

        locator.load(&gateway).await;

        assert_eq!(locator.clinics().len(), 3, "stale data should be kept");
        let notes = locator.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Error loading clinics");
        assert_eq!(notes[0].description, "JWT expired");
        assert_eq!(notes[0].kind, NotificationKind::Error);
    }

    #[tokio::test]
    async fn test_search_with_no_match_notifies_exactly_once() {
        let gateway = seeded();
        let mut locator = ClinicLocator::new(Coordinate::default_origin());
        locator.load(&gateway).await;

        locator.set_query("dialysis in Eldoret");
        assert!(locator.search().is_empty());

        let notes = locator.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "No clinics found");
        assert_eq!(notes[0].kind, NotificationKind::Info);
        assert_eq!(locator.status(), ListingStatus::NoResults);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_blank_restores_all() {
        let gateway = seeded();
        let mut locator = ClinicLocator::new(Coordinate::default_origin());
        locator.load(&gateway).await;

        locator.set_query("NAIROBI");
        assert_eq!(locator.search().len(), 1);

        locator.set_query("  ");
        assert_eq!(locator.search().len(), 3);
        assert!(locator.take_notifications().is_empty());
        assert!(gateway
            .requests()
            .await
            .iter()
            .all(|(op, _)| *op == Operation::Select));
        assert_eq!(gateway.requests().await.len(), 1, "search never goes upstream");
    }

    #[tokio::test]
    async fn test_stale_load_is_dropped() {
        let mut locator = ClinicLocator::new(Coordinate::default_origin());
        let older = locator.begin_load();
        let newer = locator.begin_load();

        locator.apply_load(
            newer,
            Ok(vec![clinic("Newer", "Nairobi", &[], Some(4.0))]),
        );
        locator.apply_load(
            older,
            Ok(vec![clinic("Older", "Nairobi", &[], Some(3.0))]),
        );

        assert_eq!(locator.clinics().len(), 1);
        assert_eq!(locator.clinics()[0].name, "Newer");
    }

    #[tokio::test]
    async fn test_cards_and_selection() {
        let gateway = seeded();
        let mut locator = ClinicLocator::new(Coordinate::default_origin());
        locator.load(&gateway).await;

        let aga_khan = locator.clinics()[0].id;
        assert!(locator.select(aga_khan));

        let cards = locator.cards();
        assert!(cards[0].selected);
        assert_eq!(cards[0].services.len(), 4);
        assert_eq!(cards[0].more_services.as_deref(), Some("+2 more"));
        assert_eq!(cards[0].rating, "4.7");
        assert!(cards[0].distance.as_deref().is_some_and(|d| d.ends_with(" km")));
        assert_eq!(cards[2].rating, "N/A");

        locator.set_query("Mombasa");
        locator.search();
        assert!(locator.selected().is_none(), "hidden clinic cannot stay selected");
    }

    #[tokio::test]
    async fn test_marker_selection_uses_callback_id() {
        let gateway = seeded();
        let mut locator = ClinicLocator::new(Coordinate::default_origin());
        locator.load(&gateway).await;

        let scene = locator.map_scene(&MapConfig {
            access_token: "pk.test".into(),
            style: "style".into(),
            zoom: 12.0,
        });
        assert!(!locator.select_marker(&scene.markers[0]), "user marker selects nothing");
        assert!(locator.select_marker(&scene.markers[2]));
        assert_eq!(
            locator.selected().map(|c| c.name.as_str()),
            Some("Coast General")
        );
    }
}
