//! # Portal Core
//!
//! Client-side data flow of the healthcare portal.
//!
//! This crate holds everything between the remote store and what a surface renders:
//! - The remote data gateway over the `clinics`, `profiles` and `health_records` collections
//! - Entity loaders, the local clinic filter and the distance estimator
//! - Per-view state with the record and profile mutation handlers
//! - The map marker model, location detection and the simulated symptom checker
//!
//! **No surface concerns**: HTTP routing, API keys and command-line parsing belong in
//! `api-rest`, `api-shared` and `portal-cli`.

pub mod config;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod geo;
pub mod geolocation;
pub mod identity;
pub mod map;
pub mod models;
pub mod notify;
pub mod search;
pub mod symptoms;
pub mod views;

pub use config::{ConfigSources, GatewayConfig, PortalConfig};
pub use error::{GatewayError, GatewayResult, PortalError, PortalResult};
pub use gateway::{Collection, Gateway, MemoryGateway, PostgrestConfig, PostgrestGateway, Row};
pub use geo::{distance_label, format_km, haversine_km, Coordinate};
pub use identity::{AuthState, Identity, Session};
pub use models::{
    ClinicRecord, Gender, HealthRecord, NewHealthRecord, ProfileField, ProfilePatch,
    ProfileRecord, RecordType,
};
pub use notify::{Notification, NotificationKind};
pub use views::{ClinicLocator, PatientPortal};
