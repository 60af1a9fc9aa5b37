//! Constants used throughout the portal core crate.
//!
//! Collection names, user-facing messages and defaults live here so the views, the REST
//! server and the CLI agree on them.

/// Remote collection holding clinic rows.
pub const CLINICS_COLLECTION: &str = "clinics";

/// Remote collection holding one profile row per identity.
pub const PROFILES_COLLECTION: &str = "profiles";

/// Remote collection holding health records.
pub const HEALTH_RECORDS_COLLECTION: &str = "health_records";

/// Upstream error code for "query returned no rows" on a single-row read.
pub const NO_ROWS_ERROR_CODE: &str = "PGRST116";

/// Earth radius used by the distance estimator, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Latitude of the fallback origin (Nairobi).
pub const DEFAULT_ORIGIN_LATITUDE: f64 = -1.2921;

/// Longitude of the fallback origin (Nairobi).
pub const DEFAULT_ORIGIN_LONGITUDE: f64 = 36.8219;

/// Default map style URL handed to the map SDK.
pub const DEFAULT_MAP_STYLE: &str = "mapbox://styles/mapbox/streets-v12";

/// Default map zoom level.
pub const DEFAULT_MAP_ZOOM: f64 = 12.0;

/// Padding, in pixels, applied when fitting the camera to all markers.
pub const FIT_BOUNDS_PADDING: u32 = 50;

/// Where signed-out visitors of the portal are sent.
pub const DEFAULT_SIGN_IN_PATH: &str = "/auth";

/// Default simulated analysis time of the symptom checker, in milliseconds.
pub const DEFAULT_SYMPTOM_DELAY_MS: u64 = 3000;

/// Window used by the "recent records" overview counter.
pub const RECENT_RECORD_WINDOW_DAYS: i64 = 30;

/// Number of records shown in the overview list.
pub const OVERVIEW_RECENT_LIMIT: usize = 5;

/// Number of service badges shown on a clinic card before collapsing.
pub const CARD_SERVICE_LIMIT: usize = 4;

/// Number of services shown in a map marker popup.
pub const POPUP_SERVICE_LIMIT: usize = 2;

pub const LOADING_CLINICS_TITLE: &str = "Loading clinics...";
pub const LOADING_CLINICS_HINT: &str = "Please wait while we load nearby healthcare facilities";
pub const NO_CLINICS_TITLE: &str = "No clinics found";
pub const NO_CLINICS_HINT: &str = "Try searching with different keywords or location";
pub const LOADING_PORTAL_MESSAGE: &str = "Loading your health portal...";
pub const NO_RECORDS_MESSAGE: &str = "No health records found. Add your first record to get started.";
