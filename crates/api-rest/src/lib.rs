//! # API REST
//!
//! REST API implementation for the healthcare portal.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, identity headers)
//!
//! Every request builds its own view from `portal-core`, runs the view's loaders or
//! mutation handlers, and renders the result with the wire types from `api-shared`.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use api_shared::{
    notifications_res, validate_api_key, AnalyzeReq, AssessmentRes, CameraFitRes, ClinicCardRes,
    ClinicListRes, ConditionRes, CreateRecordReq, HealthRecordRes, HealthRes, HealthService,
    MarkerRes, NotificationRes, OverviewRes, ProfileDto, ProfileRes, RecordListRes,
    UpdateProfileReq,
};
use portal_core::geolocation::{resolve_origin, FixedLocation};
use portal_core::symptoms::{Language, SymptomChecker};
use portal_core::views::Mount;
use portal_core::{
    AuthState, ClinicLocator, Coordinate, Gateway, GatewayError, Identity, Notification,
    PatientPortal, PortalConfig, PortalError, ProfileField,
};

/// Header carrying the API key when one is configured.
pub const API_KEY_HEADER: &str = "x-api-key";
/// Header carrying the signed-in identity, as established by the hosted identity provider.
pub const USER_HEADER: &str = "x-user-id";

/// Application state for the REST API server
///
/// Shared by every request handler. Views are never shared: each request builds its own.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<PortalConfig>,
    gateway: Arc<dyn Gateway>,
    api_key: Option<String>,
    symptoms: SymptomChecker,
}

impl AppState {
    pub fn new(cfg: PortalConfig, gateway: Arc<dyn Gateway>, api_key: Option<String>) -> Self {
        let symptoms = SymptomChecker::new(cfg.symptom_delay());
        Self {
            cfg: Arc::new(cfg),
            gateway,
            api_key,
            symptoms,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_clinics,
        portal_overview,
        list_records,
        create_record,
        get_profile,
        update_profile,
        analyze_symptoms,
    ),
    components(schemas(
        HealthRes,
        NotificationRes,
        ClinicCardRes,
        MarkerRes,
        CameraFitRes,
        ClinicListRes,
        HealthRecordRes,
        RecordListRes,
        CreateRecordReq,
        OverviewRes,
        ProfileDto,
        ProfileRes,
        UpdateProfileReq,
        AnalyzeReq,
        ConditionRes,
        AssessmentRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/clinics", get(list_clinics))
        .route("/portal/overview", get(portal_overview))
        .route("/portal/records", get(list_records).post(create_record))
        .route("/portal/profile", get(get_profile).patch(update_profile))
        .route("/symptoms/analyze", post(analyze_symptoms))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// # Returns
/// * `Json<HealthRes>` - Health status response containing service status
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[derive(Debug, Default, Deserialize)]
struct ClinicsQuery {
    q: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[utoipa::path(
    get,
    path = "/clinics",
    params(
        ("q" = Option<String>, Query, description = "Search text matched against name, address and services"),
        ("lat" = Option<f64>, Query, description = "Detected latitude of the visitor"),
        ("lon" = Option<f64>, Query, description = "Detected longitude of the visitor"),
    ),
    responses(
        (status = 200, description = "Clinic listing with distances and map markers", body = ClinicListRes),
        (status = 400, description = "Bad request")
    )
)]
/// Clinic locator listing
///
/// Loads every clinic, filters by `q` and measures distances from the visitor's origin:
/// the configured override, else the detected `lat`/`lon`, else the default city centre.
/// A failed load answers `200` with an empty listing and an error notification.
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - only one of `lat` and `lon` is given, or
/// - the coordinates are out of range.
#[axum::debug_handler]
async fn list_clinics(
    State(state): State<AppState>,
    Query(query): Query<ClinicsQuery>,
) -> Result<Json<ClinicListRes>, (StatusCode, &'static str)> {
    let detected = match (query.lat, query.lon) {
        (Some(lat), Some(lon)) => match Coordinate::new(lat, lon) {
            Ok(position) => Some(position),
            Err(e) => {
                tracing::error!("Invalid origin: {:?}", e);
                return Err((StatusCode::BAD_REQUEST, "Invalid origin coordinates"));
            }
        },
        (None, None) => None,
        _ => return Err((StatusCode::BAD_REQUEST, "lat and lon must be given together")),
    };
    let origin = resolve_origin(state.cfg.origin_override(), &FixedLocation(detected));

    let mut locator = ClinicLocator::new(origin);
    locator.load(state.gateway.as_ref()).await;
    locator.set_query(query.q.unwrap_or_default());
    locator.search();
    let scene = locator.map_scene(state.cfg.map());
    Ok(Json(ClinicListRes::from_locator(&mut locator, scene)))
}

#[utoipa::path(
    get,
    path = "/portal/overview",
    params(
        ("x-user-id" = String, Header, description = "Signed-in identity"),
    ),
    responses(
        (status = 200, description = "Overview of the caller's records and profile", body = OverviewRes),
        (status = 303, description = "No identity; redirect to sign-in"),
        (status = 401, description = "Invalid API key")
    )
)]
/// Portal overview tab
///
/// Runs the portal's activation loaders (profile and records, concurrently) and summarises
/// them.
#[axum::debug_handler]
async fn portal_overview(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<OverviewRes>, Response> {
    let mut portal = mount_portal(&state, &headers)?;
    portal.activate(state.gateway.as_ref()).await;
    let notifications = portal.take_notifications();
    Ok(Json(OverviewRes::new(portal.overview(), notifications)))
}

#[utoipa::path(
    get,
    path = "/portal/records",
    params(
        ("x-user-id" = String, Header, description = "Signed-in identity"),
    ),
    responses(
        (status = 200, description = "The caller's health records, newest first", body = RecordListRes),
        (status = 303, description = "No identity; redirect to sign-in"),
        (status = 401, description = "Invalid API key")
    )
)]
#[axum::debug_handler]
async fn list_records(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RecordListRes>, Response> {
    let mut portal = mount_portal(&state, &headers)?;
    portal.load_records(state.gateway.as_ref()).await;
    Ok(Json(record_list(&mut portal)))
}

#[utoipa::path(
    post,
    path = "/portal/records",
    params(
        ("x-user-id" = String, Header, description = "Signed-in identity"),
    ),
    request_body = CreateRecordReq,
    responses(
        (status = 201, description = "Record added; the reloaded record list", body = RecordListRes),
        (status = 400, description = "Missing or malformed fields", body = [NotificationRes]),
        (status = 502, description = "The remote store refused the insert", body = [NotificationRes])
    )
)]
/// Add a health record
///
/// Fills the record composer from the request body and submits it.
///
/// # Errors
/// Returns `400 Bad Request` when record type, title or date is missing or malformed, and
/// `502 Bad Gateway` when the remote store rejects the insert. The body lists the
/// notifications raised.
#[axum::debug_handler]
async fn create_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateRecordReq>,
) -> Result<(StatusCode, Json<RecordListRes>), Response> {
    let mut portal = mount_portal(&state, &headers)?;
    portal.open_composer();
    req.fill(portal.form_mut());

    match portal.submit_record(state.gateway.as_ref()).await {
        Ok(()) => Ok((StatusCode::CREATED, Json(record_list(&mut portal)))),
        Err(e) => {
            tracing::error!("Add record error: {:?}", e);
            Err(mutation_error(&e, portal.take_notifications()))
        }
    }
}

#[utoipa::path(
    get,
    path = "/portal/profile",
    params(
        ("x-user-id" = String, Header, description = "Signed-in identity"),
    ),
    responses(
        (status = 200, description = "The caller's profile, if one is stored", body = ProfileRes),
        (status = 303, description = "No identity; redirect to sign-in"),
        (status = 401, description = "Invalid API key")
    )
)]
#[axum::debug_handler]
async fn get_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ProfileRes>, Response> {
    let mut portal = mount_portal(&state, &headers)?;
    portal.load_profile(state.gateway.as_ref()).await;
    Ok(Json(profile_res(&mut portal)))
}

#[utoipa::path(
    patch,
    path = "/portal/profile",
    params(
        ("x-user-id" = String, Header, description = "Signed-in identity"),
    ),
    request_body = UpdateProfileReq,
    responses(
        (status = 200, description = "Profile updated; the reloaded profile", body = ProfileRes),
        (status = 400, description = "Unknown field or malformed value", body = [NotificationRes]),
        (status = 404, description = "No profile stored for the caller", body = [NotificationRes]),
        (status = 409, description = "The profile changed since it was loaded", body = [NotificationRes]),
        (status = 502, description = "The remote store refused the update", body = [NotificationRes])
    )
)]
/// Update profile fields
///
/// Loads the caller's profile, buffers every field of the request and saves them in one
/// guarded write.
///
/// # Errors
/// Returns `400 Bad Request` for an unknown, read-only or malformed field, `404 Not Found`
/// when no profile is stored, `409 Conflict` when the stored profile changed after it was
/// loaded, and `502 Bad Gateway` when the remote store rejects the write.
#[axum::debug_handler]
async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UpdateProfileReq>,
) -> Result<Json<ProfileRes>, Response> {
    let mut portal = mount_portal(&state, &headers)?;
    portal.load_profile(state.gateway.as_ref()).await;

    for (name, value) in req.fields {
        let staged = name
            .parse::<ProfileField>()
            .and_then(|field| portal.edit_profile(field, value));
        if let Err(e) = staged {
            tracing::error!("Update profile error: {:?}", e);
            let mut notifications = portal.take_notifications();
            notifications.push(Notification::error("Error updating profile", e.to_string()));
            return Err(mutation_error(&e, notifications));
        }
    }

    match portal.save_profile(state.gateway.as_ref()).await {
        Ok(()) => Ok(Json(profile_res(&mut portal))),
        Err(e) => {
            tracing::error!("Update profile error: {:?}", e);
            Err(mutation_error(&e, portal.take_notifications()))
        }
    }
}

#[utoipa::path(
    post,
    path = "/symptoms/analyze",
    request_body = AnalyzeReq,
    responses(
        (status = 200, description = "Simulated assessment", body = AssessmentRes),
        (status = 400, description = "Bad request")
    )
)]
/// Symptom checker
///
/// Returns the simulated assessment after the configured delay. No real inference happens.
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - the description is blank, or
/// - the language is not one of `english`, `kiswahili` or `sheng`.
#[axum::debug_handler]
async fn analyze_symptoms(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeReq>,
) -> Result<Json<AssessmentRes>, (StatusCode, &'static str)> {
    let language = match req.language.as_deref() {
        None => Language::default(),
        Some(name) => match name.parse::<Language>() {
            Ok(language) => language,
            Err(e) => {
                tracing::error!("Analyze symptoms error: {:?}", e);
                return Err((StatusCode::BAD_REQUEST, "Unknown language"));
            }
        },
    };

    match state.symptoms.analyze(&req.symptoms, language).await {
        Ok(assessment) => Ok(Json(assessment.into())),
        Err(PortalError::EmptySymptoms) => {
            Err((StatusCode::BAD_REQUEST, "Please describe your symptoms"))
        }
        Err(e) => {
            tracing::error!("Analyze symptoms error: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
    }
}

// ====================
// Helpers
// ====================

/// Checks the API key and gates the portal on the identity header.
///
/// A request without an identity is redirected to the sign-in path.
#[allow(clippy::result_large_err)]
fn mount_portal(state: &AppState, headers: &HeaderMap) -> Result<PatientPortal, Response> {
    let provided = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    if let Err(e) = validate_api_key(provided, state.api_key.as_deref()) {
        tracing::error!("Rejected portal request: {e}");
        return Err((StatusCode::UNAUTHORIZED, "Invalid API key").into_response());
    }

    let auth = match headers.get(USER_HEADER) {
        None => AuthState::SignedOut,
        Some(value) => match value.to_str().ok().and_then(|s| Uuid::parse_str(s.trim()).ok()) {
            Some(id) => AuthState::SignedIn(Identity { id, email: None }),
            None => {
                return Err((StatusCode::BAD_REQUEST, "Invalid x-user-id header").into_response())
            }
        },
    };

    match PatientPortal::mount(&auth, state.cfg.sign_in_path()) {
        Mount::Ready(portal) => Ok(portal),
        Mount::Redirect(to) => Err(Redirect::to(&to).into_response()),
        Mount::Loading(message) => Err((StatusCode::SERVICE_UNAVAILABLE, message).into_response()),
    }
}

fn mutation_error(err: &PortalError, notifications: Vec<Notification>) -> Response {
    let status = match err {
        PortalError::Gateway(GatewayError::Conflict { .. }) => StatusCode::CONFLICT,
        PortalError::Gateway(_) => StatusCode::BAD_GATEWAY,
        PortalError::ProfileNotLoaded => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_REQUEST,
    };
    (status, Json(notifications_res(notifications))).into_response()
}

fn record_list(portal: &mut PatientPortal) -> RecordListRes {
    RecordListRes {
        records: portal.records().iter().map(HealthRecordRes::from).collect(),
        notifications: notifications_res(portal.take_notifications()),
    }
}

fn profile_res(portal: &mut PatientPortal) -> ProfileRes {
    ProfileRes {
        profile: portal.profile().map(ProfileDto::from),
        notifications: notifications_res(portal.take_notifications()),
    }
}
