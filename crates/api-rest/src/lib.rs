//! # API REST
//!
//! REST API implementation for the clinic service.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - Request authentication (`x-api-key` and `x-user-id` headers)
//!
//! Uses `api-shared` for wire types and `clinic-core` for all data operations.

#![warn(rust_2018_idioms)]

pub mod error;

use api_shared::auth::{API_KEY_HEADER, USER_ID_HEADER};
use api_shared::dto::{
    DiagnosisRes, ExaminationReq, HealthRes, IntakeReq, ListDiagnosesRes, ListPatientsRes,
    ListPrescriptionsRes, MedicineItemReq, PatientRes, PrescriptionDetailRes,
    PrescriptionItemRes, PrescriptionSummaryRes, StatusQuery, UpdateStatusReq, VisitRes,
};
use api_shared::{validate_api_key, HealthService};
use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::Json,
    routing::{get, post, put},
    Router,
};
use clinic_core::{
    resolve_principal, Action, ClinicError, ClinicResult, CoreConfig, ExaminationInput,
    FulfilmentService, PatientRef, PatientService, PrescriptionStatus, Principal, RecordId,
    VisitService,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use error::{ApiError, ErrorBody};

/// Application state for the REST API server
///
/// Holds the immutable configuration resolved at startup. Services are built per request from
/// the shared `CoreConfig`.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub api_key: Arc<str>,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>, api_key: impl Into<Arc<str>>) -> Self {
        Self {
            cfg,
            api_key: api_key.into(),
        }
    }
}

/// Resolve configuration from the environment and prepare the database.
///
/// Reads `CLINIC_DATABASE_PATH`, `CLINIC_PRESCRIPTION_PREFIX`, `CLINIC_BUSY_TIMEOUT_MS` and
/// `API_KEY`. Migrations run here so a broken database fails startup rather than the first
/// request.
///
/// # Errors
///
/// Returns an error if `API_KEY` is unset or empty, a value is malformed, or the database
/// cannot be opened and migrated.
pub fn state_from_env() -> anyhow::Result<AppState> {
    let cfg = CoreConfig::from_env_values(
        std::env::var("CLINIC_DATABASE_PATH").ok(),
        std::env::var("CLINIC_PRESCRIPTION_PREFIX").ok(),
        std::env::var("CLINIC_BUSY_TIMEOUT_MS").ok(),
    )?;

    let api_key = std::env::var("API_KEY").unwrap_or_default();
    if api_key.trim().is_empty() {
        anyhow::bail!("API_KEY must be set");
    }

    clinic_core::db::open_database(&cfg)?;
    tracing::info!(
        "Using database {} (schema v{})",
        cfg.database_path().display(),
        clinic_core::db::latest_version()
    );

    Ok(AppState::new(Arc::new(cfg), api_key))
}

/// Run a store operation on the blocking pool.
///
/// SQLite calls may wait up to the configured busy timeout, which must not stall an async worker.
async fn run_blocking<T, F>(op: F) -> Result<T, ApiError>
where
    F: FnOnce() -> ClinicResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| ApiError::Internal(format!("store task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// The authenticated staff member making a request.
///
/// Extraction checks the service key, resolves `x-user-id` against profiles and role grants,
/// and requires at least one staff role. Finer checks (examine, dispense) happen in the core
/// services.
pub struct Staff(pub Principal);

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

#[async_trait]
impl FromRequestParts<AppState> for Staff {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        validate_api_key(header(parts, API_KEY_HEADER), &state.api_key)?;
        let user_id = header(parts, USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {} header", USER_ID_HEADER)))?
            .to_string();

        let cfg = state.cfg.clone();
        let principal = run_blocking(move || resolve_principal(&cfg, &user_id)).await?;
        principal.authorise(Action::Operate)?;
        Ok(Staff(principal))
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        intake_patient,
        list_patients,
        get_patient,
        update_patient_status,
        list_patient_diagnoses,
        record_examination,
        list_prescriptions,
        get_prescription,
        start_preparing,
        mark_ready,
    ),
    components(schemas(
        HealthRes,
        IntakeReq,
        PatientRes,
        ListPatientsRes,
        UpdateStatusReq,
        DiagnosisRes,
        ListDiagnosesRes,
        MedicineItemReq,
        ExaminationReq,
        VisitRes,
        PrescriptionItemRes,
        PrescriptionDetailRes,
        PrescriptionSummaryRes,
        ListPrescriptionsRes,
        error::ErrorBody,
        error::ErrorDetail,
    ))
)]
pub struct ApiDoc;

/// Build the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients", get(list_patients).post(intake_patient))
        .route("/patients/:id", get(get_patient))
        .route("/patients/:id/status", put(update_patient_status))
        .route("/patients/:id/diagnoses", get(list_patient_diagnoses))
        .route("/examinations", post(record_examination))
        .route("/prescriptions", get(list_prescriptions))
        .route("/prescriptions/:number", get(get_prescription))
        .route("/prescriptions/:number/preparing", post(start_preparing))
        .route("/prescriptions/:number/ready", post(mark_ready))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn parse_id(id: &str) -> Result<RecordId, ApiError> {
    RecordId::parse(id.trim()).map_err(|e| ClinicError::from(e).into())
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
/// Used for monitoring and load balancer health checks. Requires no authentication.
#[axum::debug_handler(state = AppState)]
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = IntakeReq,
    responses(
        (status = 201, description = "Patient registered with status waiting", body = PatientRes),
        (status = 400, description = "Bad request", body = ErrorBody),
        (status = 401, description = "Unauthenticated", body = ErrorBody),
        (status = 403, description = "Forbidden", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
#[axum::debug_handler(state = AppState)]
async fn intake_patient(
    State(state): State<AppState>,
    Staff(_staff): Staff,
    Json(req): Json<IntakeReq>,
) -> Result<(StatusCode, Json<PatientRes>), ApiError> {
    let new_patient = req.into_new_patient()?;
    let patient =
        run_blocking(move || PatientService::new(state.cfg).intake(new_patient)).await?;
    Ok((StatusCode::CREATED, Json(patient.into())))
}

#[utoipa::path(
    get,
    path = "/patients",
    params(StatusQuery),
    responses(
        (status = 200, description = "Patients in registration order", body = ListPatientsRes),
        (status = 401, description = "Unauthenticated", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
#[axum::debug_handler(state = AppState)]
async fn list_patients(
    State(state): State<AppState>,
    Staff(_staff): Staff,
    Query(query): Query<StatusQuery>,
) -> Result<Json<ListPatientsRes>, ApiError> {
    let patients =
        run_blocking(move || PatientService::new(state.cfg).list(query.status.as_deref())).await?;
    Ok(Json(ListPatientsRes {
        patients: patients.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient", body = PatientRes),
        (status = 400, description = "Malformed id", body = ErrorBody),
        (status = 404, description = "Unknown patient", body = ErrorBody)
    )
)]
#[axum::debug_handler(state = AppState)]
async fn get_patient(
    State(state): State<AppState>,
    Staff(_staff): Staff,
    Path(id): Path<String>,
) -> Result<Json<PatientRes>, ApiError> {
    let id = parse_id(&id)?;
    let patient = run_blocking(move || PatientService::new(state.cfg).get(&id)).await?;
    Ok(Json(patient.into()))
}

#[utoipa::path(
    put,
    path = "/patients/{id}/status",
    params(("id" = String, Path, description = "Patient id")),
    request_body = UpdateStatusReq,
    responses(
        (status = 200, description = "Updated patient", body = PatientRes),
        (status = 400, description = "Blank status or malformed id", body = ErrorBody),
        (status = 404, description = "Unknown patient", body = ErrorBody)
    )
)]
#[axum::debug_handler(state = AppState)]
async fn update_patient_status(
    State(state): State<AppState>,
    Staff(_staff): Staff,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusReq>,
) -> Result<Json<PatientRes>, ApiError> {
    let id = parse_id(&id)?;
    let patient =
        run_blocking(move || PatientService::new(state.cfg).update_status(&id, &req.status))
            .await?;
    Ok(Json(patient.into()))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/diagnoses",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Diagnoses, oldest first", body = ListDiagnosesRes),
        (status = 404, description = "Unknown patient", body = ErrorBody)
    )
)]
#[axum::debug_handler(state = AppState)]
async fn list_patient_diagnoses(
    State(state): State<AppState>,
    Staff(_staff): Staff,
    Path(id): Path<String>,
) -> Result<Json<ListDiagnosesRes>, ApiError> {
    let id = parse_id(&id)?;
    let diagnoses =
        run_blocking(move || PatientService::new(state.cfg).diagnoses_for_patient(&id)).await?;
    Ok(Json(ListDiagnosesRes {
        diagnoses: diagnoses.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/examinations",
    request_body = ExaminationReq,
    responses(
        (status = 201, description = "Visit recorded", body = VisitRes),
        (status = 200, description = "Submission key already recorded; original visit returned", body = VisitRes),
        (status = 400, description = "Blank diagnosis or invalid item", body = ErrorBody),
        (status = 403, description = "Caller may not record examinations", body = ErrorBody),
        (status = 404, description = "Unknown patient", body = ErrorBody),
        (status = 500, description = "Internal server error; nothing was written", body = ErrorBody)
    )
)]
/// Record an examination
///
/// Writes the patient, diagnosis and (when items are given) the prescription and its items in
/// one transaction. The doctor is the authenticated caller.
#[axum::debug_handler(state = AppState)]
async fn record_examination(
    State(state): State<AppState>,
    Staff(doctor): Staff,
    Json(req): Json<ExaminationReq>,
) -> Result<(StatusCode, Json<VisitRes>), ApiError> {
    let patient = match (req.patient_id, req.new_patient) {
        (Some(id), None) => PatientRef::Existing(parse_id(&id)?),
        (None, Some(new_patient)) => PatientRef::New(new_patient.into_new_patient()?),
        _ => {
            return Err(ApiError::BadRequest(
                "exactly one of patient_id or new_patient is required".into(),
            ))
        }
    };

    let input = ExaminationInput {
        patient,
        diagnosis: req.diagnosis,
        symptoms: req.symptoms,
        notes: req.notes,
        items: req.items.into_iter().map(Into::into).collect(),
        submission_key: req.submission_key,
    };

    let record =
        run_blocking(move || VisitService::new(state.cfg).record_examination(&doctor, input))
            .await?;
    let status = if record.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(record.into())))
}

#[utoipa::path(
    get,
    path = "/prescriptions",
    params(StatusQuery),
    responses(
        (status = 200, description = "Pharmacist queue, newest first", body = ListPrescriptionsRes),
        (status = 400, description = "Unknown status filter", body = ErrorBody)
    )
)]
#[axum::debug_handler(state = AppState)]
async fn list_prescriptions(
    State(state): State<AppState>,
    Staff(_staff): Staff,
    Query(query): Query<StatusQuery>,
) -> Result<Json<ListPrescriptionsRes>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<PrescriptionStatus>)
        .transpose()?;
    let prescriptions =
        run_blocking(move || FulfilmentService::new(state.cfg).list_prescriptions(status)).await?;
    Ok(Json(ListPrescriptionsRes {
        prescriptions: prescriptions.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/prescriptions/{number}",
    params(("number" = String, Path, description = "Prescription number, e.g. R-20261016-0001")),
    responses(
        (status = 200, description = "Prescription with patient, diagnosis and items", body = PrescriptionDetailRes),
        (status = 404, description = "Unknown prescription", body = ErrorBody)
    )
)]
#[axum::debug_handler(state = AppState)]
async fn get_prescription(
    State(state): State<AppState>,
    Staff(_staff): Staff,
    Path(number): Path<String>,
) -> Result<Json<PrescriptionDetailRes>, ApiError> {
    let detail =
        run_blocking(move || FulfilmentService::new(state.cfg).prescription_detail(&number))
            .await?;
    Ok(Json(detail.into()))
}

#[utoipa::path(
    post,
    path = "/prescriptions/{number}/preparing",
    params(("number" = String, Path, description = "Prescription number")),
    responses(
        (status = 200, description = "Prescription is being prepared", body = PrescriptionDetailRes),
        (status = 403, description = "Caller may not dispense", body = ErrorBody),
        (status = 404, description = "Unknown prescription", body = ErrorBody),
        (status = 409, description = "Prescription is not pending", body = ErrorBody)
    )
)]
#[axum::debug_handler(state = AppState)]
async fn start_preparing(
    State(state): State<AppState>,
    Staff(pharmacist): Staff,
    Path(number): Path<String>,
) -> Result<Json<PrescriptionDetailRes>, ApiError> {
    let detail = run_blocking(move || {
        FulfilmentService::new(state.cfg).start_preparing(&pharmacist, &number)
    })
    .await?;
    Ok(Json(detail.into()))
}

#[utoipa::path(
    post,
    path = "/prescriptions/{number}/ready",
    params(("number" = String, Path, description = "Prescription number")),
    responses(
        (status = 200, description = "Prescription is ready for collection", body = PrescriptionDetailRes),
        (status = 403, description = "Caller may not dispense", body = ErrorBody),
        (status = 404, description = "Unknown prescription", body = ErrorBody),
        (status = 409, description = "Prescription is already ready", body = ErrorBody)
    )
)]
#[axum::debug_handler(state = AppState)]
async fn mark_ready(
    State(state): State<AppState>,
    Staff(pharmacist): Staff,
    Path(number): Path<String>,
) -> Result<Json<PrescriptionDetailRes>, ApiError> {
    let detail =
        run_blocking(move || FulfilmentService::new(state.cfg).mark_ready(&pharmacist, &number))
            .await?;
    Ok(Json(detail.into()))
}
