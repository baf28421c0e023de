//! # API REST
//!
//! REST API implementation for the EHR backend.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status mapping)
//!
//! Uses `api-shared` for wire envelopes and `ehr-core` for every record operation.

#![warn(rust_2018_idioms)]

pub mod error;

pub use error::ApiError;

use api_shared::{EhrRes, ErrorRes, HealthRes, HealthService, MessageRes};
use axum::{
    extract::{rejection::JsonRejection, Path as AxumPath, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use ehr_core::{fhir_bundle, EhrRecord, RecordDraft, RecordService};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub const DEFAULT_PORT: &str = "5000";

/// Application state for the REST API server
///
/// Contains shared state that needs to be accessible to all request handlers.
#[derive(Clone)]
pub struct AppState {
    service: RecordService,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        create_ehr,
        list_ehrs,
        get_ehr_by_patient_id,
        update_ehr,
        delete_ehr,
        get_ehr_by_id,
        export_fhir,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        MessageRes,
        EhrRes,
        EhrRecord,
        RecordDraft,
        ehr_core::ClinicalContent,
        ehr_core::PatientInfo,
        ehr_core::HumanName,
        ehr_core::Gender,
        ehr_core::ContactPoint,
        ehr_core::Address,
        ehr_core::Encounter,
        ehr_core::Coding,
        ehr_core::Practitioner,
        ehr_core::Period,
        ehr_core::Condition,
        ehr_core::Observation,
        ehr_core::Medication,
        ehr_core::CarePlan,
        ehr_core::ClinicalEntity,
        ehr_core::Vitals,
    ))
)]
pub struct ApiDoc;

/// Builds the application router over `service`.
pub fn router(service: RecordService) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/health", get(health))
        .route("/api/ehr", get(list_ehrs).post(create_ehr))
        .route(
            "/api/ehr/:key",
            get(get_ehr_by_patient_id).put(update_ehr).delete(delete_ehr),
        )
        .route("/api/ehr/by-id/:id", get(get_ehr_by_id))
        .route("/api/ehr/by-id/:id/fhir", get(export_fhir))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Resolves the bind address.
///
/// `EHR_REST_ADDR` wins when set; otherwise `0.0.0.0:<PORT>` with `PORT` defaulting to 5000.
pub fn rest_addr_from_env(rest_addr: Option<String>, port: Option<String>) -> String {
    if let Some(addr) = rest_addr.filter(|a| !a.trim().is_empty()) {
        return addr;
    }
    let port = port
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PORT.into());
    format!("0.0.0.0:{}", port.trim())
}

/// Binds `addr` and serves the API until the process stops.
///
/// # Errors
/// Returns an error if the address cannot be bound or the HTTP server fails while running.
pub async fn serve(addr: &str, service: RecordService) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("-- Starting EHR REST API on {}", listener.local_addr()?);
    serve_on(listener, service).await
}

/// Serves the API on an already bound listener.
pub async fn serve_on(listener: tokio::net::TcpListener, service: RecordService) -> anyhow::Result<()> {
    axum::serve(listener, router(service)).await?;
    Ok(())
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
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/api/ehr",
    request_body = RecordDraft,
    responses(
        (status = 201, description = "Record stored", body = EhrRes),
        (status = 400, description = "Body is not JSON", body = ErrorRes),
        (status = 500, description = "Validation or storage failure", body = ErrorRes)
    )
)]
/// Store a new EHR record
///
/// `patientId` and `summary` are required. The identifier and `createdAt` are assigned by the
/// server; any supplied values are ignored.
///
/// # Errors
/// Returns `500 Internal Server Error` with `{error}` if:
/// - a required field is missing or blank, or
/// - the record cannot be stored.
#[axum::debug_handler]
async fn create_ehr(
    State(state): State<AppState>,
    body: Result<Json<RecordDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<EhrRes>), ApiError> {
    let Json(draft) = body?;
    let record = state.service.create(draft)?;
    Ok((StatusCode::CREATED, Json(EhrRes::stored(record))))
}

#[utoipa::path(
    get,
    path = "/api/ehr",
    responses(
        (status = 200, description = "All records, newest first", body = [EhrRecord]),
        (status = 500, description = "Storage failure", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn list_ehrs(State(state): State<AppState>) -> Result<Json<Vec<EhrRecord>>, ApiError> {
    Ok(Json(state.service.list_all()?))
}

#[utoipa::path(
    get,
    path = "/api/ehr/{patient_id}",
    params(("patient_id" = String, Path, description = "Exact patient identifier")),
    responses(
        (status = 200, description = "First record for the patient", body = EhrRecord),
        (status = 404, description = "No record for the patient", body = MessageRes),
        (status = 500, description = "Storage failure", body = ErrorRes)
    )
)]
/// Fetch a record by patient identifier
///
/// Exact match only. When a patient has several records the earliest one is returned.
#[axum::debug_handler]
async fn get_ehr_by_patient_id(
    State(state): State<AppState>,
    AxumPath(patient_id): AxumPath<String>,
) -> Result<Json<EhrRecord>, ApiError> {
    Ok(Json(state.service.get_by_patient_id(&patient_id)?))
}

#[utoipa::path(
    put,
    path = "/api/ehr/{id}",
    request_body = RecordDraft,
    params(("id" = String, Path, description = "Record identifier")),
    responses(
        (status = 200, description = "Record replaced", body = EhrRes),
        (status = 404, description = "Unknown record", body = MessageRes),
        (status = 500, description = "Validation or storage failure", body = ErrorRes)
    )
)]
/// Replace a record
///
/// The whole document is replaced: fields missing from the body are cleared. The identifier
/// and `createdAt` never change.
#[axum::debug_handler]
async fn update_ehr(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    body: Result<Json<RecordDraft>, JsonRejection>,
) -> Result<Json<EhrRes>, ApiError> {
    let Json(draft) = body?;
    let record = state.service.update_by_id(&id, draft)?;
    Ok(Json(EhrRes::updated(record)))
}

#[utoipa::path(
    delete,
    path = "/api/ehr/{id}",
    params(("id" = String, Path, description = "Record identifier")),
    responses(
        (status = 200, description = "Record deleted", body = EhrRes),
        (status = 404, description = "Unknown record", body = MessageRes),
        (status = 500, description = "Storage failure", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn delete_ehr(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<EhrRes>, ApiError> {
    let record = state.service.delete_by_id(&id)?;
    Ok(Json(EhrRes::deleted(record)))
}

#[utoipa::path(
    get,
    path = "/api/ehr/by-id/{id}",
    params(("id" = String, Path, description = "Record identifier")),
    responses(
        (status = 200, description = "The record", body = EhrRecord),
        (status = 404, description = "Unknown record", body = MessageRes)
    )
)]
#[axum::debug_handler]
async fn get_ehr_by_id(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<EhrRecord>, ApiError> {
    Ok(Json(state.service.get_by_id(&id)?))
}

#[utoipa::path(
    get,
    path = "/api/ehr/by-id/{id}/fhir",
    params(("id" = String, Path, description = "Record identifier")),
    responses(
        (status = 200, description = "FHIR collection Bundle", body = Object),
        (status = 404, description = "Unknown record", body = MessageRes)
    )
)]
/// Export a record as a FHIR `collection` Bundle
#[axum::debug_handler]
async fn export_fhir(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let record = state.service.get_by_id(&id)?;
    Ok(Json(fhir_bundle(&record)))
}
