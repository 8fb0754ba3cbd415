//! HTTP surface
//!
//! Routes for the cascading location selects, captcha issue, search, record
//! detail and the document-generation stub. Status codes are the contract:
//! 400 for malformed ids and validation failures (with per-field detail),
//! 404 for missing point lookups, 500 with a generic message for faults.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use crate::captcha::{CaptchaChallenge, CaptchaStore};
use crate::config::ServerConfig;
use crate::error::{FieldViolation, LandRecordError};
use crate::models::{
    District, LandRecord, SearchOutcome, SearchRequest, State as IndianState,
    Taluka, Village,
};
use crate::repository::{LandRecordRepository, LocationRepository, SearchRequestRepository};
use crate::service::SearchService;

// ============================================================================
// STATE
// ============================================================================

/// Shared handles for every handler
#[derive(Clone)]
pub struct AppState {
    pub locations: Arc<dyn LocationRepository>,
    pub records: Arc<dyn LandRecordRepository>,
    pub audit: Arc<dyn SearchRequestRepository>,
    pub search: Arc<SearchService>,
    pub captchas: Arc<CaptchaStore>,
}

// ============================================================================
// ERRORS
// ============================================================================

/// JSON error body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldViolation>>,
}

/// An error ready to be sent to the client
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    fn new(status: StatusCode, error: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.to_string(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// 400 for a path id that is not a positive integer
    pub fn invalid_id(entity: &str, raw: &str) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "invalid_id",
            format!("Invalid {entity} ID: {raw}"),
        )
    }

    /// 404 for a point lookup that found nothing
    pub fn not_found(entity: &str, id: u64) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("{entity} {id} not found"),
        )
    }

    /// 500 without internal detail
    pub fn internal(message: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<LandRecordError> for ApiError {
    fn from(err: LandRecordError) -> Self {
        match err {
            LandRecordError::Validation(errors) => Self {
                status: StatusCode::BAD_REQUEST,
                body: ErrorBody {
                    error: "validation_failed".to_string(),
                    message: "Validation failed".to_string(),
                    details: Some(errors.violations),
                },
            },
            LandRecordError::NotFound { entity, id } => Self::not_found(entity, id),
            LandRecordError::Search(_) => Self::internal("Search failed"),
            other => {
                error!(error = %other, "Request failed");
                Self::internal("Internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "Malformed request body");
        Self::new(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn parse_id(entity: &str, raw: &str) -> ApiResult<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ApiError::invalid_id(entity, raw))
}

/// Listing faults report what failed, never why.
fn listing_fault(what: &str) -> impl FnOnce(LandRecordError) -> ApiError + '_ {
    move |e| {
        error!(error = %e, "Failed to fetch {}", what);
        ApiError::internal(&format!("Failed to fetch {what}"))
    }
}

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateDocumentRequest {
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDocumentResponse {
    pub document_url: String,
    pub generated_at: DateTime<Utc>,
    pub language: String,
}

// ============================================================================
// HANDLERS
// ============================================================================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn list_states(State(app): State<AppState>) -> ApiResult<Json<Vec<IndianState>>> {
    let states = app.locations.list_states().await.map_err(listing_fault("states"))?;
    Ok(Json(states))
}

async fn get_state(
    State(app): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<Json<IndianState>> {
    let id = parse_id("state", &raw)?;
    app.locations
        .state(id)
        .await
        .map_err(listing_fault("state"))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("state", id))
}

async fn list_districts(
    State(app): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<Json<Vec<District>>> {
    let state_id = parse_id("state", &raw)?;
    let districts = app
        .locations
        .list_districts(state_id)
        .await
        .map_err(listing_fault("districts"))?;
    Ok(Json(districts))
}

async fn get_district(
    State(app): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<Json<District>> {
    let id = parse_id("district", &raw)?;
    app.locations
        .district(id)
        .await
        .map_err(listing_fault("district"))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("district", id))
}

async fn list_talukas(
    State(app): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<Json<Vec<Taluka>>> {
    let district_id = parse_id("district", &raw)?;
    let talukas = app
        .locations
        .list_talukas(district_id)
        .await
        .map_err(listing_fault("talukas"))?;
    Ok(Json(talukas))
}

async fn get_taluka(
    State(app): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<Json<Taluka>> {
    let id = parse_id("taluka", &raw)?;
    app.locations
        .taluka(id)
        .await
        .map_err(listing_fault("taluka"))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("taluka", id))
}

async fn list_villages(
    State(app): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<Json<Vec<Village>>> {
    let taluka_id = parse_id("taluka", &raw)?;
    let villages = app
        .locations
        .list_villages(taluka_id)
        .await
        .map_err(listing_fault("villages"))?;
    Ok(Json(villages))
}

async fn get_village(
    State(app): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<Json<Village>> {
    let id = parse_id("village", &raw)?;
    app.locations
        .village(id)
        .await
        .map_err(listing_fault("village"))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("village", id))
}

async fn issue_captcha(State(app): State<AppState>) -> Json<CaptchaChallenge> {
    app.search.metrics().record_captcha_issued();
    let challenge = app.captchas.issue();
    debug!(outstanding = app.captchas.outstanding(), "Captcha issued");
    Json(challenge)
}

async fn search_land_records(
    State(app): State<AppState>,
    payload: std::result::Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<Json<SearchOutcome>> {
    let Json(body) = payload?;
    let outcome = app.search.search_json(&body).await?;
    Ok(Json(outcome))
}

async fn get_land_record(
    State(app): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<Json<LandRecord>> {
    let id = parse_id("record", &raw)?;
    app.records
        .land_record(id)
        .await
        .map_err(listing_fault("land record"))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("land record", id))
}

async fn get_search_request(
    State(app): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<Json<SearchRequest>> {
    let id = parse_id("search request", &raw)?;
    app.audit
        .get(id)
        .await
        .map_err(listing_fault("search request"))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("search request", id))
}

async fn generate_document(
    State(app): State<AppState>,
    Path(raw): Path<String>,
    payload: Option<Json<GenerateDocumentRequest>>,
) -> ApiResult<Json<GenerateDocumentResponse>> {
    let record_id = parse_id("record", &raw)?;
    let request = payload.map(|Json(body)| body).unwrap_or_default();

    // Rendering is not implemented; the URL is where the document would live.
    if app
        .records
        .land_record(record_id)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to generate document");
            ApiError::internal("Failed to generate document")
        })?
        .is_none()
    {
        return Err(ApiError::not_found("land record", record_id));
    }

    Ok(Json(GenerateDocumentResponse {
        document_url: format!("/documents/{record_id}.pdf"),
        generated_at: Utc::now(),
        language: request
            .language
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| "english".to_string()),
    }))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Routes without any prefix or middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/states", get(list_states))
        .route("/states/:id", get(get_state))
        .route("/states/:id/districts", get(list_districts))
        .route("/districts/:id", get(get_district))
        .route("/districts/:id/talukas", get(list_talukas))
        .route("/talukas/:id", get(get_taluka))
        .route("/talukas/:id/villages", get(list_villages))
        .route("/villages/:id", get(get_village))
        .route("/captcha", get(issue_captcha))
        .route("/search-land-records", post(search_land_records))
        .route("/land-records/:id", get(get_land_record))
        .route("/search-requests/:id", get(get_search_request))
        .route("/generate-document/:id", post(generate_document))
        .with_state(state)
}

/// Routes mounted under the configured base path, wrapped in tracing, CORS
/// and request timeout layers.
pub fn app(state: AppState, server: &ServerConfig) -> Router {
    let routes = router(state);
    let base_path = server.base_path.trim_end_matches('/');
    let routes = if base_path.is_empty() {
        routes
    } else {
        Router::new().nest(base_path, routes)
    };

    routes
        .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout_secs)))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("state", "14").unwrap(), 14);
        assert_eq!(parse_id("state", "abc").unwrap_err().status(), StatusCode::BAD_REQUEST);
        assert_eq!(parse_id("state", "-1").unwrap_err().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_errors_hide_detail() {
        let err: ApiError = LandRecordError::Storage("secret path /var/db".to_string()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.body.message.contains("secret"));
    }
}
