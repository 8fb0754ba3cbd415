//! HTTP tests driving the router with `tower::ServiceExt::oneshot`

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use land_record_search::api::{self, AppState};
use land_record_search::captcha::CaptchaStore;
use land_record_search::config::AppConfig;
use land_record_search::error::{LandRecordError, Result};
use land_record_search::models::{LandRecord, NewLandRecord};
use land_record_search::repository::{InMemoryRepository, LandRecordRepository, LocationRepository};
use land_record_search::seed;
use land_record_search::service::SearchService;

fn state_for(repo: Arc<InMemoryRepository>, records: Arc<dyn LandRecordRepository>) -> AppState {
    let captchas = Arc::new(CaptchaStore::new(5, 300));
    AppState {
        locations: repo.clone(),
        records: records.clone(),
        audit: repo.clone(),
        search: Arc::new(SearchService::new(records, repo)),
        captchas,
    }
}

async fn seeded_app() -> (Router, Arc<InMemoryRepository>) {
    let repo = Arc::new(seed::seeded_repository().await.unwrap());
    let state = state_for(repo.clone(), repo.clone());
    (api::app(state, &AppConfig::default().server), repo)
}

async fn juhu_id(repo: &InMemoryRepository) -> u64 {
    let state = repo.state_by_code("MH").await.unwrap().unwrap();
    let district = repo.district_by_code(state.id, "MUM").unwrap().unwrap();
    let taluka = repo.taluka_by_code(district.id, "AND").unwrap().unwrap();
    repo.village_by_code(taluka.id, "JUH").unwrap().unwrap().id
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn search_body(village_id: u64) -> Value {
    json!({
        "searchMode": "manual",
        "recordType": "7-12",
        "villageId": village_id,
        "surveyNumber": "123",
        "mobileNumber": "9876543210",
        "language": "english",
        "captcha": "A1B2C"
    })
}

#[tokio::test]
async fn test_health() {
    let (app, _) = seeded_app().await;
    let (status, body) = send(app, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_routes_live_under_base_path() {
    let (app, _) = seeded_app().await;
    let response = app.oneshot(get("/states")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_states() {
    let (app, _) = seeded_app().await;
    let (status, body) = send(app, get("/api/states")).await;
    assert_eq!(status, StatusCode::OK);
    let states = body.as_array().unwrap();
    assert_eq!(states.len(), 36);
    assert!(states[0]["nameEn"].is_string());
    assert!(states[0]["nameHi"].is_string());
}

#[tokio::test]
async fn test_cascading_lookups() {
    let (app, repo) = seeded_app().await;
    let mh = repo.state_by_code("MH").await.unwrap().unwrap();

    let (status, districts) = send(app.clone(), get(&format!("/api/states/{}/districts", mh.id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(districts.as_array().unwrap().len(), 5);

    let mumbai = districts
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["code"] == "MUM")
        .unwrap();
    let (status, talukas) = send(
        app.clone(),
        get(&format!("/api/districts/{}/talukas", mumbai["id"])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(talukas.as_array().unwrap().len(), 3);

    let andheri = talukas
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["code"] == "AND")
        .unwrap();
    let (status, villages) = send(app, get(&format!("/api/talukas/{}/villages", andheri["id"]))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(villages.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_unknown_parent_lists_empty() {
    let (app, _) = seeded_app().await;
    let (status, body) = send(app, get("/api/states/9999/districts")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    let (app, _) = seeded_app().await;
    let (status, body) = send(app, get("/api/states/abc/districts")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");
    assert!(body["message"].as_str().unwrap().contains("Invalid state ID"));
}

#[tokio::test]
async fn test_point_lookup_not_found() {
    let (app, _) = seeded_app().await;
    for uri in [
        "/api/states/9999",
        "/api/districts/9999",
        "/api/talukas/9999",
        "/api/villages/9999",
        "/api/land-records/9999",
        "/api/search-requests/9999",
    ] {
        let (status, body) = send(app.clone(), get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["error"], "not_found");
    }
}

#[tokio::test]
async fn test_captcha_issue() {
    let (app, _) = seeded_app().await;
    let (status, body) = send(app, get("/api/captcha")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["captcha"].as_str().unwrap().len(), 5);
    assert!(!body["captchaId"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_and_audit_row() {
    let (app, repo) = seeded_app().await;
    let village_id = juhu_id(&repo).await;

    let (status, body) = send(app.clone(), post_json("/api/search-land-records", &search_body(village_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["records"][0]["type"], "7-12");
    assert_eq!(body["records"][0]["propertyUid"], "12345678901");

    let id = body["searchRequestId"].as_u64().unwrap();
    let (status, row) = send(app, get(&format!("/api/search-requests/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(row["status"], "completed");
    assert_eq!(row["mobileNumber"], "9876543210");
}

#[tokio::test]
async fn test_search_validation_errors() {
    let (app, repo) = seeded_app().await;
    let mut body = search_body(juhu_id(&repo).await);
    body["mobileNumber"] = json!("12345");

    let (status, body) = send(app, post_json("/api/search-land-records", &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");
    let details = body["details"].as_array().unwrap();
    assert!(details.iter().any(|d| d["field"] == "mobileNumber"));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (app, _) = seeded_app().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/search-land-records")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_body");
}

#[tokio::test]
async fn test_wrongly_typed_field_reports_field() {
    let (app, _) = seeded_app().await;
    let mut payload = search_body(1);
    payload["villageId"] = json!("1");

    let (status, body) = send(app, post_json("/api/search-land-records", &payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");
    assert_eq!(body["details"][0]["field"], "villageId");
}

#[tokio::test]
async fn test_numeric_mobile_number_reports_field() {
    let (app, repo) = seeded_app().await;
    let mut payload = search_body(juhu_id(&repo).await);
    payload["mobileNumber"] = json!(9876543210_u64);

    let (status, body) = send(app, post_json("/api/search-land-records", &payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "mobileNumber");
}

/// Record store whose lookups always fault
struct FaultyRecords;

#[async_trait]
impl LandRecordRepository for FaultyRecords {
    async fn find_by_property_uid(&self, _uid: &str) -> Result<Option<LandRecord>> {
        Err(LandRecordError::Storage("connection reset".to_string()))
    }

    async fn find_by_village_and_survey(
        &self,
        _village_id: u64,
        _survey_number: &str,
        _subdivision_number: Option<&str>,
    ) -> Result<Vec<LandRecord>> {
        Err(LandRecordError::Storage("connection reset".to_string()))
    }

    async fn find_by_owner_in_village(
        &self,
        _village_id: u64,
        _owner_fragment: &str,
    ) -> Result<Vec<LandRecord>> {
        Err(LandRecordError::Storage("connection reset".to_string()))
    }

    async fn land_record(&self, _id: u64) -> Result<Option<LandRecord>> {
        Err(LandRecordError::Storage("connection reset".to_string()))
    }

    async fn insert(&self, _record: NewLandRecord) -> Result<LandRecord> {
        Err(LandRecordError::Storage("connection reset".to_string()))
    }
}

#[tokio::test]
async fn test_store_fault_is_generic_server_error() {
    let repo = Arc::new(seed::seeded_repository().await.unwrap());
    let village_id = juhu_id(&repo).await;
    let app = api::app(
        state_for(repo.clone(), Arc::new(FaultyRecords)),
        &AppConfig::default().server,
    );

    let (status, body) = send(app.clone(), post_json("/api/search-land-records", &search_body(village_id))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Search failed");
    assert!(!body.to_string().contains("connection reset"));

    let (status, row) = send(app, get("/api/search-requests/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(row["status"], "failed");
}

#[tokio::test]
async fn test_land_record_detail() {
    let (app, repo) = seeded_app().await;
    let record = repo.find_by_property_uid("12345678902").await.unwrap().unwrap();

    let (status, body) = send(app, get(&format!("/api/land-records/{}", record.id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["surveyNumber"], "124");
    assert_eq!(body["type"], "property-card");
}

#[tokio::test]
async fn test_generate_document() {
    let (app, repo) = seeded_app().await;
    let record = repo.find_by_property_uid("12345678901").await.unwrap().unwrap();

    let (status, body) = send(
        app.clone(),
        post_json(&format!("/api/generate-document/{}", record.id), &json!({"language": "marathi"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["documentUrl"], format!("/documents/{}.pdf", record.id));
    assert_eq!(body["language"], "marathi");
    assert!(body["generatedAt"].is_string());

    let (status, body) = send(app.clone(), post_json(&format!("/api/generate-document/{}", record.id), &json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["language"], "english");

    let (status, _) = send(app, post_json("/api/generate-document/9999", &json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
