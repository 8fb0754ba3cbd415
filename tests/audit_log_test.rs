//! Tests for the sled-backed search audit log

use std::sync::Arc;

use land_record_search::audit_log::SledSearchLog;
use land_record_search::error::LandRecordError;
use land_record_search::models::{LocationPath, NewSearchRequest, RawSearchRequest, RecordType, SearchStatus};
use land_record_search::repository::SearchRequestRepository;
use land_record_search::seed;
use land_record_search::service::SearchService;
use tempfile::TempDir;

fn open_log() -> (TempDir, SledSearchLog) {
    let dir = tempfile::tempdir().unwrap();
    let log = SledSearchLog::open(&dir.path().join("audit")).unwrap();
    (dir, log)
}

fn new_request(village_id: u64) -> NewSearchRequest {
    NewSearchRequest {
        mobile_number: "9123456780".to_string(),
        location: LocationPath {
            state_id: Some(14),
            district_id: Some(1),
            taluka_id: Some(1),
            village_id: Some(village_id),
        },
        survey_number: Some("123".to_string()),
        subdivision_number: Some("1".to_string()),
        owner_name: None,
        record_type: RecordType::Extract712,
        property_uid: None,
        language: "marathi".to_string(),
    }
}

#[tokio::test]
async fn test_new_rows_are_pending() {
    let (_dir, log) = open_log();
    let row = log.create(new_request(1)).await.unwrap();

    assert_eq!(row.status, SearchStatus::Pending);
    assert_eq!(row.village_id, Some(1));
    assert_eq!(log.get(row.id).await.unwrap().unwrap(), row);
}

#[tokio::test]
async fn test_ids_are_distinct() {
    let (_dir, log) = open_log();
    let first = log.create(new_request(1)).await.unwrap();
    let second = log.create(new_request(2)).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(log.len(), 2);
}

#[tokio::test]
async fn test_pending_to_failed() {
    let (_dir, log) = open_log();
    let row = log.create(new_request(1)).await.unwrap();
    let updated = log.update_status(row.id, SearchStatus::Failed).await.unwrap();
    assert_eq!(updated.status, SearchStatus::Failed);
}

#[tokio::test]
async fn test_terminal_status_is_final() {
    let (_dir, log) = open_log();
    let row = log.create(new_request(1)).await.unwrap();
    log.update_status(row.id, SearchStatus::Completed).await.unwrap();

    let err = log
        .update_status(row.id, SearchStatus::Failed)
        .await
        .unwrap_err();
    assert!(matches!(err, LandRecordError::InvalidTransition { .. }));
    assert_eq!(
        log.get(row.id).await.unwrap().unwrap().status,
        SearchStatus::Completed
    );
}

#[tokio::test]
async fn test_update_missing_row() {
    let (_dir, log) = open_log();
    let err = log
        .update_status(77, SearchStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, LandRecordError::NotFound { id: 77, .. }));
    assert!(log.get(77).await.unwrap().is_none());
}

#[tokio::test]
async fn test_service_writes_to_sled_log() {
    let (_dir, log) = open_log();
    let log = Arc::new(log);
    let repo = Arc::new(seed::seeded_repository().await.unwrap());
    let service = SearchService::new(repo, log.clone());

    let raw = RawSearchRequest {
        search_mode: Some("uid".to_string()),
        record_type: Some("7-12".to_string()),
        property_uid: Some("12345678901".to_string()),
        mobile_number: Some("9876543210".to_string()),
        language: Some("english".to_string()),
        captcha: Some("ZZ9Y8".to_string()),
        ..RawSearchRequest::default()
    };
    let outcome = service.search(&raw).await.unwrap();
    log.flush().await.unwrap();

    let row = log.get(outcome.search_request_id).await.unwrap().unwrap();
    assert_eq!(row.status, SearchStatus::Completed);
    assert_eq!(row.property_uid.as_deref(), Some("12345678901"));
}
