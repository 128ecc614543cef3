//! CRUD integration tests against a real Postgres database.
//!
//! These run with `cargo test -- --ignored` once `DATABASE_URL` points at a
//! disposable test database. The seed-based tests assume exclusive access
//! to the `soil_reports` table.

use chrono::Utc;
use configuration::{DatabaseSettings, RetrySettings};
use database::{ConnectionManager, Page, ReportFilter, SoilReportRepository, StoreError, fixtures, run_migrations};
use core_types::{NewSoilReport, SoilReportPatch};
use rust_decimal_macros::dec;
use std::sync::Arc;
use uuid::Uuid;

const NEEDS_DB: &str = "requires a live Postgres via DATABASE_URL";

async fn repository() -> SoilReportRepository {
    let manager = Arc::new(ConnectionManager::new(DatabaseSettings::default()));
    manager
        .connect()
        .await
        .expect("DATABASE_URL must point at a reachable test database");
    let pool = manager.pool().await.unwrap();
    run_migrations(&pool).await.unwrap();
    SoilReportRepository::new(manager, &RetrySettings::default())
}

fn wagholi_report() -> NewSoilReport {
    NewSoilReport {
        state: "Maharashtra".to_string(),
        district: "Pune".to_string(),
        village: "Wagholi".to_string(),
        ph: dec!(6.50),
        nitrogen: dec!(280.50),
        phosphorus: dec!(45.20),
        potassium: dec!(190.75),
    }
}

#[tokio::test]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn create_assigns_id_and_timestamp_and_round_trips() {
    let repo = repository().await;
    let issued_at = Utc::now();

    let created = repo.create(&wagholi_report()).await.unwrap();
    assert_eq!(created.state, "Maharashtra");
    assert_eq!(created.district, "Pune");
    assert_eq!(created.village, "Wagholi");
    assert_eq!(created.ph, dec!(6.50));
    assert_eq!(created.nitrogen, dec!(280.50));
    assert_eq!(created.phosphorus, dec!(45.20));
    assert_eq!(created.potassium, dec!(190.75));
    assert!(created.timestamp >= issued_at);

    let fetched = repo.find_by_id(created.id).await.unwrap();
    assert_eq!(fetched, created);

    repo.delete(created.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn invalid_create_persists_nothing() {
    let repo = repository().await;
    let marker = format!("village-{}", Uuid::new_v4());

    let mut payload = wagholi_report();
    payload.village = marker.clone();
    payload.ph = dec!(15);
    let err = repo.create(&payload).await.unwrap_err();
    match err {
        StoreError::Validation(v) => assert!(v.mentions("ph")),
        other => panic!("expected validation failure, got {other}"),
    }

    let filter = ReportFilter {
        village: Some(marker),
        ..Default::default()
    };
    let (records, total) = repo.find_all(&filter, Page::default()).await.unwrap();
    assert_eq!(total, 0);
    assert!(records.is_empty());
}

#[tokio::test]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn update_changes_supplied_fields_and_nothing_else() {
    let repo = repository().await;
    let created = repo.create(&wagholi_report()).await.unwrap();

    let patch = SoilReportPatch {
        ph: Some(dec!(7.25)),
        nitrogen: Some(dec!(300)),
        ..Default::default()
    };
    let updated = repo.update(created.id, &patch).await.unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.timestamp, created.timestamp);
    assert_eq!(updated.ph, dec!(7.25));
    assert_eq!(updated.nitrogen, dec!(300));
    assert_eq!(updated.state, created.state);
    assert_eq!(updated.potassium, created.potassium);

    repo.delete(created.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn rejected_update_leaves_the_row_unchanged() {
    let repo = repository().await;
    let created = repo.create(&wagholi_report()).await.unwrap();

    let patch = SoilReportPatch {
        ph: Some(dec!(15)),
        ..Default::default()
    };
    let err = repo.update(created.id, &patch).await.unwrap_err();
    match err {
        StoreError::Validation(v) => assert!(v.mentions("ph")),
        other => panic!("expected validation failure, got {other}"),
    }

    let stored = repo.find_by_id(created.id).await.unwrap();
    assert_eq!(stored, created);

    repo.delete(created.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn update_of_missing_report_is_not_found() {
    let repo = repository().await;
    let missing = Uuid::new_v4();
    let patch = SoilReportPatch {
        ph: Some(dec!(7)),
        ..Default::default()
    };
    let err = repo.update(missing, &patch).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(id) if id == missing));
}

#[tokio::test]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn delete_then_find_is_not_found() {
    let repo = repository().await;
    let created = repo.create(&wagholi_report()).await.unwrap();

    repo.delete(created.id).await.unwrap();

    let err = repo.find_by_id(created.id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(id) if id == created.id));

    let err = repo.delete(created.id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn pagination_is_idempotent_without_intervening_writes() {
    let repo = repository().await;
    fixtures::seed(&repo).await.unwrap();

    let page = Page::new(Some(1), Some(5)).unwrap();
    let (first, total_first) = repo.find_all(&ReportFilter::default(), page).await.unwrap();
    let (second, total_second) = repo.find_all(&ReportFilter::default(), page).await.unwrap();

    assert_eq!(total_first, total_second);
    assert_eq!(first, second);
    assert!(first.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
}

#[tokio::test]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn seeded_fixture_filters_down_to_one_maharashtra_record() {
    let repo = repository().await;
    let seeded = fixtures::seed(&repo).await.unwrap();
    assert_eq!(seeded.len(), 7);

    let filter = ReportFilter {
        state: Some("Maharashtra".to_string()),
        ..Default::default()
    };
    let page = Page::new(Some(1), Some(10)).unwrap();
    let (records, total) = repo.find_all(&filter, page).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].district, "Pune");
}

#[tokio::test]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn health_check_reports_true_when_connected() {
    let manager = Arc::new(ConnectionManager::new(DatabaseSettings::default()));
    manager.connect().await.expect(NEEDS_DB);
    assert!(manager.health_check().await);
    manager.disconnect().await;
    assert!(!manager.health_check().await);
}
