// ABOUTME: Integration tests for first-use tenant initialization
// ABOUTME: Concurrent first requests must produce exactly one migrated, seeded database

use atrium::config::SeedConfig;
use atrium::database::Database;
use atrium::tenant::TenantInitTracker;
use std::sync::Arc;
use tempfile::NamedTempFile;
use uuid::Uuid;

fn seed_config() -> SeedConfig {
    SeedConfig {
        admin_email: "admin@admin.com".into(),
        admin_password: "*Admin123".into(),
    }
}

async fn tenant_database() -> (Database, NamedTempFile) {
    let file = NamedTempFile::new().unwrap();
    let url = format!("sqlite:{}", file.path().display());
    let db = Database::connect(&url).await.unwrap();
    (db, file)
}

#[tokio::test]
async fn test_first_use_migrates_and_seeds() {
    let tracker = TenantInitTracker::new();
    let tenant = Uuid::new_v4();
    let (db, _file) = tenant_database().await;

    assert!(!tracker.is_initialized(tenant));
    tracker
        .ensure_initialized(tenant, &db, &seed_config())
        .await
        .unwrap();
    assert!(tracker.is_initialized(tenant));

    let admin = db.get_user_by_email("admin@admin.com").await.unwrap();
    assert!(admin.is_some());
    assert_eq!(db.user_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_second_call_is_a_no_op() {
    let tracker = TenantInitTracker::new();
    let tenant = Uuid::new_v4();
    let (db, _file) = tenant_database().await;
    let seed = seed_config();

    tracker.ensure_initialized(tenant, &db, &seed).await.unwrap();
    tracker.ensure_initialized(tenant, &db, &seed).await.unwrap();

    assert_eq!(db.user_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_first_requests_initialize_once() {
    let tracker = Arc::new(TenantInitTracker::new());
    let tenant = Uuid::new_v4();
    let (db, _file) = tenant_database().await;
    let seed = seed_config();

    let (a, b, c) = tokio::join!(
        tracker.ensure_initialized(tenant, &db, &seed),
        tracker.ensure_initialized(tenant, &db, &seed),
        tracker.ensure_initialized(tenant, &db, &seed),
    );
    a.unwrap();
    b.unwrap();
    c.unwrap();

    // One admin account means seeding ran exactly once
    assert_eq!(db.user_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_tenants_initialize_independently() {
    let tracker = TenantInitTracker::new();
    let tenant_a = Uuid::new_v4();
    let tenant_b = Uuid::new_v4();
    let (db_a, _file_a) = tenant_database().await;
    let (db_b, _file_b) = tenant_database().await;
    let seed = seed_config();

    tracker
        .ensure_initialized(tenant_a, &db_a, &seed)
        .await
        .unwrap();
    assert!(tracker.is_initialized(tenant_a));
    assert!(!tracker.is_initialized(tenant_b));

    tracker
        .ensure_initialized(tenant_b, &db_b, &seed)
        .await
        .unwrap();
    assert!(tracker.is_initialized(tenant_b));
}
