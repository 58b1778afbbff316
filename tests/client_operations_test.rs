// ABOUTME: Integration tests for client operations run through the full pipeline
// ABOUTME: Covers duplicate document rejection, soft delete, formatting, and paging

use atrium::auth::TokenIssuer;
use atrium::authz::AuthorizationEvaluator;
use atrium::config::JwtConfig;
use atrium::context::RequestContext;
use atrium::database::Database;
use atrium::identity::IdentityService;
use atrium::operations::{
    CreateClient, DeactivateClient, GetClient, ListClients, UpdateClient,
};
use atrium::pipeline::Pipeline;
use atrium::tenant::TenantContext;
use std::sync::Arc;
use tempfile::NamedTempFile;

struct Harness {
    ctx: RequestContext,
    pipeline: Pipeline,
    _file: NamedTempFile,
}

async fn harness() -> Harness {
    let file = NamedTempFile::new().unwrap();
    let url = format!("sqlite:{}", file.path().display());
    let db = Database::connect(&url).await.unwrap();
    db.migrate().await.unwrap();
    let hash = bcrypt::hash("*Admin123", 4).unwrap();
    db.seed_defaults("admin@admin.com", &hash).await.unwrap();
    let admin = db
        .get_user_by_email("admin@admin.com")
        .await
        .unwrap()
        .unwrap();

    let issuer = Arc::new(TokenIssuer::new(JwtConfig {
        secret: "test-secret".into(),
        issuer: "atrium".into(),
        audience: "atrium-api".into(),
        expiry_minutes: 60,
    }));
    let identity = Arc::new(IdentityService::new(
        Arc::new(db),
        issuer,
        TokenIssuer::admin_tenant(),
    ));

    Harness {
        ctx: RequestContext {
            tenant: TenantContext::administrative(),
            principal: Some(admin.id),
            identity,
            detailed_errors: true,
        },
        pipeline: Pipeline::new(AuthorizationEvaluator::new(true)),
        _file: file,
    }
}

fn create_op(full_name: &str, document: &str) -> CreateClient {
    CreateClient {
        full_name: full_name.into(),
        document_number: document.into(),
        email: "client@example.com".into(),
        phone: Some("11987654321".into()),
        zip_code: Some("01310100".into()),
        paid: false,
    }
}

#[tokio::test]
async fn test_create_formats_and_returns_client() {
    let h = harness().await;

    let response = h.pipeline.execute(&create_op("Acme", "52998224725"), &h.ctx).await;

    assert!(response.success, "{}", response.message);
    let view = response.data.unwrap();
    assert_eq!(view.document_number, "529.982.247-25");
    assert_eq!(view.phone.as_deref(), Some("(11) 98765-4321"));
    assert_eq!(view.zip_code.as_deref(), Some("01310-100"));
}

#[tokio::test]
async fn test_duplicate_document_is_rejected_across_formatting() {
    let h = harness().await;

    let first = h.pipeline.execute(&create_op("Acme", "52998224725"), &h.ctx).await;
    assert!(first.success);

    // Same digits with punctuation still collide
    let second = h
        .pipeline
        .execute(&create_op("Other", "529.982.247-25"), &h.ctx)
        .await;
    assert!(!second.success);
    assert_eq!(second.status(), 409);
    assert_eq!(second.message, "Document Number already exists");

    let list = h.pipeline.execute(&ListClients::default(), &h.ctx).await;
    assert_eq!(list.page.unwrap().total_items, 1);
}

#[tokio::test]
async fn test_validation_failures_aggregate() {
    let h = harness().await;
    let op = CreateClient {
        full_name: String::new(),
        document_number: String::new(),
        email: "not-an-email".into(),
        phone: None,
        zip_code: None,
        paid: false,
    };

    let response = h.pipeline.execute(&op, &h.ctx).await;
    assert_eq!(response.status(), 422);
    let errors = response.errors.unwrap();
    let keys: Vec<&str> = errors.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["fullName", "documentNumber", "email"]);
}

#[tokio::test]
async fn test_update_inactive_client_is_rejected() {
    let h = harness().await;

    let created = h.pipeline.execute(&create_op("Acme", "52998224725"), &h.ctx).await;
    let id = created.data.unwrap().id;

    let deactivated = h.pipeline.execute(&DeactivateClient { id }, &h.ctx).await;
    assert!(deactivated.success);

    let update = UpdateClient {
        id,
        full_name: "Acme Renamed".into(),
        document_number: "52998224725".into(),
        email: "client@example.com".into(),
        phone: None,
        zip_code: None,
        paid: true,
    };
    let response = h.pipeline.execute(&update, &h.ctx).await;
    assert!(!response.success);
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_deactivated_clients_leave_the_listing_but_not_the_store() {
    let h = harness().await;

    let created = h.pipeline.execute(&create_op("Acme", "52998224725"), &h.ctx).await;
    let id = created.data.unwrap().id;
    h.pipeline.execute(&DeactivateClient { id }, &h.ctx).await;

    let list = h.pipeline.execute(&ListClients::default(), &h.ctx).await;
    assert_eq!(list.page.unwrap().total_items, 0);

    // Still fetchable by id; the delete was soft
    let get = h.pipeline.execute(&GetClient { id }, &h.ctx).await;
    assert!(get.success);

    // Deactivating again reports not found
    let again = h.pipeline.execute(&DeactivateClient { id }, &h.ctx).await;
    assert_eq!(again.status(), 404);
}

#[tokio::test]
async fn test_listing_pages_and_totals() {
    let h = harness().await;

    for i in 0..25 {
        let op = CreateClient {
            full_name: format!("Client {i:02}"),
            document_number: format!("{:011}", 10_000_000_000_u64 + i),
            email: format!("client{i}@example.com"),
            phone: None,
            zip_code: None,
            paid: false,
        };
        let response = h.pipeline.execute(&op, &h.ctx).await;
        assert!(response.success, "{}", response.message);
    }

    let op = ListClients {
        search_text: None,
        page_number: Some(3),
        page_size: Some(10),
    };
    let response = h.pipeline.execute(&op, &h.ctx).await;
    assert!(response.success);
    assert_eq!(response.data.as_ref().map(Vec::len), Some(5));

    let page = response.page.unwrap();
    assert_eq!(page.page_number, 3);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.total_items, 25);
}

#[tokio::test]
async fn test_member_without_policy_is_forbidden() {
    let h = harness().await;

    let member = h
        .ctx
        .identity
        .create_user(
            &atrium::models::UserProfile {
                id: None,
                full_name: "Member".into(),
                email: "member@example.com".into(),
                phone: None,
                profile_image_url: None,
                roles: vec!["User".into()],
                policies: vec![],
            },
            "secret1",
        )
        .await
        .unwrap();

    let mut ctx = h.ctx.clone();
    ctx.principal = member.id;

    let response = h.pipeline.execute(&create_op("Acme", "52998224725"), &ctx).await;
    assert!(!response.success);
    assert_eq!(response.status(), 403);
}
