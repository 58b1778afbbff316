// ABOUTME: Integration tests for the authorization evaluator against a real store
// ABOUTME: Covers the unauthenticated/forbidden split and the All/Any combinators

use atrium::auth::TokenIssuer;
use atrium::authz::{AuthorizationEvaluator, Combinator, OperationRequirements};
use atrium::config::JwtConfig;
use atrium::constants::{policies, roles};
use atrium::database::Database;
use atrium::errors::ErrorCode;
use atrium::identity::IdentityService;
use atrium::models::UserProfile;
use std::sync::Arc;
use tempfile::NamedTempFile;
use uuid::Uuid;

async fn test_service() -> (Arc<IdentityService>, NamedTempFile) {
    let file = NamedTempFile::new().unwrap();
    let url = format!("sqlite:{}", file.path().display());
    let db = Database::connect(&url).await.unwrap();
    db.migrate().await.unwrap();
    let hash = bcrypt::hash("*Admin123", 4).unwrap();
    db.seed_defaults("admin@admin.com", &hash).await.unwrap();

    let issuer = Arc::new(TokenIssuer::new(JwtConfig {
        secret: "test-secret".into(),
        issuer: "atrium".into(),
        audience: "atrium-api".into(),
        expiry_minutes: 60,
    }));
    let service = Arc::new(IdentityService::new(
        Arc::new(db),
        issuer,
        TokenIssuer::admin_tenant(),
    ));
    (service, file)
}

async fn create_member(service: &IdentityService, grants: Vec<String>) -> Uuid {
    let view = service
        .create_user(
            &UserProfile {
                id: None,
                full_name: "Member".into(),
                email: format!("{}@example.com", Uuid::new_v4()),
                phone: None,
                profile_image_url: None,
                roles: vec![roles::USER.into()],
                policies: grants,
            },
            "secret1",
        )
        .await
        .unwrap();
    view.id.unwrap()
}

#[tokio::test]
async fn test_empty_requirements_pass_anonymously() {
    let (service, _file) = test_service().await;
    let evaluator = AuthorizationEvaluator::new(true);

    evaluator
        .evaluate(&OperationRequirements::none(), None, &service)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_requirements_without_principal_are_unauthenticated() {
    let (service, _file) = test_service().await;
    let evaluator = AuthorizationEvaluator::new(true);
    let requirements = OperationRequirements::none().policy(policies::CAN_LIST);

    let err = evaluator
        .evaluate(&requirements, None, &service)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Unauthenticated);
}

#[tokio::test]
async fn test_missing_role_is_forbidden_not_unauthenticated() {
    let (service, _file) = test_service().await;
    let evaluator = AuthorizationEvaluator::new(true);
    let member = create_member(&service, vec![]).await;

    let requirements = OperationRequirements::none().role_group([roles::ADMIN]);
    let err = evaluator
        .evaluate(&requirements, Some(member), &service)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Forbidden);
}

#[tokio::test]
async fn test_role_group_passes_on_any_member_role() {
    let (service, _file) = test_service().await;
    let evaluator = AuthorizationEvaluator::new(true);
    let member = create_member(&service, vec![]).await;

    // Member holds User, not Admin; one matching role in the group suffices
    let requirements =
        OperationRequirements::none().role_group([roles::ADMIN, roles::USER]);
    evaluator
        .evaluate(&requirements, Some(member), &service)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_role_groups_pass_when_any_group_matches() {
    let (service, _file) = test_service().await;
    let evaluator = AuthorizationEvaluator::new(true);
    let member = create_member(&service, vec![]).await;

    // Member holds User, not Admin; matching the second group is enough
    let requirements = OperationRequirements::none()
        .role_group([roles::ADMIN])
        .role_group([roles::USER]);
    evaluator
        .evaluate(&requirements, Some(member), &service)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_role_deny_names_roles_from_every_group() {
    let (service, _file) = test_service().await;
    let evaluator = AuthorizationEvaluator::new(true);
    let view = service
        .create_user(
            &UserProfile {
                id: None,
                full_name: "Roleless".into(),
                email: "roleless@example.com".into(),
                phone: None,
                profile_image_url: None,
                roles: vec![],
                policies: vec![],
            },
            "secret1",
        )
        .await
        .unwrap();
    let member = view.id.unwrap();

    let requirements = OperationRequirements::none()
        .role_group([roles::ADMIN])
        .role_group([roles::USER]);
    let err = evaluator
        .evaluate(&requirements, Some(member), &service)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Forbidden);
    assert!(err.message.contains(roles::ADMIN));
    assert!(err.message.contains(roles::USER));
}

#[tokio::test]
async fn test_all_combinator_names_every_missing_policy() {
    let (service, _file) = test_service().await;
    let evaluator = AuthorizationEvaluator::new(true);
    let member = create_member(&service, vec![policies::CAN_LIST.into()]).await;

    let requirements = OperationRequirements::none().permission_group(
        [policies::CAN_LIST, policies::CAN_EDIT, policies::CAN_DELETE],
        Combinator::All,
    );
    let err = evaluator
        .evaluate(&requirements, Some(member), &service)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Forbidden);

    // Detailed mode reports both missing policies, not just the first
    assert!(err.message.contains(policies::CAN_EDIT));
    assert!(err.message.contains(policies::CAN_DELETE));
    assert!(!err.message.contains(policies::CAN_LIST));
}

#[tokio::test]
async fn test_any_combinator_passes_on_first_held_policy() {
    let (service, _file) = test_service().await;
    let evaluator = AuthorizationEvaluator::new(true);
    let member = create_member(&service, vec![policies::CAN_VIEW.into()]).await;

    let requirements = OperationRequirements::none().permission_group(
        [policies::CAN_DELETE, policies::CAN_VIEW],
        Combinator::Any,
    );
    evaluator
        .evaluate(&requirements, Some(member), &service)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_production_mode_hides_deny_specifics() {
    let (service, _file) = test_service().await;
    let evaluator = AuthorizationEvaluator::new(false);
    let member = create_member(&service, vec![]).await;

    let requirements = OperationRequirements::none().policy(policies::CAN_DELETE);
    let err = evaluator
        .evaluate(&requirements, Some(member), &service)
        .await
        .unwrap_err();
    assert_eq!(err.message, "Forbidden");
    assert!(!err.message.contains(policies::CAN_DELETE));
}

#[tokio::test]
async fn test_permission_groups_are_conjunctive() {
    let (service, _file) = test_service().await;
    let evaluator = AuthorizationEvaluator::new(true);
    let member = create_member(&service, vec![policies::CAN_LIST.into()]).await;

    // First group passes, second does not; the whole evaluation fails
    let requirements = OperationRequirements::none()
        .policy(policies::CAN_LIST)
        .policy(policies::CAN_DELETE);
    let err = evaluator
        .evaluate(&requirements, Some(member), &service)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Forbidden);
}
