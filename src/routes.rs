// ABOUTME: HTTP route tree and handlers dispatching operations into the pipeline
// ABOUTME: Tenant routes nest under /core/api/v1, admin routes under /admin/api/v1
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::context::{RequestContext, ServerResources};
use crate::envelope::ApiResponse;
use crate::middleware;
use crate::operations::{
    CreateClient, CreateUser, DeactivateClient, DeleteClient, DeleteUser, EditUser,
    ExternalLoginCallback, GetClient, GetPolicies, ListClients, ListUsers, LoginUser,
    UpdateClient,
};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Build the full route tree
pub fn router(resources: Arc<ServerResources>) -> Router {
    let tenant_routes = Router::new()
        .route("/clients", post(create_client).get(list_clients))
        .route(
            "/clients/:id",
            get(get_client).put(update_client).delete(delete_client),
        )
        .route("/clients/:id/deactivate", post(deactivate_client))
        .route("/auth/login", post(login))
        .route("/auth/external/callback", post(external_login))
        .route("/users/me/access", get(get_policies))
        .layer(axum::middleware::from_fn_with_state(
            resources.clone(),
            middleware::tenant_scoped,
        ));

    let admin_routes = Router::new()
        .route("/users", post(create_user).get(list_users))
        .route("/users/:id", put(edit_user).delete(delete_user))
        .route("/users/me/access", get(get_policies))
        .route("/auth/login", post(login))
        .layer(axum::middleware::from_fn_with_state(
            resources.clone(),
            middleware::administrative,
        ));

    Router::new()
        .route("/health", get(health))
        .nest("/core/api/v1", tenant_routes)
        .nest("/admin/api/v1", admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(resources)
}

async fn health() -> Response {
    ApiResponse::success("Healthy", true).into_response()
}

async fn create_client(
    State(resources): State<Arc<ServerResources>>,
    Extension(ctx): Extension<RequestContext>,
    Json(operation): Json<CreateClient>,
) -> Response {
    resources.pipeline.execute(&operation, &ctx).await.into_response()
}

async fn get_client(
    State(resources): State<Arc<ServerResources>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Response {
    let operation = GetClient { id };
    resources.pipeline.execute(&operation, &ctx).await.into_response()
}

async fn update_client(
    State(resources): State<Arc<ServerResources>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(mut operation): Json<UpdateClient>,
) -> Response {
    operation.id = id;
    resources.pipeline.execute(&operation, &ctx).await.into_response()
}

async fn deactivate_client(
    State(resources): State<Arc<ServerResources>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Response {
    let operation = DeactivateClient { id };
    resources.pipeline.execute(&operation, &ctx).await.into_response()
}

async fn delete_client(
    State(resources): State<Arc<ServerResources>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Response {
    let operation = DeleteClient { id };
    resources.pipeline.execute(&operation, &ctx).await.into_response()
}

async fn list_clients(
    State(resources): State<Arc<ServerResources>>,
    Extension(ctx): Extension<RequestContext>,
    Query(operation): Query<ListClients>,
) -> Response {
    resources.pipeline.execute(&operation, &ctx).await.into_response()
}

async fn login(
    State(resources): State<Arc<ServerResources>>,
    Extension(ctx): Extension<RequestContext>,
    Json(operation): Json<LoginUser>,
) -> Response {
    resources.pipeline.execute(&operation, &ctx).await.into_response()
}

async fn external_login(
    State(resources): State<Arc<ServerResources>>,
    Extension(ctx): Extension<RequestContext>,
    Json(operation): Json<ExternalLoginCallback>,
) -> Response {
    resources.pipeline.execute(&operation, &ctx).await.into_response()
}

async fn get_policies(
    State(resources): State<Arc<ServerResources>>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    let operation = GetPolicies::default();
    resources.pipeline.execute(&operation, &ctx).await.into_response()
}

async fn create_user(
    State(resources): State<Arc<ServerResources>>,
    Extension(ctx): Extension<RequestContext>,
    Json(operation): Json<CreateUser>,
) -> Response {
    resources.pipeline.execute(&operation, &ctx).await.into_response()
}

async fn edit_user(
    State(resources): State<Arc<ServerResources>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(mut operation): Json<EditUser>,
) -> Response {
    operation.id = id;
    resources.pipeline.execute(&operation, &ctx).await.into_response()
}

async fn delete_user(
    State(resources): State<Arc<ServerResources>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Response {
    let operation = DeleteUser { id };
    resources.pipeline.execute(&operation, &ctx).await.into_response()
}

async fn list_users(
    State(resources): State<Arc<ServerResources>>,
    Extension(ctx): Extension<RequestContext>,
    Query(operation): Query<ListUsers>,
) -> Response {
    resources.pipeline.execute(&operation, &ctx).await.into_response()
}
