// ABOUTME: User administration operations restricted to the Admin role
// ABOUTME: GetPolicies returns the calling principal's own roles and policies
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::authz::OperationRequirements;
use crate::constants::{limits, roles};
use crate::context::RequestContext;
use crate::database::SortOrder;
use crate::envelope::ApiResponse;
use crate::errors::{AppError, ErrorCode, FieldError};
use crate::models::{UserAccessView, UserProfile, UserView};
use crate::pagination;
use crate::pipeline::Operation;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn admin_only() -> OperationRequirements {
    OperationRequirements::none().role_group([roles::ADMIN])
}

fn validate_profile(full_name: &str, email: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if full_name.trim().is_empty() {
        errors.push(FieldError::new("fullName", "Full name is required."));
    }
    if email.trim().is_empty() {
        errors.push(FieldError::new("email", "Email is required."));
    } else if !email.contains('@') {
        errors.push(FieldError::new("email", "Email is not valid."));
    }
    errors
}

/// Create an account with roles and policies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub policies: Vec<String>,
    /// Never echoed into logs
    #[serde(skip_serializing)]
    pub password: String,
}

#[async_trait]
impl Operation for CreateUser {
    type Output = UserView;

    fn name(&self) -> &'static str {
        "CreateUser"
    }

    fn requirements(&self) -> OperationRequirements {
        admin_only()
    }

    fn validators() -> Vec<fn(&Self) -> Vec<FieldError>> {
        vec![
            |op| validate_profile(&op.full_name, &op.email),
            |op| {
                if op.password.len() < limits::MIN_PASSWORD_LEN {
                    vec![FieldError::new(
                        "password",
                        format!(
                            "Password must be at least {} characters",
                            limits::MIN_PASSWORD_LEN
                        ),
                    )]
                } else {
                    Vec::new()
                }
            },
        ]
    }

    async fn run(&self, ctx: &RequestContext) -> Result<ApiResponse<Self::Output>, AppError> {
        let profile = UserProfile {
            id: None,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            profile_image_url: self.profile_image_url.clone(),
            roles: self.roles.clone(),
            policies: self.policies.clone(),
        };
        let view = ctx.identity.create_user(&profile, &self.password).await?;
        Ok(ApiResponse::success("User created successfully", view))
    }
}

/// Edit an account's profile, roles, and policies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditUser {
    /// Overwritten from the route path
    #[serde(default)]
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub policies: Vec<String>,
    /// New password, when changing it; never echoed into logs
    #[serde(skip_serializing)]
    #[serde(default)]
    pub password: Option<String>,
}

#[async_trait]
impl Operation for EditUser {
    type Output = UserView;

    fn name(&self) -> &'static str {
        "EditUser"
    }

    fn requirements(&self) -> OperationRequirements {
        admin_only()
    }

    fn validators() -> Vec<fn(&Self) -> Vec<FieldError>> {
        vec![|op| validate_profile(&op.full_name, &op.email)]
    }

    async fn run(&self, ctx: &RequestContext) -> Result<ApiResponse<Self::Output>, AppError> {
        let profile = UserProfile {
            id: Some(self.id),
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            profile_image_url: self.profile_image_url.clone(),
            roles: self.roles.clone(),
            policies: self.policies.clone(),
        };
        let result = ctx
            .identity
            .edit_user(&profile, self.password.as_deref())
            .await;
        match result {
            Ok(view) => Ok(ApiResponse::success("User updated successfully", view)),
            Err(error) if error.code == ErrorCode::NotFound => {
                Ok(ApiResponse::error("User not found", 404))
            }
            Err(error) => Err(error),
        }
    }
}

/// Delete an account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUser {
    pub id: Uuid,
}

#[async_trait]
impl Operation for DeleteUser {
    type Output = ();

    fn name(&self) -> &'static str {
        "DeleteUser"
    }

    fn requirements(&self) -> OperationRequirements {
        admin_only()
    }

    async fn run(&self, ctx: &RequestContext) -> Result<ApiResponse<Self::Output>, AppError> {
        match ctx.identity.delete_user(self.id).await {
            Ok(()) => Ok(ApiResponse::success_empty("User deleted successfully")),
            Err(error) if error.code == ErrorCode::NotFound => {
                Ok(ApiResponse::error("User not found", 404))
            }
            Err(error) => Err(error),
        }
    }
}

/// List accounts, paginated
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsers {
    /// -1 sorts descending, anything else ascending
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub search_text: Option<String>,
    #[serde(default)]
    pub page_number: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
}

#[async_trait]
impl Operation for ListUsers {
    type Output = Vec<UserView>;

    fn name(&self) -> &'static str {
        "ListUsers"
    }

    fn requirements(&self) -> OperationRequirements {
        admin_only()
    }

    async fn run(&self, ctx: &RequestContext) -> Result<ApiResponse<Self::Output>, AppError> {
        let (page_number, page_size) = pagination::normalize(
            self.page_number.unwrap_or(1),
            self.page_size.unwrap_or(pagination::DEFAULT_PAGE_SIZE),
        );
        let (views, total) = ctx
            .identity
            .list_users(
                SortOrder::from_wire(self.order),
                self.sort.as_deref().unwrap_or("fullName"),
                self.search_text.as_deref(),
                page_number,
                page_size,
            )
            .await?;

        Ok(ApiResponse::paginated(
            "Ok", views, page_number, page_size, total,
        ))
    }
}

/// The calling principal's roles and policies
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetPolicies {}

#[async_trait]
impl Operation for GetPolicies {
    type Output = UserAccessView;

    fn name(&self) -> &'static str {
        "GetPolicies"
    }

    async fn run(&self, ctx: &RequestContext) -> Result<ApiResponse<Self::Output>, AppError> {
        let user_id = ctx.principal.ok_or_else(AppError::unauthenticated)?;
        let roles = ctx.identity.user_roles(user_id).await?;
        let policies = ctx.identity.user_policies(user_id).await?;
        Ok(ApiResponse::success("Ok", UserAccessView { roles, policies }))
    }
}
