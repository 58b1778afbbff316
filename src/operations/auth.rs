// ABOUTME: Authentication operations: credential login and external-provider callback
// ABOUTME: Credential failures collapse to one undifferentiated 401 envelope
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::authz::OperationRequirements;
use crate::context::RequestContext;
use crate::envelope::ApiResponse;
use crate::errors::{AppError, FieldError};
use crate::models::LoginView;
use crate::pipeline::Operation;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Credential login; the identifier is an email or a username
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub identifier: String,
    /// Never echoed into logs
    #[serde(skip_serializing)]
    pub password: String,
}

#[async_trait]
impl Operation for LoginUser {
    type Output = LoginView;

    fn name(&self) -> &'static str {
        "LoginUser"
    }

    fn requirements(&self) -> OperationRequirements {
        OperationRequirements::none()
    }

    fn validators() -> Vec<fn(&Self) -> Vec<FieldError>> {
        vec![|op| {
            let mut errors = Vec::new();
            if op.identifier.trim().is_empty() {
                errors.push(FieldError::new("identifier", "Identifier is required."));
            }
            if op.password.is_empty() {
                errors.push(FieldError::new("password", "Password is required."));
            }
            errors
        }]
    }

    async fn run(&self, ctx: &RequestContext) -> Result<ApiResponse<Self::Output>, AppError> {
        match ctx.identity.login(&self.identifier, &self.password).await? {
            Some(view) => Ok(ApiResponse::success("Login successful", view)),
            None => Ok(ApiResponse::error("Invalid credentials", 401)),
        }
    }
}

/// Completed external-provider login, carrying the provider's asserted profile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalLoginCallback {
    pub provider: String,
    pub provider_key: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

#[async_trait]
impl Operation for ExternalLoginCallback {
    type Output = LoginView;

    fn name(&self) -> &'static str {
        "ExternalLoginCallback"
    }

    fn validators() -> Vec<fn(&Self) -> Vec<FieldError>> {
        vec![|op| {
            let mut errors = Vec::new();
            if op.provider.trim().is_empty() {
                errors.push(FieldError::new("provider", "Provider is required."));
            }
            if op.provider_key.trim().is_empty() {
                errors.push(FieldError::new("providerKey", "Provider key is required."));
            }
            if op.email.trim().is_empty() || !op.email.contains('@') {
                errors.push(FieldError::new("email", "Email is not valid."));
            }
            errors
        }]
    }

    async fn run(&self, ctx: &RequestContext) -> Result<ApiResponse<Self::Output>, AppError> {
        let view = ctx
            .identity
            .handle_external_login(
                &self.provider,
                &self.provider_key,
                &self.email,
                &self.name,
                self.picture.as_deref(),
            )
            .await?;
        Ok(ApiResponse::success("Login successful", view))
    }
}
