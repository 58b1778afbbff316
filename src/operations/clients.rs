// ABOUTME: Client CRUD operations with declared validators and policy requirements
// ABOUTME: Duplicate active document numbers are rejected before any write
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::authz::OperationRequirements;
use crate::constants::policies;
use crate::context::RequestContext;
use crate::envelope::ApiResponse;
use crate::errors::{AppError, FieldError};
use crate::models::{
    format_document, format_phone, format_zip_code, Client, ClientView,
};
use crate::pagination;
use crate::pipeline::Operation;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MAX_FULL_NAME_LEN: usize = 100;

fn validate_client_fields(
    full_name: &str,
    document_number: &str,
    email: &str,
) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if full_name.trim().is_empty() {
        errors.push(FieldError::new("fullName", "Full name is required."));
    } else if full_name.len() > MAX_FULL_NAME_LEN {
        errors.push(FieldError::new(
            "fullName",
            format!("Full name must not exceed {MAX_FULL_NAME_LEN} characters."),
        ));
    }
    if document_number.trim().is_empty() {
        errors.push(FieldError::new(
            "documentNumber",
            "Document number is required.",
        ));
    }
    if email.trim().is_empty() {
        errors.push(FieldError::new("email", "Email is required."));
    } else if !email.contains('@') {
        errors.push(FieldError::new("email", "Email is not valid."));
    }
    errors
}

/// Create a client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClient {
    pub full_name: String,
    pub document_number: String,
    pub email: String,
    pub phone: Option<String>,
    pub zip_code: Option<String>,
    #[serde(default)]
    pub paid: bool,
}

#[async_trait]
impl Operation for CreateClient {
    type Output = ClientView;

    fn name(&self) -> &'static str {
        "CreateClient"
    }

    fn requirements(&self) -> OperationRequirements {
        OperationRequirements::none().policy(policies::CAN_CREATE)
    }

    fn validators() -> Vec<fn(&Self) -> Vec<FieldError>> {
        vec![|op| validate_client_fields(&op.full_name, &op.document_number, &op.email)]
    }

    async fn run(&self, ctx: &RequestContext) -> Result<ApiResponse<Self::Output>, AppError> {
        let db = ctx.identity.database();
        if db
            .find_active_client_by_document(&self.document_number)
            .await?
            .is_some()
        {
            return Ok(ApiResponse::error("Document Number already exists", 409));
        }

        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4(),
            full_name: self.full_name.clone(),
            document_number: format_document(&self.document_number),
            email: self.email.clone(),
            phone: self.phone.as_deref().map(format_phone),
            zip_code: self.zip_code.as_deref().map(format_zip_code),
            paid: self.paid,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.insert_client(&client).await?;

        Ok(ApiResponse::success(
            "Client created successfully",
            ClientView::from(&client),
        ))
    }
}

/// Update an active client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClient {
    /// Overwritten from the route path
    #[serde(default)]
    pub id: Uuid,
    pub full_name: String,
    pub document_number: String,
    pub email: String,
    pub phone: Option<String>,
    pub zip_code: Option<String>,
    #[serde(default)]
    pub paid: bool,
}

#[async_trait]
impl Operation for UpdateClient {
    type Output = ClientView;

    fn name(&self) -> &'static str {
        "UpdateClient"
    }

    fn requirements(&self) -> OperationRequirements {
        OperationRequirements::none().policy(policies::CAN_EDIT)
    }

    fn validators() -> Vec<fn(&Self) -> Vec<FieldError>> {
        vec![|op| validate_client_fields(&op.full_name, &op.document_number, &op.email)]
    }

    async fn run(&self, ctx: &RequestContext) -> Result<ApiResponse<Self::Output>, AppError> {
        let db = ctx.identity.database();
        let Some(existing) = db.get_client(self.id).await? else {
            return Ok(ApiResponse::error("Client not found", 404));
        };
        if !existing.is_active {
            return Ok(ApiResponse::error("Client is inactive", 400));
        }
        if let Some(other) = db
            .find_active_client_by_document(&self.document_number)
            .await?
        {
            if other.id != self.id {
                return Ok(ApiResponse::error("Document Number already exists", 409));
            }
        }

        let client = Client {
            id: self.id,
            full_name: self.full_name.clone(),
            document_number: format_document(&self.document_number),
            email: self.email.clone(),
            phone: self.phone.as_deref().map(format_phone),
            zip_code: self.zip_code.as_deref().map(format_zip_code),
            paid: self.paid,
            is_active: existing.is_active,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };
        db.update_client(&client).await?;

        Ok(ApiResponse::success(
            "Client updated successfully",
            ClientView::from(&client),
        ))
    }
}

/// Fetch one client by id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetClient {
    pub id: Uuid,
}

#[async_trait]
impl Operation for GetClient {
    type Output = ClientView;

    fn name(&self) -> &'static str {
        "GetClient"
    }

    fn requirements(&self) -> OperationRequirements {
        OperationRequirements::none().policy(policies::CAN_VIEW)
    }

    async fn run(&self, ctx: &RequestContext) -> Result<ApiResponse<Self::Output>, AppError> {
        let Some(client) = ctx.identity.database().get_client(self.id).await? else {
            return Ok(ApiResponse::error("Client not found", 404));
        };
        Ok(ApiResponse::success("Ok", ClientView::from(&client)))
    }
}

/// Soft-delete a client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeactivateClient {
    pub id: Uuid,
}

#[async_trait]
impl Operation for DeactivateClient {
    type Output = ();

    fn name(&self) -> &'static str {
        "DeactivateClient"
    }

    fn requirements(&self) -> OperationRequirements {
        OperationRequirements::none().policy(policies::CAN_DELETE)
    }

    async fn run(&self, ctx: &RequestContext) -> Result<ApiResponse<Self::Output>, AppError> {
        let changed = ctx.identity.database().deactivate_client(self.id).await?;
        if changed == 0 {
            return Ok(ApiResponse::error("Client not found", 404));
        }
        Ok(ApiResponse::success_empty("Client deactivated successfully"))
    }
}

/// Hard-delete a client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteClient {
    pub id: Uuid,
}

#[async_trait]
impl Operation for DeleteClient {
    type Output = ();

    fn name(&self) -> &'static str {
        "DeleteClient"
    }

    fn requirements(&self) -> OperationRequirements {
        OperationRequirements::none().policy(policies::CAN_DELETE)
    }

    async fn run(&self, ctx: &RequestContext) -> Result<ApiResponse<Self::Output>, AppError> {
        let removed = ctx.identity.database().delete_client(self.id).await?;
        if removed == 0 {
            return Ok(ApiResponse::error("Client not found", 404));
        }
        Ok(ApiResponse::success_empty("Client deleted successfully"))
    }
}

/// List active clients, paginated
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListClients {
    #[serde(default)]
    pub search_text: Option<String>,
    #[serde(default)]
    pub page_number: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
}

#[async_trait]
impl Operation for ListClients {
    type Output = Vec<ClientView>;

    fn name(&self) -> &'static str {
        "ListClients"
    }

    fn requirements(&self) -> OperationRequirements {
        OperationRequirements::none().policy(policies::CAN_LIST)
    }

    async fn run(&self, ctx: &RequestContext) -> Result<ApiResponse<Self::Output>, AppError> {
        let (page_number, page_size) = pagination::normalize(
            self.page_number.unwrap_or(1),
            self.page_size.unwrap_or(pagination::DEFAULT_PAGE_SIZE),
        );
        let (clients, total) = ctx
            .identity
            .database()
            .list_clients(self.search_text.as_deref(), page_number, page_size)
            .await?;
        let views = clients.iter().map(ClientView::from).collect();

        Ok(ApiResponse::paginated(
            "Ok", views, page_number, page_size, total,
        ))
    }
}
