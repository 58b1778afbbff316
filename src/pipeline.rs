// ABOUTME: Operation trait and the explicit execution pipeline driving every operation
// ABOUTME: Stages run in order: logging, timing, validation, authorization, core
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Operation Pipeline
//!
//! Every business operation is a value implementing [`Operation`] and runs
//! through one [`Pipeline`]. The pipeline is a plain driver, not a chain of
//! wrappers, so the stage order is visible in one function: log the request
//! snapshot, start the clock, aggregate validator output (short-circuiting
//! to a 422 envelope), evaluate authorization requirements, run the core,
//! translate any escaped error into an error envelope, and warn with the
//! caller's name when the whole run crossed the slow threshold.

use crate::authz::{AuthorizationEvaluator, OperationRequirements};
use crate::constants::limits;
use crate::context::RequestContext;
use crate::envelope::ApiResponse;
use crate::errors::{AppError, ErrorCode, FieldError};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Instant;

/// A business operation: a serializable request value with declared
/// validators and authorization requirements and an async core
#[async_trait]
pub trait Operation: Serialize + Send + Sync {
    /// Payload type of the success envelope
    type Output: Serialize + Send;

    /// Stable operation name used in logs
    fn name(&self) -> &'static str;

    /// Authorization requirements checked before the core runs
    fn requirements(&self) -> OperationRequirements {
        OperationRequirements::none()
    }

    /// Validators whose outputs aggregate into one 422 envelope
    fn validators() -> Vec<fn(&Self) -> Vec<FieldError>>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// The operation core; runs only after validation and authorization pass
    async fn run(&self, ctx: &RequestContext) -> Result<ApiResponse<Self::Output>, AppError>;
}

/// Drives operations through the fixed stage order
pub struct Pipeline {
    evaluator: AuthorizationEvaluator,
}

impl Pipeline {
    #[must_use]
    pub const fn new(evaluator: AuthorizationEvaluator) -> Self {
        Self { evaluator }
    }

    /// Execute an operation; the result is always an envelope, never an error
    pub async fn execute<O: Operation>(
        &self,
        operation: &O,
        ctx: &RequestContext,
    ) -> ApiResponse<O::Output> {
        let name = operation.name();
        let snapshot = serde_json::to_value(operation)
            .unwrap_or_else(|_| serde_json::Value::String("<unserializable>".into()));
        tracing::info!(operation = name, request = %snapshot, "Handling operation");

        let started = Instant::now();
        let response = match self.run_stages(operation, ctx).await {
            Ok(response) => response,
            Err(error) => Self::translate(&error, name, ctx.detailed_errors),
        };

        let elapsed_ms = started.elapsed().as_millis();
        if elapsed_ms > limits::SLOW_OPERATION_MS {
            // The caller's name is only looked up on the slow path
            let caller = match ctx.principal {
                Some(user_id) => ctx
                    .identity
                    .user_name(user_id)
                    .await
                    .unwrap_or_else(|_| user_id.to_string()),
                None => "anonymous".to_owned(),
            };
            tracing::warn!(
                operation = name,
                elapsed_ms,
                caller = %caller,
                request = %snapshot,
                "Slow operation"
            );
        }

        response
    }

    async fn run_stages<O: Operation>(
        &self,
        operation: &O,
        ctx: &RequestContext,
    ) -> Result<ApiResponse<O::Output>, AppError> {
        let mut field_errors = Vec::new();
        for validator in O::validators() {
            field_errors.extend(validator(operation));
        }
        if !field_errors.is_empty() {
            return Ok(ApiResponse::validation_failed(field_errors));
        }

        self.evaluator
            .evaluate(&operation.requirements(), ctx.principal, &ctx.identity)
            .await?;

        operation.run(ctx).await
    }

    /// Turn an escaped error into an error envelope. Authentication maps to
    /// 401, authorization to 403, field validation to 422; anything else
    /// becomes a 400 logged at error level and, outside detailed mode,
    /// redacted. Nothing escapes the pipeline as a raw error.
    fn translate<T>(error: &AppError, name: &str, detailed: bool) -> ApiResponse<T> {
        match error.code {
            ErrorCode::Unauthenticated | ErrorCode::Forbidden | ErrorCode::ValidationFailed => {
                ApiResponse::from_app_error(error, detailed)
            }
            _ => {
                tracing::error!(operation = name, error = %error, "Operation failed");
                let mut response = ApiResponse::error(error.public_message(detailed), 400);
                if !error.errors.is_empty() {
                    response.errors = Some(error.errors.clone());
                }
                response
            }
        }
    }
}
