// ABOUTME: Uniform success/error/paginated response envelope for all operations
// ABOUTME: Maps envelope status codes onto HTTP responses at the transport boundary
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Response Envelope
//!
//! Every business operation returns an [`ApiResponse`]. Success envelopes
//! carry 200 semantics; error envelopes carry an explicit status code the
//! transport layer must propagate; paginated envelopes are successes with
//! derived page metadata.

use crate::errors::{AppError, FieldError};
use crate::pagination::PageMeta;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Uniform operation result wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Whether the operation succeeded
    pub success: bool,
    /// Human-readable message
    pub message: String,
    /// Payload, when present
    pub data: Option<T>,
    /// Explicit status code; only present on error envelopes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Field-level errors; only present on error envelopes that carry them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    /// Page metadata; only present on paginated envelopes
    #[serde(default, flatten)]
    pub page: Option<PageMeta>,
}

impl<T> ApiResponse<T> {
    /// Success envelope with a payload
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            status_code: None,
            errors: None,
            page: None,
        }
    }

    /// Success envelope without a payload
    pub fn success_empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            status_code: None,
            errors: None,
            page: None,
        }
    }

    /// Error envelope with an explicit status code
    pub fn error(message: impl Into<String>, status_code: u16) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            status_code: Some(status_code),
            errors: None,
            page: None,
        }
    }

    /// Error envelope carrying field-level errors
    pub fn error_with(
        message: impl Into<String>,
        status_code: u16,
        errors: Vec<FieldError>,
    ) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            status_code: Some(status_code),
            errors: Some(errors),
            page: None,
        }
    }

    /// 422 envelope aggregating every reported validation failure
    #[must_use]
    pub fn validation_failed(errors: Vec<FieldError>) -> Self {
        Self::error_with("Validation failed", 422, errors)
    }

    /// Error envelope derived from an [`AppError`], preserving its status
    /// code and field errors
    #[must_use]
    pub fn from_app_error(error: &AppError, detailed: bool) -> Self {
        let mut response = Self::error(error.public_message(detailed), error.http_status());
        if !error.errors.is_empty() {
            response.errors = Some(error.errors.clone());
        }
        response
    }

    /// Effective HTTP status for this envelope
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status_code.unwrap_or(200)
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// Paginated success envelope; `total_pages` is derived
    pub fn paginated(
        message: impl Into<String>,
        items: Vec<T>,
        page_number: i64,
        page_size: i64,
        total_items: i64,
    ) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(items),
            status_code: None,
            errors: None,
            page: Some(PageMeta::new(page_number, page_size, total_items)),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_wire_shape() {
        let response = ApiResponse::success("ok", json!({"id": 1}));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["message"], json!("ok"));
        assert!(value.get("statusCode").is_none());
        assert!(value.get("errors").is_none());
    }

    #[test]
    fn test_error_wire_shape() {
        let response: ApiResponse<()> = ApiResponse::error_with(
            "Validation failed",
            422,
            vec![FieldError::new("email", "Invalid email format")],
        );
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["statusCode"], json!(422));
        assert_eq!(value["errors"][0]["key"], json!("email"));
    }

    #[test]
    fn test_paginated_wire_shape() {
        let response = ApiResponse::paginated("ok", vec![1, 2, 3, 4, 5], 3, 10, 25);
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["pageNumber"], json!(3));
        assert_eq!(value["totalPages"], json!(3));
        assert_eq!(value["totalItems"], json!(25));
        assert_eq!(response.status(), 200);
    }

    #[test]
    fn test_from_app_error_keeps_field_errors() {
        let err = AppError::validation(vec![FieldError::new("fullName", "Full name is required.")]);
        let response = ApiResponse::<()>::from_app_error(&err, true);
        assert_eq!(response.status(), 422);
        assert_eq!(response.errors.as_ref().map(Vec::len), Some(1));
    }
}
