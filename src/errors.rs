// ABOUTME: Unified error handling system with standard error codes
// ABOUTME: Maps application failures onto HTTP statuses and envelope errors
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Unified Error Handling System
//!
//! Defines the standard error taxonomy used throughout the server. Every
//! failure carries an [`ErrorCode`] that decides its HTTP status, an
//! operator-facing message, and optionally a list of field-level errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// No identity where one is required
    #[serde(rename = "UNAUTHENTICATED")]
    Unauthenticated,
    /// Identity present but insufficient role/permission
    #[serde(rename = "FORBIDDEN")]
    Forbidden,
    /// Field-level validation failures, aggregated
    #[serde(rename = "VALIDATION_FAILED")]
    ValidationFailed,
    /// Entity, tenant, or user absent
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    /// Duplicate unique field (document number, email, role)
    #[serde(rename = "CONFLICT")]
    Conflict,
    /// Malformed or disallowed request state (e.g. tenant signal mismatch)
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput,
    /// Third-party collaborator call failed
    #[serde(rename = "EXTERNAL_SERVICE_ERROR")]
    ExternalService,
    /// Configuration missing or invalid
    #[serde(rename = "CONFIG_ERROR")]
    Config,
    /// Database operation failed
    #[serde(rename = "DATABASE_ERROR")]
    Database,
    /// Anything uncategorized
    #[serde(rename = "UNEXPECTED")]
    Unexpected,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::Unauthenticated => 401,
            Self::Forbidden => 403,
            Self::ValidationFailed => 422,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::InvalidInput => 400,
            Self::ExternalService => 502,
            Self::Config | Self::Database | Self::Unexpected => 500,
        }
    }

    /// Generic description safe to surface to callers in production
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Unauthenticated => "Authentication is required to access this resource",
            Self::Forbidden => "You do not have permission to perform this action",
            Self::ValidationFailed => "The request failed validation",
            Self::NotFound => "The requested resource was not found",
            Self::Conflict => "A resource with this identifier already exists",
            Self::InvalidInput => "The provided input is invalid",
            Self::ExternalService => "An external service encountered an error",
            Self::Config => "Configuration error encountered",
            Self::Database => "Database operation failed",
            Self::Unexpected => "An unexpected error occurred",
        }
    }
}

/// A single field-level error, serialized as `{key, message}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    /// Field or subsystem the error refers to
    pub key: String,
    /// Human-readable message
    pub message: String,
}

impl FieldError {
    /// Create a new field error
    #[must_use]
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code deciding the HTTP status
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Field-level errors, when the failure is attributable to fields
    pub errors: Vec<FieldError>,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            errors: Vec::new(),
            source: None,
        }
    }

    /// Attach field-level errors
    #[must_use]
    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = errors;
        self
    }

    /// Attach a source error for chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Message safe to surface to callers; detailed mode keeps the real
    /// message, production reduces infrastructure failures to a generic one
    #[must_use]
    pub fn public_message(&self, detailed: bool) -> String {
        match self.code {
            ErrorCode::ExternalService
            | ErrorCode::Config
            | ErrorCode::Database
            | ErrorCode::Unexpected
                if !detailed =>
            {
                self.code.description().to_owned()
            }
            _ => self.message.clone(),
        }
    }

    /// Authentication required
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::new(ErrorCode::Unauthenticated, "Authentication required")
    }

    /// Access denied
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Aggregated field validation failure
    #[must_use]
    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::new(ErrorCode::ValidationFailed, "Validation failed").with_errors(errors)
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, format!("{} not found", resource.into()))
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Config, message)
    }

    /// Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Database, message)
    }

    /// Unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unexpected, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        let message = error.to_string();
        Self {
            code: ErrorCode::Unexpected,
            message,
            errors: Vec::new(),
            source: Some(error.into()),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        Self::database(error.to_string()).with_source(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::Unauthenticated.http_status(), 401);
        assert_eq!(ErrorCode::Forbidden.http_status(), 403);
        assert_eq!(ErrorCode::ValidationFailed.http_status(), 422);
        assert_eq!(ErrorCode::NotFound.http_status(), 404);
        assert_eq!(ErrorCode::Conflict.http_status(), 409);
        assert_eq!(ErrorCode::Unexpected.http_status(), 500);
    }

    #[test]
    fn test_public_message_redacts_infrastructure_failures() {
        let err = AppError::database("connection refused on 10.0.0.3");
        assert_eq!(err.public_message(true), "connection refused on 10.0.0.3");
        assert_eq!(err.public_message(false), "Database operation failed");

        // Business errors keep their message either way
        let err = AppError::new(ErrorCode::Conflict, "Document Number already exists");
        assert_eq!(err.public_message(false), "Document Number already exists");
    }
}
