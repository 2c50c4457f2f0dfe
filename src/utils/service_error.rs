// Flat error taxonomy shared by services and handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Message returned whenever an ownership check fails
pub const PET_ACCESS_DENIED: &str = "Pet not found or access denied";

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("Missing required fields")]
    MissingFields(Vec<String>),

    #[error("{message}")]
    InvalidValue {
        message: String,
        valid_values: Vec<String>,
    },

    #[error("{message}")]
    Validation { message: String, fields: Vec<String> },

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Cannot delete the only contact for this pet")]
    LastContact,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Auth provider error: {0}")]
    AuthProvider(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Ownership check failure for a pet or one of its sub-resources
    pub fn pet_access_denied() -> Self {
        ServiceError::NotFound(PET_ACCESS_DENIED.to_string())
    }

    pub fn not_found(what: &str) -> Self {
        ServiceError::NotFound(format!("{} not found", what))
    }

    pub fn validation(message: impl Into<String>, fields: &[&str]) -> Self {
        ServiceError::Validation {
            message: message.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Get HTTP status code for error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::MissingFields(_)
            | ServiceError::InvalidValue { .. }
            | ServiceError::Validation { .. }
            | ServiceError::LastContact => StatusCode::BAD_REQUEST,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Pool(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Storage(_) | ServiceError::AuthProvider(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Database(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    /// Get error code for logs and API clients
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::Unauthorized => "UNAUTHORIZED",
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::MissingFields(_) => "MISSING_FIELDS",
            ServiceError::InvalidValue { .. } => "INVALID_VALUE",
            ServiceError::Validation { .. } => "VALIDATION_ERROR",
            ServiceError::Forbidden(_) => "FORBIDDEN",
            ServiceError::Conflict(_) => "CONFLICT",
            ServiceError::LastContact => "LAST_CONTACT",
            ServiceError::Database(_) => "DATABASE_ERROR",
            ServiceError::Pool(_) => "POOL_ERROR",
            ServiceError::Storage(_) => "STORAGE_ERROR",
            ServiceError::AuthProvider(_) => "AUTH_PROVIDER_ERROR",
            ServiceError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message and details pair used by the `{ error: { message, details } }` envelope
    pub fn to_detail(&self) -> ErrorDetail {
        let details = match self {
            ServiceError::MissingFields(fields) | ServiceError::Validation { fields, .. } => {
                Some(json!({ "fields": fields }))
            },
            ServiceError::InvalidValue { valid_values, .. } => {
                Some(json!({ "validValues": valid_values }))
            },
            ServiceError::Database(_)
            | ServiceError::Pool(_)
            | ServiceError::Storage(_)
            | ServiceError::AuthProvider(_)
            | ServiceError::Internal(_) => Some(json!({ "code": self.error_code() })),
            _ => None,
        };

        ErrorDetail {
            message: self.to_string(),
            details,
        }
    }

    /// JSON body for REST responses
    pub fn to_body(&self) -> Value {
        match self {
            ServiceError::MissingFields(fields) => json!({
                "error": "Missing required fields",
                "requiredFields": fields,
            }),
            ServiceError::InvalidValue {
                message,
                valid_values,
            } => json!({
                "error": message,
                "validValues": valid_values,
            }),
            ServiceError::Validation { message, fields } => json!({
                "error": message,
                "fields": fields,
            }),
            ServiceError::LastContact => json!({
                "error": self.to_string(),
                "message": "Each pet must have at least one contact",
            }),
            // Store and upstream failures pass their message through as an object
            ServiceError::Database(_)
            | ServiceError::Pool(_)
            | ServiceError::Storage(_)
            | ServiceError::AuthProvider(_)
            | ServiceError::Internal(_) => json!({ "error": self.to_detail() }),
            _ => json!({ "error": self.to_string() }),
        }
    }
}

/// Error half of the service envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), "{}", self);
        }
        (status, Json(self.to_body())).into_response()
    }
}

// =============================================================================
// ERROR CONVERSIONS
// =============================================================================

impl From<diesel::result::Error> for ServiceError {
    fn from(error: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match error {
            Error::NotFound => ServiceError::NotFound("Record not found".to_string()),
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                ServiceError::Conflict(info.message().to_string())
            },
            _ => ServiceError::Database(error.to_string()),
        }
    }
}

impl From<axum::extract::rejection::JsonRejection> for ServiceError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        ServiceError::Validation {
            message: rejection.body_text(),
            fields: Vec::new(),
        }
    }
}

impl From<bb8::RunError<diesel_async::pooled_connection::PoolError>> for ServiceError {
    fn from(error: bb8::RunError<diesel_async::pooled_connection::PoolError>) -> Self {
        ServiceError::Pool(error.to_string())
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(error: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = error
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        fields.sort();

        let message = error
            .field_errors()
            .values()
            .flat_map(|errors| errors.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| "Invalid input".to_string());

        ServiceError::Validation { message, fields }
    }
}

// =============================================================================
// TESTS
// =============================================================================
