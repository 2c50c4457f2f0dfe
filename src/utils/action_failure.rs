// Failure shape for form-post actions: `{ success, errorMessage, errorFields }`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

use super::service_error::ServiceError;

/// Generic message shown when the failure is not the user's fault
pub const UNKNOWN_ERROR: &str = "Unknown error. If this persists please contact us.";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionFailure {
    #[serde(skip)]
    pub status: StatusCode,
    pub success: bool,
    pub error_message: String,
    pub error_fields: Vec<String>,
    /// Submitted values echoed back so the form can be re-filled
    #[serde(flatten)]
    pub values: Map<String, Value>,
}

impl ActionFailure {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            success: false,
            error_message: message.into(),
            error_fields: Vec::new(),
            values: Map::new(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            let field = field.into();
            if !self.error_fields.contains(&field) {
                self.error_fields.push(field);
            }
        }
        self
    }

    pub fn with_value(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }
}

impl From<ServiceError> for ActionFailure {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        match error {
            ServiceError::Validation { message, fields } => {
                ActionFailure::new(status, message).with_fields(fields)
            },
            ServiceError::MissingFields(fields) => {
                ActionFailure::new(status, "Please fill in all required fields").with_fields(fields)
            },
            e if status.is_server_error() => {
                tracing::error!(code = e.error_code(), "Action failed: {}", e);
                ActionFailure::new(status, UNKNOWN_ERROR)
            },
            e => ActionFailure::new(status, e.to_string()),
        }
    }
}

impl IntoResponse for ActionFailure {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_are_unique() {
        let failure = ActionFailure::bad_request("The passwords don't match")
            .with_fields(["newPassword1"])
            .with_fields(["newPassword1", "newPassword2"]);

        assert_eq!(failure.error_fields, vec!["newPassword1", "newPassword2"]);
    }

    #[test]
    fn test_serialized_shape() {
        let failure = ActionFailure::bad_request("A valid email address is required")
            .with_fields(["email"])
            .with_value("email", "not-an-email");

        let value = serde_json::to_value(&failure).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["errorMessage"], "A valid email address is required");
        assert_eq!(value["errorFields"], serde_json::json!(["email"]));
        assert_eq!(value["email"], "not-an-email");
    }

    #[test]
    fn test_server_errors_are_masked() {
        let failure: ActionFailure = ServiceError::Database("deadlock detected".into()).into();
        assert_eq!(failure.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(failure.error_message, UNKNOWN_ERROR);
    }

    #[test]
    fn test_validation_error_keeps_fields() {
        let failure: ActionFailure =
            ServiceError::validation("First name is required", &["firstName"]).into();
        assert_eq!(failure.status, StatusCode::BAD_REQUEST);
        assert_eq!(failure.error_fields, vec!["firstName"]);
    }
}
