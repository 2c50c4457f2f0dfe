// Service envelope: `{ data }` on success, `{ error: { message, details } }` on failure

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::service_error::{ErrorDetail, ServiceError, ServiceResult};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
    #[serde(skip)]
    status: axum::http::StatusCode,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            status: axum::http::StatusCode::OK,
        }
    }

    pub fn err(error: &ServiceError) -> Self {
        Self {
            data: None,
            error: Some(error.to_detail()),
            status: error.status_code(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl<T> From<ServiceResult<T>> for ApiResponse<T> {
    fn from(result: ServiceResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(&e),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope() {
        let response: ApiResponse<u32> = Ok(3).into();
        assert!(response.is_ok());
        assert_eq!(serde_json::to_value(&response).unwrap(), json!({ "data": 3 }));
    }

    #[test]
    fn test_error_envelope() {
        let response: ApiResponse<u32> =
            Err(ServiceError::Database("connection reset".into())).into();
        assert!(!response.is_ok());

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value["error"]["message"],
            "Database error: connection reset"
        );
        assert!(value.get("data").is_none());
    }
}
