use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use totes_core::DomainError;
use totes_infra::ServiceError;

/// Request failure, mapped to a status and a `{"error": ...}` body.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Backend detail is logged, never returned.
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn not_found(label: &str) -> Self {
        ApiError::NotFound(format!("{label} not found"))
    }

    /// Map a service failure, naming `label` in not-found messages.
    pub fn from_service(err: ServiceError, label: &str) -> Self {
        match err {
            ServiceError::NotFound => ApiError::not_found(label),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::Validation(msg) => ApiError::BadRequest(msg),
            ServiceError::Persistence(detail) => {
                tracing::error!(entity = label, error = %detail, "persistence failure");
                ApiError::Internal
            }
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

/// Attach an entity label to service results.
pub trait ServiceResultExt<T> {
    fn for_entity(self, label: &str) -> Result<T, ApiError>;
}

impl<T> ServiceResultExt<T> for Result<T, ServiceError> {
    fn for_entity(self, label: &str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::from_service(e, label))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        json_error(self.status(), self.to_string())
    }
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, axum::Json(json!({ "error": message.into() }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_the_http_taxonomy() {
        let cases = [
            (ServiceError::NotFound, StatusCode::NOT_FOUND),
            (ServiceError::Conflict("email taken".into()), StatusCode::CONFLICT),
            (ServiceError::Validation("name missing".into()), StatusCode::BAD_REQUEST),
            (ServiceError::Persistence("connection reset".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from_service(err, "customer").status(), status);
        }
    }

    #[test]
    fn persistence_detail_is_not_exposed() {
        let err = ApiError::from_service(ServiceError::Persistence("password=hunter2".into()), "user");
        assert!(!err.to_string().contains("hunter2"));
        assert_eq!(ApiError::from_service(ServiceError::NotFound, "item").to_string(), "item not found");
    }

    #[test]
    fn domain_errors_are_client_input_failures() {
        let cases = [
            DomainError::validation("quantity must be positive"),
            DomainError::MissingField("email"),
            DomainError::invariant("slot is full"),
            DomainError::invalid_id("abc"),
        ];
        for err in cases {
            assert_eq!(ApiError::from(err).status(), StatusCode::BAD_REQUEST);
        }
    }
}
