//! API error envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domain::DomainError;

/// Stable machine-readable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Conflict,
    InvalidCredentials,
    InvalidToken,
    TokenExpired,
    Unauthorized,
    NotFound,
    ValidationError,
    InternalServerError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conflict => write!(f, "CONFLICT"),
            Self::InvalidCredentials => write!(f, "INVALID_CREDENTIALS"),
            Self::InvalidToken => write!(f, "INVALID_TOKEN"),
            Self::TokenExpired => write!(f, "TOKEN_EXPIRED"),
            Self::Unauthorized => write!(f, "UNAUTHORIZED"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::ValidationError => write!(f, "VALIDATION_ERROR"),
            Self::InternalServerError => write!(f, "INTERNAL_SERVER_ERROR"),
        }
    }
}

/// Error detail structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

/// Failure envelope, the error-side mirror of `ApiResponse`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub message: String,
    pub error: ApiErrorDetail,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                success: false,
                message: message.into(),
                error: ApiErrorDetail {
                    code,
                    details: None,
                },
            },
        }
    }

    /// Attach per-field details
    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.response.error.details = Some(details);
        self
    }

    /// Validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::ValidationError, message)
    }

    /// Missing or unusable credentials
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, message)
    }

    /// Not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorCode::NotFound, message)
    }

    /// Resource conflict
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, ErrorCode::Conflict, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
            message,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { message } => Self::not_found(message),
            DomainError::Validation { message, details } => {
                let error = Self::validation(message);

                if details.is_empty() {
                    error
                } else {
                    error.with_details(details)
                }
            }
            DomainError::Conflict { message } => Self::conflict(message),
            DomainError::InvalidCredentials { message } => Self::new(
                StatusCode::UNAUTHORIZED,
                ErrorCode::InvalidCredentials,
                message,
            ),
            DomainError::InvalidToken => Self::new(
                StatusCode::UNAUTHORIZED,
                ErrorCode::InvalidToken,
                "Invalid token",
            ),
            DomainError::TokenExpired => Self::new(
                StatusCode::UNAUTHORIZED,
                ErrorCode::TokenExpired,
                "Token expired",
            ),
            DomainError::Configuration { message }
            | DomainError::Storage { message }
            | DomainError::Internal { message } => {
                // Log the cause, return a generic message
                error!(error = %message, "Internal error");
                Self::internal("Internal server error")
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => format!("{}: {}", field, message),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();

        Self::validation("Validation failed").with_details(details)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.response.error.code, self.response.message
        )
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_creation() {
        let err = ApiError::conflict("User with this email already exists");

        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.response.error.code, ErrorCode::Conflict);
        assert!(!err.response.success);
    }

    #[test]
    fn test_domain_error_conversion() {
        let err: ApiError = DomainError::not_found("User 'abc' not found").into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err: ApiError = DomainError::invalid_credentials("Invalid email or password").into();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.response.error.code, ErrorCode::InvalidCredentials);
        assert_eq!(err.response.message, "Invalid email or password");
    }

    #[test]
    fn test_token_errors_keep_distinct_codes() {
        let invalid: ApiError = DomainError::InvalidToken.into();
        let expired: ApiError = DomainError::TokenExpired.into();

        assert_eq!(invalid.status, StatusCode::UNAUTHORIZED);
        assert_eq!(expired.status, StatusCode::UNAUTHORIZED);
        assert_eq!(invalid.response.error.code, ErrorCode::InvalidToken);
        assert_eq!(expired.response.error.code, ErrorCode::TokenExpired);
    }

    #[test]
    fn test_internal_errors_do_not_leak() {
        let err: ApiError =
            DomainError::storage("connection to db-host-1:5432 refused").into();

        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.response.message, "Internal server error");
    }

    #[test]
    fn test_validation_details_serialization() {
        let err: ApiError = DomainError::validation_with_details(
            "Password does not meet requirements",
            vec!["Password must be at least 8 characters long".to_string()],
        )
        .into();

        let json = serde_json::to_string(&err.response).unwrap();
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("VALIDATION_ERROR"));
        assert!(json.contains("at least 8 characters"));
    }

    #[test]
    fn test_error_codes_are_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::InvalidCredentials).unwrap(),
            "\"INVALID_CREDENTIALS\""
        );
        assert_eq!(
            serde_json::to_string(&ErrorCode::TokenExpired).unwrap(),
            "\"TOKEN_EXPIRED\""
        );
    }
}
