// src/application/error_handling.rs
//
// Error Handling for Commands
//
// ARCHITECTURE:
// - Maps internal errors → user-friendly responses
// - Provides consistent error format for UI
// - Never exposes internal implementation details
// - Logs errors for debugging

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Standard error response for UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error_type: ErrorType,
    pub message: String,
    pub details: Option<String>,
}

/// Error categories for UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Resource not found (404)
    NotFound,

    /// Invalid input/validation error (400)
    Validation,

    /// Domain invariant violation (422)
    DomainError,

    /// Database/persistence error (500)
    Database,

    /// Network or remote service error (502)
    ExternalService,

    /// Other/unknown error (500)
    Internal,
}

impl ErrorResponse {
    /// Create error response from AppError
    pub fn from_app_error(error: AppError) -> Self {
        match error {
            AppError::NotFound => Self::not_found("Resource"),

            AppError::Domain(domain_error) => Self {
                success: false,
                error_type: ErrorType::DomainError,
                message: "Domain validation failed".to_string(),
                details: Some(domain_error.to_string()),
            },

            AppError::InvalidUri(uri) => Self {
                success: false,
                error_type: ErrorType::Validation,
                message: "Invalid link".to_string(),
                details: Some(uri),
            },

            AppError::Database(db_error) => {
                log::error!("Database error: {:?}", db_error);
                Self::internal(ErrorType::Database, "Database operation failed")
            }

            AppError::Pool(pool_error) => {
                log::error!("Connection pool error: {}", pool_error);
                Self::internal(ErrorType::Database, "Database connection failed")
            }

            AppError::Http(http_error) => Self {
                success: false,
                error_type: ErrorType::ExternalService,
                message: "Network request failed".to_string(),
                details: Some(http_error.to_string()),
            },

            AppError::Timeout(ms) => Self {
                success: false,
                error_type: ErrorType::ExternalService,
                message: format!("Request timed out after {}ms", ms),
                details: None,
            },

            AppError::Script(message) => Self {
                success: false,
                error_type: ErrorType::ExternalService,
                message: "Redirect script failed".to_string(),
                details: Some(message),
            },

            AppError::Serialization(serde_error) => {
                log::error!("Serialization error: {:?}", serde_error);
                Self::internal(ErrorType::Internal, "Data serialization failed")
            }

            AppError::Io(io_error) => {
                log::error!("IO error: {:?}", io_error);
                Self::internal(ErrorType::Internal, "File system operation failed")
            }

            AppError::Task(message) | AppError::Other(message) => {
                log::error!("Internal error: {}", message);
                Self {
                    success: false,
                    error_type: ErrorType::Internal,
                    message,
                    details: None,
                }
            }
        }
    }

    fn internal(error_type: ErrorType, message: &str) -> Self {
        Self {
            success: false,
            error_type,
            message: message.to_string(),
            details: Some("Check logs for details".to_string()),
        }
    }

    /// Create validation error
    pub fn validation(message: String) -> Self {
        Self {
            success: false,
            error_type: ErrorType::Validation,
            message,
            details: None,
        }
    }

    /// Create not found error
    pub fn not_found(resource: &str) -> Self {
        Self {
            success: false,
            error_type: ErrorType::NotFound,
            message: format!("{} not found", resource),
            details: None,
        }
    }
}

/// Helper trait to convert Results to ErrorResponse
pub trait ToErrorResponse<T> {
    fn to_error_response(self) -> Result<T, ErrorResponse>;
}

impl<T> ToErrorResponse<T> for Result<T, AppError> {
    fn to_error_response(self) -> Result<T, ErrorResponse> {
        self.map_err(ErrorResponse::from_app_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    #[test]
    fn test_not_found_error() {
        let error = ErrorResponse::from_app_error(AppError::NotFound);
        assert_eq!(error.error_type, ErrorType::NotFound);
        assert_eq!(error.message, "Resource not found");
    }

    #[test]
    fn test_invalid_uri_is_validation() {
        let error = ErrorResponse::from_app_error(AppError::InvalidUri("nope".to_string()));
        assert_eq!(error.error_type, ErrorType::Validation);
        assert_eq!(error.details.as_deref(), Some("nope"));
    }

    #[test]
    fn test_domain_error_carries_details() {
        let error = ErrorResponse::from_app_error(AppError::Domain(DomainError::InvariantViolation(
            "Host cannot be empty".to_string(),
        )));
        assert_eq!(error.error_type, ErrorType::DomainError);
        assert!(error.details.unwrap().contains("Host cannot be empty"));
    }

    #[test]
    fn test_serialization() {
        let error = ErrorResponse::from_app_error(AppError::Timeout(1500));
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("external_service"));
        assert!(json.contains("1500ms"));
    }
}
