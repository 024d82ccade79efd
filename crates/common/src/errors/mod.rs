//! Error types for FlightGraph services
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for each resolution failure mode
//! - HTTP status code mapping
//! - Structured error responses
//! - Error codes for client handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,

    // Resolution errors (4xxx)
    UnknownIntent,
    UnresolvableEntities,

    // Rate limiting (6xxx)
    RateLimited,

    // Graph store errors (7xxx)
    StoreExecutionError,

    // External service errors (8xxx)
    UpstreamError,
    InferenceParseError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,

    // Service unavailable
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,

            ErrorCode::UnknownIntent => 4001,
            ErrorCode::UnresolvableEntities => 4002,

            ErrorCode::RateLimited => 6001,

            ErrorCode::StoreExecutionError => 7001,

            ErrorCode::UpstreamError => 8001,
            ErrorCode::InferenceParseError => 8002,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,

            ErrorCode::ServiceUnavailable => 9999,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    // Resolution errors
    #[error("Unknown intent '{intent}': no query templates are registered for it")]
    UnknownIntent { intent: String },

    #[error("Cannot resolve intent '{intent}': missing entities {}", .missing.join(", "))]
    UnresolvableEntities {
        intent: String,
        missing: Vec<String>,
    },

    // Rate limiting
    #[error("Rate limit exceeded: {limit} requests per second")]
    RateLimited { limit: u32 },

    // Graph store errors
    #[error("Graph store error: {message}")]
    StoreExecution { message: String },

    // External service errors
    #[error("Language model error: {message}")]
    Upstream { message: String },

    #[error("Could not parse inferred parameters: {message}")]
    InferenceParse { message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::UnknownIntent { .. } => ErrorCode::UnknownIntent,
            AppError::UnresolvableEntities { .. } => ErrorCode::UnresolvableEntities,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::StoreExecution { .. } => ErrorCode::StoreExecutionError,
            AppError::Upstream { .. } => ErrorCode::UpstreamError,
            AppError::InferenceParse { .. } => ErrorCode::InferenceParseError,
            AppError::HttpClient(_) => ErrorCode::UpstreamError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::ServiceUnavailable { .. } => ErrorCode::ServiceUnavailable,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,

            // 422 Unprocessable Entity: the conversation layer should ask a
            // clarifying question
            AppError::UnknownIntent { .. } |
            AppError::UnresolvableEntities { .. } => StatusCode::UNPROCESSABLE_ENTITY,

            // 429 Too Many Requests
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,

            // 500 Internal Server Error
            AppError::InferenceParse { .. } |
            AppError::Internal { .. } |
            AppError::Configuration { .. } |
            AppError::Serialization(_) |
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 502 Bad Gateway
            AppError::StoreExecution { .. } |
            AppError::Upstream { .. } |
            AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable
            AppError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Structured details for the error body, if the variant carries any
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::UnknownIntent { intent } => Some(serde_json::json!({ "intent": intent })),
            AppError::UnresolvableEntities { intent, missing } => Some(serde_json::json!({
                "intent": intent,
                "missing_entities": missing,
            })),
            AppError::Validation { field: Some(field), .. } => {
                Some(serde_json::json!({ "field": field }))
            }
            _ => None,
        }
    }

    /// Render this error as the body used in API responses
    pub fn to_details(&self) -> ErrorDetails {
        ErrorDetails {
            code: self.code(),
            message: self.to_string(),
            details: self.details(),
            request_id: None,
        }
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            error: self.to_details(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string()
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::UnknownIntent { intent: "book_flight".into() };
        assert_eq!(err.code(), ErrorCode::UnknownIntent);
        assert_eq!(err.code().as_code(), 4001);
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_unresolvable_message_names_missing_keys() {
        let err = AppError::UnresolvableEntities {
            intent: "lookup_details".into(),
            missing: vec!["record_locator".into(), "feedback_id".into()],
        };
        let message = err.to_string();
        assert!(message.contains("record_locator"));
        assert!(message.contains("feedback_id"));
        assert!(err.is_client_error());

        let details = err.details().unwrap();
        assert_eq!(details["missing_entities"][1], "feedback_id");
    }

    #[test]
    fn test_store_error_keeps_message_verbatim() {
        let err = AppError::StoreExecution {
            message: "Neo.ClientError.Statement.SyntaxError: Invalid input 'X'".into(),
        };
        assert!(err.to_string().ends_with("Invalid input 'X'"));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.is_server_error());
    }

    #[test]
    fn test_validation_error() {
        let err = AppError::Validation {
            message: "utterance too long".into(),
            field: Some("utterance".into()),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_server_error());
        assert!(err.is_client_error());
    }
}
