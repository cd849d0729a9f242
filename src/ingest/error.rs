use lambda_http::http::StatusCode;
use lambda_http::{Body, Response};
use thiserror::Error;

use mediciones_backend::error::{error_codes, ErrorResponse};
use mediciones_backend::StoreError;

/// Main error type for the ingestion API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Request body of {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Request-level validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Request body is empty")]
    EmptyBody,

    #[error("Invalid JSON body: {0}")]
    InvalidJson(String),

    #[error("Expected a JSON array of readings")]
    ExpectedArray,
}

impl ApiError {
    /// Convert error to HTTP response with appropriate status code and error payload
    ///
    /// Store and internal failures get a generic message; details stay in the logs.
    pub fn to_http_response(&self, request_id: &str) -> Response<Body> {
        let (status, error_code, message): (StatusCode, &str, String) = match self {
            ApiError::Validation(ValidationError::EmptyBody) => (
                StatusCode::BAD_REQUEST,
                error_codes::INVALID_BODY,
                "Request body is empty".to_string(),
            ),
            ApiError::Validation(ValidationError::InvalidJson(msg)) => (
                StatusCode::BAD_REQUEST,
                error_codes::INVALID_BODY,
                format!("Invalid JSON body: {}", msg),
            ),
            ApiError::Validation(ValidationError::ExpectedArray) => (
                StatusCode::BAD_REQUEST,
                error_codes::EXPECTED_ARRAY,
                "Expected a JSON array of readings".to_string(),
            ),
            ApiError::PayloadTooLarge { limit, .. } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                error_codes::PAYLOAD_TOO_LARGE,
                format!("Request body exceeds {} bytes", limit),
            ),
            ApiError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::DATABASE_ERROR,
                "Internal database error occurred".to_string(),
            ),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
                "Internal server error occurred".to_string(),
            ),
        };

        json_response(
            status,
            ErrorResponse::new(error_code, message, request_id).into_body(),
        )
    }
}

/// Build a JSON response without panicking on header or status problems
pub fn json_response(status: StatusCode, body: String) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        "content-type",
        lambda_http::http::HeaderValue::from_static("application/json"),
    );
    response
}
