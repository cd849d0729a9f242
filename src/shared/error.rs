use serde::{Deserialize, Serialize};

/// Body of every non-2xx response: `{"error", "message", "request_id"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable code from [`error_codes`]
    pub error: String,
    pub message: String,
    pub request_id: String,
}

impl ErrorResponse {
    pub fn new(
        error: impl Into<String>,
        message: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            request_id: request_id.into(),
        }
    }

    /// Serialized body; falls back to a bare `INTERNAL_ERROR` payload
    pub fn into_body(self) -> String {
        serde_json::to_string(&self).unwrap_or_else(|_| {
            format!(
                r#"{{"error":"{}","message":"","request_id":""}}"#,
                error_codes::INTERNAL_ERROR
            )
        })
    }
}

/// Machine-readable error codes returned by the ingestion API
pub mod error_codes {
    /// Empty body or body that is not JSON
    pub const INVALID_BODY: &str = "INVALID_BODY";
    /// Valid JSON that is not an array of readings
    pub const EXPECTED_ARRAY: &str = "EXPECTED_ARRAY";
    pub const PAYLOAD_TOO_LARGE: &str = "PAYLOAD_TOO_LARGE";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    /// A store transaction failed; earlier chunks may be committed
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}
