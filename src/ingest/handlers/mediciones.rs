use lambda_http::http::StatusCode;
use lambda_http::{Body, Request, Response};
use serde_json::Value;
use tracing::info;

use crate::error::{json_response, ApiError, ValidationError};
use mediciones_backend::{ingest_batch, Clock, DocumentStore};

/// Largest accepted request body, in bytes
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Handle POST /mediciones requests for batch reading ingestion
///
/// The body must be a JSON array of raw readings. Invalid items are counted
/// in `skipped`; the response lists the identifiers the device should treat
/// as acknowledged.
pub async fn handle_mediciones(
    event: Request,
    request_id: &str,
    store: &dyn DocumentStore,
    clock: &dyn Clock,
    default_device_label: &str,
) -> Result<Response<Body>, ApiError> {
    // Step 1: Extract the raw body
    let body_bytes = match event.body() {
        Body::Text(text) => text.as_bytes(),
        Body::Binary(bytes) => bytes.as_slice(),
        Body::Empty => return Err(ValidationError::EmptyBody.into()),
    };

    if body_bytes.len() > MAX_BODY_BYTES {
        return Err(ApiError::PayloadTooLarge {
            size: body_bytes.len(),
            limit: MAX_BODY_BYTES,
        });
    }

    // Step 2: Require a JSON array
    let payload: Value = serde_json::from_slice(body_bytes)
        .map_err(|e| ValidationError::InvalidJson(e.to_string()))?;

    let Value::Array(items) = payload else {
        return Err(ValidationError::ExpectedArray.into());
    };

    info!(
        request_id = %request_id,
        items = items.len(),
        "Ingesting readings batch"
    );

    // Step 3: Normalize, key and write
    let outcome = ingest_batch(&items, store, clock, default_device_label).await?;

    info!(
        request_id = %request_id,
        accepted = outcome.accepted.len(),
        skipped = outcome.skipped,
        "POST /mediciones completed"
    );

    let response_body = serde_json::to_string(&outcome)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize response: {}", e)))?;

    Ok(json_response(StatusCode::OK, response_body))
}
