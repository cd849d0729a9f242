use lambda_http::http::{Method, StatusCode};
use lambda_http::{Body, Request, Response};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::cors::CorsPolicy;
use crate::error::{json_response, ApiError};
use crate::handlers::mediciones::handle_mediciones;
use mediciones_backend::error::{error_codes, ErrorResponse};
use mediciones_backend::{Clock, DocumentStore};

/// Service name reported by the health check
pub const SERVICE_NAME: &str = "mediciones-ingest";

/// Route an incoming request to the appropriate handler
///
/// Paths are normalized (trailing slashes removed), OPTIONS requests get a
/// CORS preflight response, and every response carries CORS headers.
/// Handler errors are rendered into their HTTP error payloads here.
pub async fn route_request(
    event: Request,
    request_id: &str,
    config: &Config,
    store: &dyn DocumentStore,
    clock: &dyn Clock,
) -> Response<Body> {
    let method = event.method().clone();
    let path = normalize_path(event.uri().path());

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Routing request"
    );

    let cors = CorsPolicy::new(&config.cors_allowed_origin);

    if method == Method::OPTIONS {
        info!(request_id = %request_id, "Handling CORS preflight request");
        return cors.preflight();
    }

    let response = match (&method, path.as_str()) {
        (&Method::GET, "/health") => {
            info!(request_id = %request_id, "Health check endpoint");
            handle_health(request_id, clock)
        }

        (&Method::POST, "/mediciones") => {
            info!(request_id = %request_id, "Readings ingestion endpoint");
            match handle_mediciones(
                event,
                request_id,
                store,
                clock,
                &config.default_device_label,
            )
            .await
            {
                Ok(response) => response,
                Err(api_error) => {
                    match &api_error {
                        ApiError::Store(_) | ApiError::Internal(_) => error!(
                            request_id = %request_id,
                            error = %api_error,
                            "Request failed"
                        ),
                        _ => warn!(
                            request_id = %request_id,
                            error = %api_error,
                            "Request rejected"
                        ),
                    }
                    api_error.to_http_response(request_id)
                }
            }
        }

        _ => {
            warn!(
                request_id = %request_id,
                method = %method,
                path = %path,
                "Unknown route"
            );
            handle_not_found(request_id, &method, &path)
        }
    };

    cors.apply(response)
}

/// Normalize a path by removing trailing slashes
///
/// This ensures that /mediciones and /mediciones/ are treated the same.
/// The root path "/" is preserved as-is.
fn normalize_path(path: &str) -> String {
    if path == "/" {
        return path.to_string();
    }

    path.trim_end_matches('/').to_string()
}

/// Handle health check requests
///
/// Reports service identity and current time; no store access.
pub fn handle_health(request_id: &str, clock: &dyn Clock) -> Response<Body> {
    let body = serde_json::json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "time": clock.now_rfc3339(),
        "request_id": request_id
    });

    json_response(StatusCode::OK, body.to_string())
}

/// Handle 404 Not Found responses
fn handle_not_found(request_id: &str, method: &Method, path: &str) -> Response<Body> {
    let body = ErrorResponse::new(
        error_codes::NOT_FOUND,
        format!("Route {} {} not found", method, path),
        request_id,
    );

    json_response(StatusCode::NOT_FOUND, body.into_body())
}
