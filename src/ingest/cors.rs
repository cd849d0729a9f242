use lambda_http::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_MAX_AGE,
};
use lambda_http::http::HeaderValue;
use lambda_http::{Body, Response};

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type";
const MAX_AGE_SECONDS: &str = "3600";

/// CORS headers stamped on every response of the ingestion API
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allow_origin: HeaderValue,
}

impl CorsPolicy {
    /// An origin that is not a valid header value falls back to "*"
    pub fn new(allowed_origin: &str) -> Self {
        Self {
            allow_origin: HeaderValue::from_str(allowed_origin)
                .unwrap_or_else(|_| HeaderValue::from_static("*")),
        }
    }

    pub fn apply(&self, mut response: Response<Body>) -> Response<Body> {
        let headers = response.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
        headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE_SECONDS));
        response
    }

    /// 200 with an empty body, answered for any OPTIONS path
    pub fn preflight(&self) -> Response<Body> {
        self.apply(Response::new(Body::Empty))
    }
}
