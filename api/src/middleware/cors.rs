use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::CorsLayer;

use crate::extract::REQUEST_ID_HEADER;

/// Build a CORS layer for the configured `BRICK_CORS_ORIGINS`.
///
/// - Methods: GET, POST, OPTIONS
/// - Headers: Content-Type, X-Request-Id (also exposed)
/// - Max age: 3600s
///
/// Origins that are not valid header values are skipped.
pub fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
        .max_age(std::time::Duration::from_secs(3600))
}
