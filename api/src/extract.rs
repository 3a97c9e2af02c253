use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use brick_core::envelope::field_from_serde_message;

use crate::error::AppError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The id assigned by the request-id layer, or a fresh one when the handler
/// runs without it (tests, direct router use).
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::now_v7().to_string())
}

/// Turn a JSON body rejection into a 400 naming the offending field.
pub fn map_json_rejection(rejection: JsonRejection, request_id: String) -> AppError {
    let body_text = rejection.body_text();
    let field = field_from_serde_message(&body_text).unwrap_or_else(|| "body".to_string());
    AppError::MalformedEnvelope {
        field,
        message: format!("Invalid webhook body: {body_text}"),
        request_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn request_id_prefers_the_header() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-123"));
        assert_eq!(request_id(&headers), "req-123");
    }

    #[test]
    fn request_id_is_generated_when_missing() {
        let generated = request_id(&HeaderMap::new());
        assert!(uuid::Uuid::parse_str(&generated).is_ok());
    }
}
