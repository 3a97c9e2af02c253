use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use brick_core::DispatchError;
use brick_core::error::{self, ApiError};

const ENVELOPE_DOCS_HINT: &str = "POST /webhook expects {\"next_action\": string, \"tracker\": \
     {\"latest_message\": {\"text\": string, ...}, \"slots\": {...}, \"events\": [...]}}. \
     See /api-doc/openapi.json.";

/// Internal error type that converts to structured API responses
#[derive(Debug)]
pub enum AppError {
    /// The caller sent an envelope missing structural fields (400)
    MalformedEnvelope {
        field: String,
        message: String,
        request_id: String,
    },
    /// Internal error (500)
    Internal { message: String, request_id: String },
}

impl AppError {
    pub fn from_dispatch(err: DispatchError, request_id: &str) -> Self {
        match err {
            DispatchError::MalformedEnvelope { field, message } => AppError::MalformedEnvelope {
                field,
                message,
                request_id: request_id.to_string(),
            },
            // Routed to the fallback before it can get here.
            DispatchError::UnknownAction(name) => AppError::Internal {
                message: format!("unrouted unknown action '{name}'"),
                request_id: request_id.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, api_error) = match self {
            AppError::MalformedEnvelope {
                field,
                message,
                request_id,
            } => {
                tracing::warn!(%request_id, field = %field, "malformed envelope: {message}");
                (
                    StatusCode::BAD_REQUEST,
                    ApiError {
                        error: error::codes::MALFORMED_ENVELOPE.to_string(),
                        message,
                        field: Some(field),
                        received: None,
                        request_id,
                        docs_hint: Some(ENVELOPE_DOCS_HINT.to_string()),
                    },
                )
            }
            AppError::Internal {
                message,
                request_id,
            } => {
                tracing::error!(%request_id, "Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::INTERNAL_ERROR.to_string(),
                        message: "An internal error occurred".to_string(),
                        field: None,
                        received: None,
                        request_id,
                        docs_hint: None,
                    },
                )
            }
        };

        (status, Json(api_error)).into_response()
    }
}
