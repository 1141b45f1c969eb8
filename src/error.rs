// HTTP-facing error types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::client::RequestError;

/// Page error with status code and client-friendly message
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (backend answered badly or not at all)
    BadGateway {
        message: String,
        upstream_status: Option<u16>,
        field_errors: Option<HashMap<String, String>>,
    },
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::NotFound(_) => 404,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway { .. } => 502,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::NotFound(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::BadGateway { message, .. } => message,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway { .. } => "BAD_GATEWAY",
        }
    }

    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        });

        match self {
            ApiError::ValidationError {
                field_errors: Some(field_errors),
                ..
            } => {
                response["field_errors"] = json!(field_errors);
            }
            ApiError::BadGateway {
                upstream_status,
                field_errors,
                ..
            } => {
                if let Some(status) = upstream_status {
                    response["upstream_status"] = json!(status);
                }
                if let Some(field_errors) = field_errors {
                    response["field_errors"] = json!(field_errors);
                }
            }
            _ => {}
        }

        response
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, field_errors: Option<HashMap<String, String>>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>, upstream_status: Option<u16>) -> Self {
        ApiError::BadGateway {
            message: message.into(),
            upstream_status,
            field_errors: None,
        }
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::InvalidRequest(msg) => ApiError::bad_request(msg),
            RequestError::Transport(e) => {
                tracing::error!("Backend unreachable: {}", e);
                ApiError::bad_gateway("Backend unavailable", None)
            }
            RequestError::Http { status, body } => {
                // Body can hold backend internals, keep it in the logs only
                tracing::error!("Backend returned {}: {}", status, body);
                if status == 404 {
                    ApiError::not_found("Resource not found")
                } else {
                    ApiError::bad_gateway("Backend request failed", Some(status))
                }
            }
            RequestError::Validation(e) => {
                tracing::error!("Backend response failed validation: {}", e);
                let mut field_errors = HashMap::new();
                field_errors.insert(e.path.clone(), format!("expected {}, found {}", e.expected, e.actual));
                ApiError::BadGateway {
                    message: "Backend response did not match the expected shape".to_string(),
                    upstream_status: None,
                    field_errors: Some(field_errors),
                }
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
