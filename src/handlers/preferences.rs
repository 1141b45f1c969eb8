use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

use crate::app::AppState;
use crate::cookies::{append_set_cookie, SetCookie, SignatureError, Theme};
use crate::error::ApiError;
use crate::middleware::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct LocaleRequest {
    pub locale: String,
}

#[derive(Debug, Deserialize)]
pub struct ThemeRequest {
    pub theme: Theme,
}

/// POST /preferences/locale - `{"locale": "fr"}`
pub async fn set_locale(State(state): State<AppState>, Json(body): Json<LocaleRequest>) -> Response {
    if !state.preferences.is_supported_locale(&body.locale) {
        let mut field_errors = HashMap::new();
        field_errors.insert("locale".to_string(), format!("Unsupported locale '{}'", body.locale));
        return ApiError::validation_error("Invalid locale", Some(field_errors)).into_response();
    }

    with_cookie(
        state.preferences.locale_cookie(&body.locale),
        json!({ "locale": body.locale }),
    )
}

/// POST /preferences/theme - `{"theme": "dark"}`
pub async fn set_theme(State(state): State<AppState>, Json(body): Json<ThemeRequest>) -> Response {
    with_cookie(
        state.preferences.theme_cookie(body.theme),
        json!({ "theme": body.theme }),
    )
}

fn with_cookie(cookie: Result<SetCookie, SignatureError>, data: serde_json::Value) -> Response {
    let cookie = match cookie {
        Ok(cookie) => cookie,
        Err(e) => {
            tracing::error!("Cannot sign preference cookie: {}", e);
            return ApiError::internal_server_error("Preferences unavailable").into_response();
        }
    };

    let mut headers = HeaderMap::new();
    append_set_cookie(&mut headers, &cookie);
    (headers, ApiResponse::success(data)).into_response()
}
