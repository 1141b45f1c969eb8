use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;

use crate::app::AppState;
use crate::client::AuthContext;
use crate::cookies::append_set_cookie;
use crate::error::ApiError;
use crate::guard::{redirect_response, safe_redirect_target};

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Access token issued by the identity provider
    pub token: Option<String>,
    pub redirect_to: Option<String>,
}

/// GET /auth/callback?token=...&redirect_to=...
///
/// Confirms the token with the backend userinfo lookup, stores it in a new
/// session cookie, and sends the visitor on.
pub async fn auth_callback(State(state): State<AppState>, Query(query): Query<CallbackQuery>) -> Response {
    let token = match query.token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => return ApiError::bad_request("Missing token").into_response(),
    };

    let info = match state.backend.userinfo(AuthContext::Bearer(token.clone())).await {
        Ok(info) => info,
        Err(e) if e.is_unauthorized() => {
            tracing::warn!("Login callback with a token the backend rejected");
            let location = format!("{}?error=invalid_token", state.login_path());
            return redirect_response(&location, HeaderMap::new());
        }
        Err(e) => return ApiError::from(e).into_response(),
    };

    let session = match state.sessions.issue(&info.sub, &token, Utc::now().timestamp()) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Failed to issue session for {}: {}", info.sub, e);
            return ApiError::internal_server_error("Could not start session").into_response();
        }
    };

    tracing::info!("Session started for {}", info.sub);

    let mut headers = HeaderMap::new();
    append_set_cookie(&mut headers, &state.sessions.cookie(&session));

    let target = safe_redirect_target(query.redirect_to.as_deref(), state.landing_path());
    redirect_response(&target, headers)
}
