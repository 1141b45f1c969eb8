use axum::{extract::State, http::HeaderMap, response::Response};

use crate::app::AppState;
use crate::cookies::append_set_cookie;
use crate::guard::redirect_response;

/// POST /logout - clear the session cookie and go back to login.
/// Works with or without a session so a stale cookie can always be dropped.
pub async fn logout(State(state): State<AppState>) -> Response {
    let mut headers = HeaderMap::new();
    append_set_cookie(&mut headers, &state.sessions.clear_cookie());
    redirect_response(state.login_path(), headers)
}
