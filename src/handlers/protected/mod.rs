// handlers/protected/mod.rs - pages behind the Protect guard
//
// The layout guard has already put a Session in the request extensions, so
// handlers extract it with `Extension<Session>` and call the backend with its
// bearer token.

pub mod dashboard;
pub mod lists;
pub mod resources;

use axum::{
    http::HeaderMap,
    response::{IntoResponse, Response},
};

use crate::app::AppState;
use crate::client::{AuthContext, RequestError};
use crate::cookies::append_set_cookie;
use crate::error::ApiError;
use crate::guard::{login_location, redirect_response};
use crate::session::Session;

pub use dashboard::dashboard;
pub use lists::{organization_list, project_list, user_list};
pub use resources::{organization_page, project_page, user_page};

/// Server-context credentials for backend calls made on behalf of the visitor
pub fn backend_auth(session: &Session) -> AuthContext {
    AuthContext::Bearer(session.access_token().to_string())
}

/// A backend call from a page failed.
///
/// A 401 means the upstream token behind the session is no longer valid, so
/// the session is dropped and the visitor goes back to login. Everything else
/// renders as an error document.
#[derive(Debug)]
pub struct BackendFailure {
    error: RequestError,
    login_redirect: String,
    clear_session: HeaderMap,
}

impl BackendFailure {
    pub fn new(state: &AppState, path: &str, error: RequestError) -> Self {
        let mut clear_session = HeaderMap::new();
        if error.is_unauthorized() {
            append_set_cookie(&mut clear_session, &state.sessions.clear_cookie());
        }
        Self {
            error,
            login_redirect: login_location(state.login_path(), path),
            clear_session,
        }
    }
}

impl IntoResponse for BackendFailure {
    fn into_response(self) -> Response {
        if self.error.is_unauthorized() {
            tracing::info!("Backend rejected session token, signing out");
            return redirect_response(&self.login_redirect, self.clear_session);
        }
        ApiError::from(self.error).into_response()
    }
}
