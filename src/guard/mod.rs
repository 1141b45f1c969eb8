//! Route guards for page subtrees.
//!
//! A guard looks at the session cookie on every request and either lets the
//! page render or answers with a redirect. Nothing is cached between requests.
//!
//! - [`GuardPolicy::Protect`] sends visitors without a usable session to the
//!   login page.
//! - [`GuardPolicy::PublicOnly`] sends visitors that already have a session to
//!   the landing page.
//!
//! A cookie that fails verification counts as no session at all. It is logged
//! at `warn` because a burst of them usually means the signing secret changed.

pub mod layout;

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::cookies::append_set_cookie;
use crate::session::{Session, SessionCodec, SessionError};

pub use layout::{protect_layout, public_only_layout, GuardState};

/// Query parameter carrying the page a visitor wanted before being sent to login
pub const REDIRECT_PARAM: &str = "redirect_to";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardPolicy {
    Protect { login_path: String },
    PublicOnly { landing_path: String },
}

#[derive(Debug)]
pub enum GuardOutcome {
    /// Render the page. `headers` carries refreshed session cookies for the response.
    Render {
        session: Option<Session>,
        headers: HeaderMap,
    },
    Redirect {
        location: String,
        headers: HeaderMap,
    },
}

impl GuardOutcome {
    pub fn is_redirect(&self) -> bool {
        matches!(self, GuardOutcome::Redirect { .. })
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            GuardOutcome::Redirect { location, .. } => Some(location),
            GuardOutcome::Render { .. } => None,
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        match self {
            GuardOutcome::Render { headers, .. } | GuardOutcome::Redirect { headers, .. } => headers,
        }
    }
}

/// Decide between render and redirect for one request.
///
/// `path` is the request path and query, used to send the visitor back after login.
pub fn evaluate(
    policy: &GuardPolicy,
    codec: &SessionCodec,
    request_headers: &HeaderMap,
    path: &str,
    now: i64,
) -> GuardOutcome {
    let mut headers = HeaderMap::new();

    let session = match codec.read(request_headers, now) {
        Ok(session) => Some(session),
        Err(SessionError::Missing) => None,
        Err(SessionError::Expired(exp)) => {
            tracing::debug!("Session expired at {}, treating as signed out", exp);
            append_set_cookie(&mut headers, &codec.clear_cookie());
            None
        }
        Err(e) => {
            tracing::warn!("Unreadable session cookie, treating as signed out: {}", e);
            append_set_cookie(&mut headers, &codec.clear_cookie());
            None
        }
    };

    // Sliding expiry: a refreshed cookie rides along with whatever we answer
    let session = session.map(|session| match codec.refresh_if_due(&session, now) {
        Ok(Some(refreshed)) => {
            tracing::debug!("Refreshed session for {}", refreshed.subject());
            append_set_cookie(&mut headers, &codec.cookie(&refreshed));
            refreshed
        }
        Ok(None) => session,
        Err(e) => {
            tracing::error!("Failed to refresh session for {}: {}", session.subject(), e);
            session
        }
    });

    match (policy, session) {
        (GuardPolicy::Protect { login_path }, None) => {
            tracing::debug!("No session for protected path '{}', redirecting to login", path);
            GuardOutcome::Redirect {
                location: login_location(login_path, path),
                headers,
            }
        }
        (GuardPolicy::Protect { .. }, Some(session)) => GuardOutcome::Render {
            session: Some(session),
            headers,
        },
        (GuardPolicy::PublicOnly { landing_path }, Some(session)) => {
            tracing::debug!("{} already signed in, redirecting to '{}'", session.subject(), landing_path);
            GuardOutcome::Redirect {
                location: landing_path.clone(),
                headers,
            }
        }
        (GuardPolicy::PublicOnly { .. }, None) => GuardOutcome::Render {
            session: None,
            headers,
        },
    }
}

/// Login URL that brings the visitor back to `path` afterwards.
pub fn login_location(login_path: &str, path: &str) -> String {
    if path.is_empty() || path == "/" || path == login_path {
        return login_path.to_string();
    }
    let encoded: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();
    format!("{}?{}={}", login_path, REDIRECT_PARAM, encoded)
}

/// Only same-site absolute paths are honoured as post-login targets.
pub fn safe_redirect_target(target: Option<&str>, fallback: &str) -> String {
    match target {
        Some(t) if t.starts_with('/') && !t.starts_with("//") && !t.contains('\\') => t.to_string(),
        _ => fallback.to_string(),
    }
}

/// `303 See Other` with `Location` plus any extra headers.
pub fn redirect_response(location: &str, headers: HeaderMap) -> Response {
    let mut response = StatusCode::SEE_OTHER.into_response();
    match HeaderValue::from_str(location) {
        Ok(value) => {
            response.headers_mut().insert(header::LOCATION, value);
        }
        Err(e) => {
            tracing::error!("Invalid redirect location '{}': {}", location, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }
    extend_headers(response.headers_mut(), headers);
    response
}

/// Append every header, keeping repeated `Set-Cookie` values.
pub fn extend_headers(target: &mut HeaderMap, source: HeaderMap) {
    let mut current = None;
    for (name, value) in source {
        if let Some(name) = name {
            current = Some(name);
        }
        if let Some(name) = &current {
            target.append(name.clone(), value);
        }
    }
}
