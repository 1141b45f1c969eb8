use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use std::sync::Arc;

use super::{evaluate, extend_headers, redirect_response, GuardOutcome, GuardPolicy};
use crate::session::SessionCodec;

/// What both layouts need: the session codec and where each one redirects to.
/// The policy itself comes from the layout the state is mounted with.
#[derive(Clone, Debug)]
pub struct GuardState {
    pub codec: Arc<SessionCodec>,
    pub login_path: String,
    pub landing_path: String,
}

impl GuardState {
    pub fn new(codec: Arc<SessionCodec>, login_path: impl Into<String>, landing_path: impl Into<String>) -> Self {
        Self {
            codec,
            login_path: login_path.into(),
            landing_path: landing_path.into(),
        }
    }
}

/// Layout for pages that need a signed-in visitor.
pub async fn protect_layout(State(guard): State<GuardState>, request: Request, next: Next) -> Response {
    let policy = GuardPolicy::Protect {
        login_path: guard.login_path.clone(),
    };
    guard_layout(&policy, &guard.codec, request, next).await
}

/// Layout for pages only signed-out visitors should see (login and friends).
pub async fn public_only_layout(State(guard): State<GuardState>, request: Request, next: Next) -> Response {
    let policy = GuardPolicy::PublicOnly {
        landing_path: guard.landing_path.clone(),
    };
    guard_layout(&policy, &guard.codec, request, next).await
}

/// Evaluates the guard, then either redirects or runs the page with the
/// [`Session`](crate::session::Session) in request extensions.
async fn guard_layout(policy: &GuardPolicy, codec: &SessionCodec, mut request: Request, next: Next) -> Response {
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let outcome = evaluate(policy, codec, request.headers(), &path, Utc::now().timestamp());

    match outcome {
        GuardOutcome::Redirect { location, headers } => redirect_response(&location, headers),
        GuardOutcome::Render { session, headers } => {
            if let Some(session) = session {
                request.extensions_mut().insert(session);
            }
            let mut response = next.run(request).await;
            // The page's own session cookie (e.g. a sign-out) wins over a guard refresh
            if sets_cookie(response.headers(), codec.cookie_name()) {
                tracing::debug!("Page replaced the session cookie, dropping guard cookies");
            } else {
                extend_headers(response.headers_mut(), headers);
            }
            response
        }
    }
}

fn sets_cookie(headers: &HeaderMap, name: &str) -> bool {
    headers.get_all(header::SET_COOKIE).iter().any(|value| {
        value
            .to_str()
            .ok()
            .and_then(|v| v.split_once('='))
            .is_some_and(|(cookie, _)| cookie.trim() == name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::session::Session;
    use axum::{
        body::Body,
        http::{header, HeaderValue, Request as HttpRequest, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Extension, Router,
    };
    use tower::ServiceExt;

    fn codec() -> Arc<SessionCodec> {
        let config = AppConfig::development();
        Arc::new(SessionCodec::new(&config.session, &config.cookies).unwrap())
    }

    fn protected_router(codec: Arc<SessionCodec>) -> Router {
        Router::new()
            .route(
                "/dashboard",
                get(|Extension(session): Extension<Session>| async move { session.subject().to_string() }),
            )
            .layer(from_fn_with_state(GuardState::new(codec, "/login", "/"), protect_layout))
    }

    #[tokio::test]
    async fn protected_page_sees_session() {
        let codec = codec();
        let session = codec.issue("user-9", "t", Utc::now().timestamp()).unwrap();

        let request = HttpRequest::builder()
            .uri("/dashboard")
            .header(
                header::COOKIE,
                HeaderValue::from_str(&format!("portal_session={}", session.encoded)).unwrap(),
            )
            .body(Body::empty())
            .unwrap();

        let response = protected_router(codec).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"user-9");
    }

    #[tokio::test]
    async fn protected_page_redirects_anonymous_visitor() {
        let request = HttpRequest::builder().uri("/dashboard").body(Body::empty()).unwrap();
        let response = protected_router(codec()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login?redirect_to=%2Fdashboard"
        );
    }

    #[tokio::test]
    async fn same_state_drives_both_layouts() {
        let codec = codec();
        let guard = GuardState::new(codec.clone(), "/login", "/home");
        let app = Router::new()
            .route("/login", get(|| async { "login" }))
            .route_layer(from_fn_with_state(guard.clone(), public_only_layout))
            .merge(
                Router::new()
                    .route("/home", get(|| async { "home" }))
                    .route_layer(from_fn_with_state(guard, protect_layout)),
            );

        let session = codec.issue("user-9", "t", Utc::now().timestamp()).unwrap();
        let request = HttpRequest::builder()
            .uri("/login")
            .header(header::COOKIE, format!("portal_session={}", session.encoded))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/home");

        let request = HttpRequest::builder().uri("/home").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login?redirect_to=%2Fhome");
    }

    #[test]
    fn session_cookie_is_detected_by_name() {
        let mut headers = HeaderMap::new();
        headers.append(header::SET_COOKIE, HeaderValue::from_static("portal_theme=dark.ab; Path=/"));
        assert!(!sets_cookie(&headers, "portal_session"));

        headers.append(header::SET_COOKIE, HeaderValue::from_static("portal_session=; Path=/; Max-Age=0"));
        assert!(sets_cookie(&headers, "portal_session"));
    }
}
