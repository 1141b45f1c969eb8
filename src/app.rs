use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::backend::BackendApi;
use crate::client::HttpTransport;
use crate::config::AppConfig;
use crate::cookies::Preferences;
use crate::guard::{protect_layout, public_only_layout, GuardState};
use crate::handlers;
use crate::middleware::{cache_control_middleware, CacheControlState};
use crate::session::{SessionCodec, SessionError};

/// Shared, read-only state handed to every handler
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionCodec>,
    pub preferences: Arc<Preferences>,
    pub backend: BackendApi,
}

impl AppState {
    pub fn new(config: AppConfig, transport: Arc<dyn HttpTransport>) -> Result<Self, SessionError> {
        let sessions = SessionCodec::new(&config.session, &config.cookies)?;
        let preferences = Preferences::from_config(&config.cookies);
        let backend = BackendApi::new(config.backend.base_url.clone(), transport);

        Ok(Self {
            config: Arc::new(config),
            sessions: Arc::new(sessions),
            preferences: Arc::new(preferences),
            backend,
        })
    }

    pub fn login_path(&self) -> &str {
        &self.config.routes.login_path
    }

    pub fn landing_path(&self) -> &str {
        &self.config.routes.landing_path
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // Ungated
        .route("/health", get(handlers::health))
        .route("/auth/callback", get(handlers::public::auth_callback))
        .route("/logout", post(handlers::public::logout))
        .route("/preferences/locale", post(handlers::preferences::set_locale))
        .route("/preferences/theme", post(handlers::preferences::set_theme))
        // Layouts
        .merge(public_only_routes(&state))
        .merge(protected_routes(&state))
        .nest_service("/assets", ServeDir::new(&state.config.assets.dir))
        // Global middleware
        .layer(from_fn_with_state(
            CacheControlState {
                max_age_secs: state.config.assets.max_age_secs,
            },
            cache_control_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn guard_state(state: &AppState) -> GuardState {
    GuardState::new(state.sessions.clone(), state.login_path(), state.landing_path())
}

/// Pages only signed-out visitors see
fn public_only_routes(state: &AppState) -> Router<AppState> {
    use handlers::public;

    Router::new()
        .route(state.login_path(), get(public::login_page))
        .route_layer(from_fn_with_state(
            guard_state(state),
            public_only_layout,
        ))
}

/// Pages that need a session
fn protected_routes(state: &AppState) -> Router<AppState> {
    use handlers::protected;

    Router::new()
        .route(state.landing_path(), get(protected::dashboard))
        .route("/organizations", get(protected::organization_list))
        .route("/organizations/:id", get(protected::organization_page))
        .route("/projects", get(protected::project_list))
        .route("/projects/:id", get(protected::project_page))
        .route("/users", get(protected::user_list))
        .route("/users/:id", get(protected::user_page))
        .route_layer(from_fn_with_state(
            guard_state(state),
            protect_layout,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::testing::MockTransport;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn config() -> AppConfig {
        let mut config = AppConfig::development();
        config.backend.base_url = MockTransport::BASE_URL.to_string();
        config
    }

    fn app(transport: MockTransport) -> (Router, AppState) {
        let state = AppState::new(config(), Arc::new(transport)).unwrap();
        (router(state.clone()), state)
    }

    fn session(state: &AppState) -> Session {
        state
            .sessions
            .issue("u1", "upstream-token", Utc::now().timestamp())
            .unwrap()
    }

    fn get(path: &str, session: Option<&Session>) -> Request<Body> {
        let mut builder = Request::builder().uri(path);
        if let Some(session) = session {
            builder = builder.header(header::COOKIE, format!("portal_session={}", session.encoded));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn location(response: &Response) -> &str {
        response.headers().get(header::LOCATION).unwrap().to_str().unwrap()
    }

    fn userinfo() -> Value {
        json!({"sub": "u1", "name": "Ada", "email": "ada@example.com", "roles": ["staff"]})
    }

    #[tokio::test]
    async fn login_renders_for_anonymous_visitor() {
        let (app, _) = app(MockTransport::new());
        let response = app.oneshot(get("/login", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["page"]["path"], "/login");
        assert_eq!(body["page"]["theme"], "light");
    }

    #[tokio::test]
    async fn login_redirects_signed_in_visitor_to_landing() {
        let (app, state) = app(MockTransport::new());
        let session = session(&state);
        let response = app.oneshot(get("/login", Some(&session))).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn dashboard_requires_session() {
        let (app, _) = app(MockTransport::new());
        let response = app.oneshot(get("/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn dashboard_calls_userinfo_with_session_token() {
        let transport = MockTransport::new().respond("/userinfo", 200, userinfo());
        let (app, state) = app(transport.clone());
        let session = session(&state);

        let response = app.oneshot(get("/", Some(&session))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["data"]["user"]["name"], "Ada");
        assert_eq!(body["data"]["staff"], true);
        assert_eq!(
            transport.requests()[0].headers().get("authorization").unwrap(),
            "Bearer upstream-token"
        );
    }

    #[tokio::test]
    async fn invalid_backend_body_renders_validation_error() {
        let transport = MockTransport::new().respond(
            "/projects/p1",
            200,
            json!({"id": "p1", "name": "Portal"}),
        );
        let (app, state) = app(transport);
        let session = session(&state);

        let response = app.oneshot(get("/projects/p1", Some(&session))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert!(body["field_errors"].get("$.organization_id").is_some());
    }

    #[tokio::test]
    async fn upstream_unauthorized_signs_visitor_out() {
        let transport = MockTransport::new().respond("/users/u9", 401, json!({"error": "expired"}));
        let (app, state) = app(transport);
        let session = session(&state);

        let response = app.oneshot(get("/users/u9", Some(&session))).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login?redirect_to=%2Fusers%2Fu9");
        let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("portal_session=;"));
    }

    // Issued long enough ago that the next guarded request re-issues it
    fn session_due_for_refresh(state: &AppState) -> Session {
        let settings = &state.config.session;
        let issued_at = Utc::now().timestamp() - (settings.lifetime_secs - settings.refresh_window_secs) - 60;
        state.sessions.issue("u1", "upstream-token", issued_at).unwrap()
    }

    fn set_cookies(response: &Response) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn sign_out_inside_refresh_window_is_not_undone() {
        let transport = MockTransport::new().respond("/users/u9", 401, json!({"error": "expired"}));
        let (app, state) = app(transport);
        let session = session_due_for_refresh(&state);

        let response = app.oneshot(get("/users/u9", Some(&session))).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 1, "unexpected cookies: {:?}", cookies);
        assert!(cookies[0].starts_with("portal_session=;"));
        assert!(cookies[0].contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn page_inside_refresh_window_gets_refreshed_cookie() {
        let transport = MockTransport::new().respond("/userinfo", 200, userinfo());
        let (app, state) = app(transport);
        let session = session_due_for_refresh(&state);

        let response = app.oneshot(get("/", Some(&session))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].contains(&format!("Max-Age={}", state.config.session.lifetime_secs)));
    }

    #[tokio::test]
    async fn callback_sets_session_cookie_and_redirects() {
        let transport = MockTransport::new().respond("/userinfo", 200, userinfo());
        let (app, state) = app(transport);

        let response = app
            .oneshot(get("/auth/callback?token=abc&redirect_to=%2Fprojects", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/projects");

        let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));

        let value = cookie
            .trim_start_matches("portal_session=")
            .split(';')
            .next()
            .unwrap();
        let session = state.sessions.decode(value, Utc::now().timestamp()).unwrap();
        assert_eq!(session.subject(), "u1");
        assert_eq!(session.access_token(), "abc");
    }

    #[tokio::test]
    async fn callback_without_token_is_bad_request() {
        let (app, _) = app(MockTransport::new());
        let response = app.oneshot(get("/auth/callback", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn logout_clears_cookie() {
        let (app, _) = app(MockTransport::new());
        let request = Request::builder()
            .method("POST")
            .uri("/logout")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
        assert!(response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn theme_preference_round_trips_through_cookie() {
        let (app, _) = app(MockTransport::new());
        let request = Request::builder()
            .method("POST")
            .uri("/preferences/theme")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"theme":"dark"}"#))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        let pair = cookie.split(';').next().unwrap().to_string();

        let request = Request::builder()
            .uri("/login")
            .header(header::COOKIE, pair)
            .body(Body::empty())
            .unwrap();
        let body = json_body(app.oneshot(request).await.unwrap()).await;
        assert_eq!(body["page"]["theme"], "dark");
    }

    #[tokio::test]
    async fn unsupported_locale_is_rejected() {
        let (app, _) = app(MockTransport::new());
        let request = Request::builder()
            .method("POST")
            .uri("/preferences/locale")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"locale":"xx"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }
}
