use axum::extract::Query;
use serde::{Deserialize, Serialize};

use crate::guard::safe_redirect_target;
use crate::middleware::{Page, PageContext};

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub redirect_to: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginPage {
    /// Where the callback should send the visitor once signed in
    pub redirect_to: Option<String>,
    pub error: Option<String>,
    pub callback_path: &'static str,
}

/// GET /login
///
/// Only reached by signed-out visitors; the layout guard sends everyone else
/// to the landing page.
pub async fn login_page(context: PageContext, Query(query): Query<LoginQuery>) -> Page<LoginPage> {
    // Off-site targets are dropped rather than echoed back
    let redirect_to = query
        .redirect_to
        .as_deref()
        .map(|target| safe_redirect_target(Some(target), ""))
        .filter(|target| !target.is_empty());

    Page::new(
        context,
        LoginPage {
            redirect_to,
            error: query.error,
            callback_path: "/auth/callback",
        },
    )
}
