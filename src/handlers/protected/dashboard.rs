use axum::{extract::State, Extension};
use serde::Serialize;

use super::{backend_auth, BackendFailure};
use crate::app::AppState;
use crate::backend::UserInfo;
use crate::middleware::{Page, PageContext};
use crate::session::Session;

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub user: UserInfo,
    pub staff: bool,
}

/// GET / - landing page for signed-in visitors
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    context: PageContext,
) -> Result<Page<Dashboard>, BackendFailure> {
    let user = state
        .backend
        .userinfo(backend_auth(&session))
        .await
        .map_err(|e| BackendFailure::new(&state, &context.path, e))?;

    let staff = user.is_staff();
    Ok(Page::new(context, Dashboard { user, staff }))
}
