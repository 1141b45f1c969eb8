use axum::{
    extract::{Path, State},
    Extension,
};

use super::{backend_auth, BackendFailure};
use crate::app::AppState;
use crate::backend::{Organization, Project, User};
use crate::middleware::{Page, PageContext};
use crate::session::Session;

/// GET /organizations/:id
pub async fn organization_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    context: PageContext,
) -> Result<Page<Organization>, BackendFailure> {
    let organization = state
        .backend
        .organization(backend_auth(&session), &id)
        .await
        .map_err(|e| BackendFailure::new(&state, &context.path, e))?;
    Ok(Page::new(context, organization))
}

/// GET /projects/:id
pub async fn project_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    context: PageContext,
) -> Result<Page<Project>, BackendFailure> {
    let project = state
        .backend
        .project(backend_auth(&session), &id)
        .await
        .map_err(|e| BackendFailure::new(&state, &context.path, e))?;
    Ok(Page::new(context, project))
}

/// GET /users/:id
pub async fn user_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    context: PageContext,
) -> Result<Page<User>, BackendFailure> {
    let user = state
        .backend
        .user(backend_auth(&session), &id)
        .await
        .map_err(|e| BackendFailure::new(&state, &context.path, e))?;
    Ok(Page::new(context, user))
}
