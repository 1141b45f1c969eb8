use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::breadcrumbs::{breadcrumbs, Crumb};
use crate::cookies::Theme;

/// Wrapper for JSON responses that adds the success envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        envelope(&self.data, None)
    }
}

/// Layout data every page carries next to its own content.
#[derive(Debug, Clone, Serialize)]
pub struct PageContext {
    pub path: String,
    pub breadcrumbs: Vec<Crumb>,
    pub locale: String,
    pub theme: Theme,
}

#[async_trait]
impl FromRequestParts<AppState> for PageContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let path = parts.uri.path().to_string();

        Ok(Self {
            breadcrumbs: breadcrumbs(&path),
            locale: state.preferences.locale(&parts.headers),
            theme: state.preferences.theme(&parts.headers),
            path,
        })
    }
}

/// A rendered page: page content plus its layout context.
#[derive(Debug)]
pub struct Page<T: Serialize> {
    pub context: PageContext,
    pub data: T,
}

impl<T: Serialize> Page<T> {
    pub fn new(context: PageContext, data: T) -> Self {
        Self { context, data }
    }
}

impl<T: Serialize> IntoResponse for Page<T> {
    fn into_response(self) -> Response {
        let page = match serde_json::to_value(&self.context) {
            Ok(value) => value,
            Err(e) => return serialization_failure(e),
        };
        envelope(&self.data, Some(page))
    }
}

fn envelope<T: Serialize>(data: &T, page: Option<Value>) -> Response {
    let data_value = match serde_json::to_value(data) {
        Ok(value) => value,
        Err(e) => return serialization_failure(e),
    };

    let mut body = json!({
        "success": true,
        "data": data_value
    });
    if let Some(page) = page {
        body["page"] = page;
    }

    (StatusCode::OK, Json(body)).into_response()
}

fn serialization_failure(e: serde_json::Error) -> Response {
    tracing::error!("Failed to serialize response data: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "error": "Failed to serialize response data"
        })),
    )
        .into_response()
}

