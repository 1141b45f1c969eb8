// handlers/mod.rs - page handlers grouped by layout
//
// public    - signed-out pages plus the login callback and logout
// protected - pages behind the session guard
// preferences - locale and theme cookies, no guard

pub mod preferences;
pub mod protected;
pub mod public;

use axum::response::IntoResponse;
use serde_json::json;

use crate::middleware::ApiResponse;

/// GET /health
pub async fn health() -> impl IntoResponse {
    ApiResponse::success(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now(),
    }))
}
