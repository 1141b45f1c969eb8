use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};

/// Extensions treated as static assets
pub const ASSET_EXTENSIONS: &[&str] = &[
    "js", "mjs", "css", "map", "png", "jpg", "jpeg", "gif", "svg", "ico", "webp", "avif", "woff",
    "woff2", "ttf", "otf", "webmanifest",
];

/// Data requests for routes share asset-like paths but must never be cached
pub const DATA_SUFFIX: &str = ".data";

#[derive(Debug, Clone, Copy)]
pub struct CacheControlState {
    pub max_age_secs: u64,
}

pub fn is_asset_path(path: &str) -> bool {
    if path.ends_with(DATA_SUFFIX) {
        return false;
    }
    let file = path.rsplit('/').next().unwrap_or(path);
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            ASSET_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext))
        }
        _ => false,
    }
}

/// Attach `Cache-Control: public, max-age=N` when the path is an asset, the
/// response succeeded, and nobody downstream set a cache header already.
/// Returns whether the header was added.
pub fn apply_cache_control(path: &str, status: StatusCode, headers: &mut HeaderMap, max_age_secs: u64) -> bool {
    if !status.is_success() || headers.contains_key(header::CACHE_CONTROL) || !is_asset_path(path) {
        return false;
    }

    match HeaderValue::from_str(&format!("public, max-age={}", max_age_secs)) {
        Ok(value) => {
            headers.insert(header::CACHE_CONTROL, value);
            true
        }
        Err(_) => false,
    }
}

pub async fn cache_control_middleware(
    State(state): State<CacheControlState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;
    let status = response.status();
    if apply_cache_control(&path, status, response.headers_mut(), state.max_age_secs) {
        tracing::trace!("Cache-Control added for {}", path);
    }
    response
}
