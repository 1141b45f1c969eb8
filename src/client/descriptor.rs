use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// HTTP verbs the portal issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Repeating an idempotent call has the same effect as sending it once.
    pub fn is_idempotent(&self) -> bool {
        !matches!(self, Method::Post | Method::Patch)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    pub fn as_reqwest(&self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fully resolved outbound call. Immutable once built.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl RequestDescriptor {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

/// Resolve `target` against `base`.
///
/// Absolute URLs are used as-is. Relative paths are appended to the base
/// path, so `users/1` and `/users/1` both land under `https://host/api/`.
pub fn resolve_url(base: Option<&str>, target: &str) -> Result<Url, String> {
    if let Ok(url) = Url::parse(target) {
        if url.has_host() {
            return Ok(url);
        }
    }

    let base = base.ok_or_else(|| format!("relative URL '{}' requires a base URL", target))?;
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        target.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|e| format!("invalid URL '{}': {}", joined, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_post_and_patch_are_not_idempotent() {
        assert!(Method::Get.is_idempotent());
        assert!(Method::Put.is_idempotent());
        assert!(Method::Delete.is_idempotent());
        assert!(!Method::Post.is_idempotent());
        assert!(!Method::Patch.is_idempotent());
    }

    #[test]
    fn relative_paths_keep_base_path() {
        let base = Some("https://backend.example.com/api/");
        assert_eq!(
            resolve_url(base, "/users/1").unwrap().as_str(),
            "https://backend.example.com/api/users/1"
        );
        assert_eq!(
            resolve_url(base, "users/1?expand=org").unwrap().as_str(),
            "https://backend.example.com/api/users/1?expand=org"
        );
    }

    #[test]
    fn absolute_urls_ignore_base() {
        let url = resolve_url(Some("https://a.example.com"), "http://b.example.com/x").unwrap();
        assert_eq!(url.as_str(), "http://b.example.com/x");
    }

    #[test]
    fn relative_path_without_base_is_an_error() {
        assert!(resolve_url(None, "/users/1").is_err());
    }
}
