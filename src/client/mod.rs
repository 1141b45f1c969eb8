//! Typed API request builder.
//!
//! ```rust,ignore
//! let user = api_request(Method::Get, "/users/42")
//!     .base_url(&config.backend.base_url)
//!     .auth(AuthContext::Bearer(session.access_token().to_string()))
//!     .output(User::schema())
//!     .execute(&transport)
//!     .await?;
//! ```
//!
//! The builder is consumed by `execute`, so every request is sent at most
//! once. There are no retries and no timeout beyond the transport's own.

pub mod descriptor;
pub mod error;
pub mod transport;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, COOKIE};
use serde::Serialize;
use serde_json::Value;

use crate::schema::{OutputSchema, RawJson, ValidationError};

pub use descriptor::{resolve_url, Method, RequestDescriptor};
pub use error::{RequestError, TransportError};
pub use transport::{HttpTransport, RawResponse, ReqwestTransport};

/// Which context supplies the credentials for a call
#[derive(Clone, PartialEq, Eq)]
pub enum AuthContext {
    /// Server context: bearer token taken from the session
    Bearer(String),
    /// Browser context: forward the visitor's `Cookie` header
    Cookie(String),
    /// Same-origin credentials, nothing to attach
    SameOrigin,
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthContext::Bearer(_) => write!(f, "Bearer(..)"),
            AuthContext::Cookie(_) => write!(f, "Cookie(..)"),
            AuthContext::SameOrigin => write!(f, "SameOrigin"),
        }
    }
}

/// Start describing a call to `target`, an absolute URL or a path resolved against `.base_url()`.
pub fn api_request(method: Method, target: impl Into<String>) -> ApiRequest<RawJson> {
    ApiRequest {
        method,
        target: target.into(),
        base_url: None,
        headers: HeaderMap::new(),
        body: None,
        schema: RawJson,
        error: None,
    }
}

#[must_use = "a request does nothing until `.execute()` is called"]
#[derive(Debug)]
pub struct ApiRequest<S = RawJson> {
    method: Method,
    target: String,
    base_url: Option<String>,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    schema: S,
    // First builder error, reported by build/execute
    error: Option<String>,
}

impl<S> ApiRequest<S> {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set a header, replacing any previous value. Names are case-insensitive.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let header_name = match HeaderName::from_bytes(name.as_bytes()) {
            Ok(header_name) => header_name,
            Err(e) => {
                self.fail(format!("invalid header name '{}': {}", name, e));
                return self;
            }
        };

        match HeaderValue::from_str(value) {
            Ok(header_value) => {
                self.headers.insert(header_name, header_value);
            }
            Err(e) => self.fail(format!("invalid value for header '{}': {}", name, e)),
        }
        self
    }

    /// Merge a header map. Each name in `headers` replaces what was set
    /// before, keeping every value it carries (e.g. repeated `Accept`).
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        for name in headers.keys() {
            self.headers.remove(name);
        }
        for (name, value) in headers.iter() {
            self.headers.append(name.clone(), value.clone());
        }
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header(AUTHORIZATION.as_str(), &format!("Bearer {}", token))
    }

    pub fn cookie(self, cookie_header: &str) -> Self {
        self.header(COOKIE.as_str(), cookie_header)
    }

    pub fn auth(self, context: AuthContext) -> Self {
        match context {
            AuthContext::Bearer(token) => self.bearer(&token),
            AuthContext::Cookie(cookie) => self.cookie(&cookie),
            AuthContext::SameOrigin => self,
        }
    }

    /// Serialize `body` as JSON and set `Content-Type: application/json`.
    pub fn json_body<B: Serialize>(mut self, body: &B) -> Self {
        match serde_json::to_vec(body) {
            Ok(bytes) => {
                self.body = Some(bytes);
                self.headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            Err(e) => self.fail(format!("body serialization failed: {}", e)),
        }
        self
    }

    /// Attach the schema the response body must satisfy.
    pub fn output<O: OutputSchema>(self, schema: O) -> ApiRequest<O> {
        ApiRequest {
            method: self.method,
            target: self.target,
            base_url: self.base_url,
            headers: self.headers,
            body: self.body,
            schema,
            error: self.error,
        }
    }

    pub fn build(&self) -> Result<RequestDescriptor, RequestError> {
        if let Some(error) = &self.error {
            return Err(RequestError::InvalidRequest(error.clone()));
        }

        let url = resolve_url(self.base_url.as_deref(), &self.target).map_err(RequestError::InvalidRequest)?;

        Ok(RequestDescriptor {
            method: self.method,
            url,
            headers: self.headers.clone(),
            body: self.body.clone(),
        })
    }

    fn fail(&mut self, error: String) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

impl<S: OutputSchema> ApiRequest<S> {
    /// Send the request and validate the body against the attached schema.
    pub async fn execute(self, transport: &dyn HttpTransport) -> Result<S::Output, RequestError> {
        let descriptor = self.build()?;
        let method = descriptor.method;
        let url = descriptor.url.clone();

        tracing::debug!("{} {}", method, url);
        let response = transport.send(descriptor).await?;

        if !response.is_success() {
            tracing::debug!("{} {} returned {}", method, url, response.status);
            return Err(RequestError::Http {
                status: response.status,
                body: response.text(),
            });
        }

        let value = parse_body(&response.body)?;
        self.schema.validate(value).map_err(|e| {
            tracing::warn!("{} {} returned a body that failed validation: {}", method, url, e);
            RequestError::Validation(e)
        })
    }
}

fn parse_body(body: &[u8]) -> Result<Value, ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| ValidationError::new("$", "JSON document", format!("unparseable body ({})", e)))
}
