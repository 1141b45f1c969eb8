//! Cookie parsing, `Set-Cookie` construction, and HMAC-signed values.
//!
//! Request cookies are read from the `Cookie` header into a [`CookieJar`].
//! Outgoing cookies are described with [`SetCookie`] and rendered into a
//! header value. Preference cookies are signed with [`SignedCookies`].

pub mod preferences;

use axum::http::{header, HeaderMap, HeaderValue};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use std::fmt;

pub use preferences::{Preferences, Theme, LOCALE_COOKIE, THEME_COOKIE};

type HmacSha256 = Hmac<Sha256>;

/// Cookies sent with a request.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: HashMap<String, String>,
}

impl CookieJar {
    /// Parse every `Cookie` header on the request. Unreadable headers are skipped.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut jar = Self::default();
        for value in headers.get_all(header::COOKIE) {
            match value.to_str() {
                Ok(raw) => jar.extend_from_str(raw),
                Err(_) => tracing::debug!("Skipping non UTF-8 Cookie header"),
            }
        }
        jar
    }

    pub fn parse(raw: &str) -> Self {
        let mut jar = Self::default();
        jar.extend_from_str(raw);
        jar
    }

    fn extend_from_str(&mut self, raw: &str) {
        for pair in raw.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                let value = value.trim().trim_matches('"');
                // First occurrence wins, matching browser ordering by path specificity
                self.cookies
                    .entry(name.to_string())
                    .or_insert_with(|| value.to_string());
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

/// A cookie to be set on the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    name: String,
    value: String,
    path: Option<String>,
    domain: Option<String>,
    max_age: Option<i64>,
    http_only: bool,
    secure: bool,
    same_site: Option<SameSite>,
}

impl SetCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            max_age: None,
            http_only: false,
            secure: false,
            same_site: None,
        }
    }

    /// Httponly, `SameSite=Lax`, root path. The shape every portal cookie uses.
    pub fn portal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, value)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
    }

    /// A cookie that tells the browser to drop `name`.
    pub fn removal(name: impl Into<String>) -> Self {
        Self::portal(name, "").max_age(0)
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn domain(mut self, domain: Option<String>) -> Self {
        self.domain = domain;
        self
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Render as a `Set-Cookie` header value. Fails only if the value contains
    /// bytes that are not valid in a header.
    pub fn to_header_value(&self) -> Result<HeaderValue, header::InvalidHeaderValue> {
        HeaderValue::from_str(&self.to_string())
    }
}

impl fmt::Display for SetCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some(path) = &self.path {
            write!(f, "; Path={}", path)?;
        }
        if let Some(domain) = &self.domain {
            write!(f, "; Domain={}", domain)?;
        }
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={}", max_age)?;
        }
        if self.http_only {
            write!(f, "; HttpOnly")?;
        }
        if self.secure {
            write!(f, "; Secure")?;
        }
        if let Some(same_site) = self.same_site {
            write!(f, "; SameSite={}", same_site)?;
        }
        Ok(())
    }
}

/// Append a `Set-Cookie` header. Cookies that cannot be encoded are logged and dropped.
pub fn append_set_cookie(headers: &mut HeaderMap, cookie: &SetCookie) {
    match cookie.to_header_value() {
        Ok(value) => {
            headers.append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::error!("Dropping unencodable cookie '{}': {}", cookie.name(), e),
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("No cookie signing secret configured")]
    NoSecret,
    #[error("Cookie value is not signed")]
    Unsigned,
    #[error("Cookie signature does not match")]
    BadSignature,
}

/// HMAC-SHA256 signing for cookie values, rendered as `value.hexsig`.
///
/// The first secret signs; every secret is tried on verification so secrets
/// can be rotated without logging everyone out.
#[derive(Clone)]
pub struct SignedCookies {
    secrets: Vec<String>,
}

impl fmt::Debug for SignedCookies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedCookies")
            .field("secrets", &self.secrets.len())
            .finish()
    }
}

impl SignedCookies {
    pub fn new(secrets: Vec<String>) -> Self {
        Self {
            secrets: secrets.into_iter().filter(|s| !s.is_empty()).collect(),
        }
    }

    pub fn sign(&self, value: &str) -> Result<String, SignatureError> {
        let secret = self.secrets.first().ok_or(SignatureError::NoSecret)?;
        let mac = mac_for(secret, value);
        Ok(format!("{}.{}", value, hex::encode(mac.finalize().into_bytes())))
    }

    pub fn verify<'a>(&self, signed: &'a str) -> Result<&'a str, SignatureError> {
        if self.secrets.is_empty() {
            return Err(SignatureError::NoSecret);
        }
        let (value, signature) = signed.rsplit_once('.').ok_or(SignatureError::Unsigned)?;
        let signature = hex::decode(signature).map_err(|_| SignatureError::BadSignature)?;

        let matched = self
            .secrets
            .iter()
            .any(|secret| mac_for(secret, value).verify_slice(&signature).is_ok());

        if matched {
            Ok(value)
        } else {
            Err(SignatureError::BadSignature)
        }
    }
}

fn mac_for(secret: &str, value: &str) -> HmacSha256 {
    // HMAC accepts keys of any length, so this cannot fail
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC key of any length is valid"));
    mac.update(value.as_bytes());
    mac
}
