use axum::http::HeaderMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::config::{CookieConfig, SessionConfig};
use crate::cookies::{CookieJar, SetCookie};

/// Claims carried inside the signed session cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user) id
    pub sub: String,
    /// Upstream access token forwarded as a bearer token on backend calls
    pub token: String,
    pub sid: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// An authenticated session read from (or about to be written to) the cookie.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub claims: SessionClaims,
    /// The signed cookie value
    pub encoded: String,
}

impl Session {
    pub fn subject(&self) -> &str {
        &self.claims.sub
    }

    pub fn access_token(&self) -> &str {
        &self.claims.token
    }

    pub fn expires_at(&self) -> i64 {
        self.claims.exp
    }
}

// Tokens stay out of logs
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("sub", &self.claims.sub)
            .field("sid", &self.claims.sid)
            .field("exp", &self.claims.exp)
            .finish()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No session cookie")]
    Missing,
    #[error("Session cookie could not be verified: {0}")]
    Malformed(String),
    #[error("Session expired at {0}")]
    Expired(i64),
    #[error("Session secret not configured")]
    InvalidSecret,
    #[error("Session generation error: {0}")]
    Generation(String),
}

/// Signs, verifies, and renders session cookies.
#[derive(Clone)]
pub struct SessionCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    cookie_name: String,
    lifetime_secs: i64,
    refresh_window_secs: i64,
    domain: Option<String>,
    secure: bool,
}

impl fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCodec")
            .field("cookie_name", &self.cookie_name)
            .field("lifetime_secs", &self.lifetime_secs)
            .field("refresh_window_secs", &self.refresh_window_secs)
            .finish()
    }
}

impl SessionCodec {
    pub fn new(session: &SessionConfig, cookies: &CookieConfig) -> Result<Self, SessionError> {
        if session.secret.is_empty() {
            return Err(SessionError::InvalidSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(session.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(session.secret.as_bytes()),
            cookie_name: session.cookie_name.clone(),
            lifetime_secs: session.lifetime_secs,
            refresh_window_secs: session.refresh_window_secs,
            domain: cookies.domain.clone(),
            secure: cookies.secure,
        })
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Create a fresh session, as done by the login callback.
    pub fn issue(&self, subject: &str, access_token: &str, now: i64) -> Result<Session, SessionError> {
        let claims = SessionClaims {
            sub: subject.to_string(),
            token: access_token.to_string(),
            sid: Uuid::new_v4(),
            iat: now,
            exp: now + self.lifetime_secs,
        };
        self.encode(claims)
    }

    pub fn encode(&self, claims: SessionClaims) -> Result<Session, SessionError> {
        let encoded = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| SessionError::Generation(e.to_string()))?;
        Ok(Session { claims, encoded })
    }

    /// Verify a cookie value. Expiry is checked against `now` with no leeway.
    pub fn decode(&self, value: &str, now: i64) -> Result<Session, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = decode::<SessionClaims>(value, &self.decoding_key, &validation)
            .map_err(|e| SessionError::Malformed(e.to_string()))?;

        if data.claims.exp <= now {
            return Err(SessionError::Expired(data.claims.exp));
        }

        Ok(Session {
            claims: data.claims,
            encoded: value.to_string(),
        })
    }

    /// Read the session cookie from request headers.
    pub fn read(&self, headers: &HeaderMap, now: i64) -> Result<Session, SessionError> {
        let jar = CookieJar::from_headers(headers);
        match jar.get(&self.cookie_name) {
            None | Some("") => Err(SessionError::Missing),
            Some(value) => self.decode(value, now),
        }
    }

    /// Re-issue the session, keeping its id, when it is inside the refresh window.
    pub fn refresh_if_due(&self, session: &Session, now: i64) -> Result<Option<Session>, SessionError> {
        if session.claims.exp - now >= self.refresh_window_secs {
            return Ok(None);
        }

        let claims = SessionClaims {
            iat: now,
            exp: now + self.lifetime_secs,
            ..session.claims.clone()
        };
        self.encode(claims).map(Some)
    }

    pub fn cookie(&self, session: &Session) -> SetCookie {
        SetCookie::portal(self.cookie_name.clone(), session.encoded.clone())
            .domain(self.domain.clone())
            .secure(self.secure)
            .max_age(self.lifetime_secs)
    }

    pub fn clear_cookie(&self) -> SetCookie {
        SetCookie::removal(self.cookie_name.clone())
            .domain(self.domain.clone())
            .secure(self.secure)
    }
}
