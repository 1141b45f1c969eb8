// Signed locale and theme cookies

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{CookieJar, SetCookie, SignatureError, SignedCookies};
use crate::config::CookieConfig;

pub const LOCALE_COOKIE: &str = "portal_locale";
pub const THEME_COOKIE: &str = "portal_theme";

const PREFERENCE_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("Unknown theme '{}'", other)),
        }
    }
}

/// Reads and writes the signed preference cookies for one host.
#[derive(Debug, Clone)]
pub struct Preferences {
    signer: SignedCookies,
    domain: Option<String>,
    secure: bool,
    locales: Vec<String>,
    default_locale: String,
}

impl Preferences {
    pub fn from_config(config: &CookieConfig) -> Self {
        Self {
            signer: SignedCookies::new(config.secrets.clone()),
            domain: config.domain.clone(),
            secure: config.secure,
            locales: config.locales.clone(),
            default_locale: config.default_locale.clone(),
        }
    }

    pub fn is_supported_locale(&self, locale: &str) -> bool {
        self.locales.iter().any(|l| l == locale)
    }

    /// Signed cookie first, then `Accept-Language`, then the default locale.
    pub fn locale(&self, headers: &HeaderMap) -> String {
        let jar = CookieJar::from_headers(headers);
        if let Some(locale) = self.verified(&jar, LOCALE_COOKIE) {
            if self.is_supported_locale(locale) {
                return locale.to_string();
            }
        }

        headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .and_then(|accept| self.negotiate(accept))
            .unwrap_or_else(|| self.default_locale.clone())
    }

    pub fn theme(&self, headers: &HeaderMap) -> Theme {
        let jar = CookieJar::from_headers(headers);
        self.verified(&jar, THEME_COOKIE)
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }

    pub fn locale_cookie(&self, locale: &str) -> Result<SetCookie, SignatureError> {
        self.cookie(LOCALE_COOKIE, locale)
    }

    pub fn theme_cookie(&self, theme: Theme) -> Result<SetCookie, SignatureError> {
        self.cookie(THEME_COOKIE, theme.as_str())
    }

    fn cookie(&self, name: &str, value: &str) -> Result<SetCookie, SignatureError> {
        Ok(SetCookie::portal(name, self.signer.sign(value)?)
            .domain(self.domain.clone())
            .secure(self.secure)
            .max_age(PREFERENCE_MAX_AGE_SECS))
    }

    fn verified<'a>(&self, jar: &'a CookieJar, name: &str) -> Option<&'a str> {
        let raw = jar.get(name)?;
        match self.signer.verify(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!("Ignoring {} cookie: {}", name, e);
                None
            }
        }
    }

    // Quality values are ignored; header order is the client's preference order
    fn negotiate(&self, accept: &str) -> Option<String> {
        accept
            .split(',')
            .filter_map(|part| part.split(';').next())
            .map(|tag| tag.trim().to_ascii_lowercase())
            .find_map(|tag| {
                let primary = tag.split('-').next().unwrap_or(&tag).to_string();
                if self.is_supported_locale(&tag) {
                    Some(tag)
                } else if self.is_supported_locale(&primary) {
                    Some(primary)
                } else {
                    None
                }
            })
    }
}
