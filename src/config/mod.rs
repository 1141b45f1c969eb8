use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub session: SessionConfig,
    pub cookies: CookieConfig,
    pub routes: RouteConfig,
    pub assets: AssetConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL every relative backend path is resolved against
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub secret: String,
    pub lifetime_secs: i64,
    /// Sessions with less than this many seconds left are re-issued on the next guarded request
    pub refresh_window_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    /// First secret signs, every secret verifies
    pub secrets: Vec<String>,
    pub domain: Option<String>,
    pub secure: bool,
    pub locales: Vec<String>,
    pub default_locale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    pub login_path: String,
    pub landing_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    pub dir: String,
    pub max_age_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides (PORT kept for platform deployments)
        if let Some(port) = env::var("PORTAL_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|v| v.parse().ok())
        {
            self.server.port = port;
        }

        // Backend overrides
        if let Ok(v) = env::var("PORTAL_BACKEND_URL") {
            self.backend.base_url = v;
        }

        // Session overrides
        if let Ok(v) = env::var("PORTAL_SESSION_COOKIE") {
            self.session.cookie_name = v;
        }
        if let Ok(v) = env::var("PORTAL_SESSION_SECRET") {
            self.session.secret = v;
        }
        if let Ok(v) = env::var("PORTAL_SESSION_LIFETIME_SECS") {
            self.session.lifetime_secs = v.parse().unwrap_or(self.session.lifetime_secs);
        }
        if let Ok(v) = env::var("PORTAL_SESSION_REFRESH_WINDOW_SECS") {
            self.session.refresh_window_secs = v.parse().unwrap_or(self.session.refresh_window_secs);
        }

        // Cookie overrides
        if let Ok(v) = env::var("PORTAL_COOKIE_SECRETS") {
            self.cookies.secrets = split_list(&v);
        }
        if let Ok(v) = env::var("PORTAL_COOKIE_DOMAIN") {
            self.cookies.domain = if v.trim().is_empty() { None } else { Some(v) };
        }
        if let Ok(v) = env::var("PORTAL_COOKIE_SECURE") {
            self.cookies.secure = v.parse().unwrap_or(self.cookies.secure);
        }
        if let Ok(v) = env::var("PORTAL_LOCALES") {
            self.cookies.locales = split_list(&v);
        }
        if let Ok(v) = env::var("PORTAL_DEFAULT_LOCALE") {
            self.cookies.default_locale = v;
        }

        // Route overrides
        if let Ok(v) = env::var("PORTAL_LOGIN_PATH") {
            self.routes.login_path = v;
        }
        if let Ok(v) = env::var("PORTAL_LANDING_PATH") {
            self.routes.landing_path = v;
        }

        // Asset overrides
        if let Ok(v) = env::var("PORTAL_ASSET_DIR") {
            self.assets.dir = v;
        }
        if let Ok(v) = env::var("PORTAL_ASSET_MAX_AGE_SECS") {
            self.assets.max_age_secs = v.parse().unwrap_or(self.assets.max_age_secs);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            backend: BackendConfig {
                base_url: "http://localhost:8080/api".to_string(),
            },
            session: SessionConfig {
                cookie_name: "portal_session".to_string(),
                secret: "development-session-secret".to_string(),
                lifetime_secs: 60 * 60 * 24 * 7, // 1 week
                refresh_window_secs: 60 * 60 * 24,
            },
            cookies: CookieConfig {
                secrets: vec!["development-cookie-secret".to_string()],
                domain: None,
                secure: false,
                locales: default_locales(),
                default_locale: "en".to_string(),
            },
            routes: default_routes(),
            assets: AssetConfig {
                dir: "public".to_string(),
                max_age_secs: 60,
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 3000 },
            backend: BackendConfig {
                base_url: "https://api.staging.example.com".to_string(),
            },
            session: SessionConfig {
                cookie_name: "portal_session".to_string(),
                secret: String::new(),
                lifetime_secs: 60 * 60 * 24,
                refresh_window_secs: 60 * 60 * 4,
            },
            cookies: CookieConfig {
                secrets: Vec::new(),
                domain: Some("portal.staging.example.com".to_string()),
                secure: true,
                locales: default_locales(),
                default_locale: "en".to_string(),
            },
            routes: default_routes(),
            assets: AssetConfig {
                dir: "public".to_string(),
                max_age_secs: 60 * 60,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 3000 },
            backend: BackendConfig {
                base_url: "https://api.example.com".to_string(),
            },
            session: SessionConfig {
                cookie_name: "portal_session".to_string(),
                secret: String::new(),
                lifetime_secs: 60 * 60 * 8,
                refresh_window_secs: 60 * 60,
            },
            cookies: CookieConfig {
                secrets: Vec::new(),
                domain: Some("portal.example.com".to_string()),
                secure: true,
                locales: default_locales(),
                default_locale: "en".to_string(),
            },
            routes: default_routes(),
            assets: AssetConfig {
                dir: "public".to_string(),
                max_age_secs: 60 * 60 * 24 * 365,
            },
        }
    }
}

fn default_locales() -> Vec<String> {
    vec!["en".to_string(), "fr".to_string(), "de".to_string()]
}

fn default_routes() -> RouteConfig {
    RouteConfig {
        login_path: "/login".to_string(),
        landing_path: "/".to_string(),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(!config.session.secret.is_empty());
        assert!(!config.cookies.secure);
        assert_eq!(config.routes.login_path, "/login");
        assert_eq!(config.routes.landing_path, "/");
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        // Secrets must come from the environment outside development
        assert!(config.session.secret.is_empty());
        assert!(config.cookies.secrets.is_empty());
        assert!(config.cookies.secure);
        assert_eq!(config.assets.max_age_secs, 31_536_000);
    }

    #[test]
    fn test_split_list_drops_blanks() {
        assert_eq!(split_list("a, b,,c "), vec!["a", "b", "c"]);
    }
}
