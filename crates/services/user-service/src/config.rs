//! User service configuration.

use std::env;

use common::{CsrfConfig, DatabaseConfig};

/// User service configuration.
#[derive(Debug, Clone)]
pub struct UserServiceConfig {
    pub database: DatabaseConfig,
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Origin allowed to call the API with credentials; any origin when unset
    pub cors_allowed_origin: Option<String>,
    pub csrf: CsrfConfig,
}

impl UserServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            database: DatabaseConfig {
                url: env::var("USER_SERVICE_DATABASE_URL")
                    .or_else(|_| env::var("DATABASE_URL"))
                    .unwrap_or(defaults.database.url),
                ..defaults.database
            },
            host: env::var("USER_SERVICE_HOST").unwrap_or(defaults.host),
            port: env::var("USER_SERVICE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .ok()
                .filter(|origin| !origin.trim().is_empty()),
            csrf: CsrfConfig {
                enabled: env_flag("CSRF_ENABLED").unwrap_or(defaults.csrf.enabled),
                cookie_secure: env_flag("CSRF_COOKIE_SECURE")
                    .unwrap_or(defaults.csrf.cookie_secure),
            },
        }
    }

    /// Config for tests: in-memory SQLite, token check switched off.
    pub fn for_tests() -> Self {
        Self {
            database: DatabaseConfig::in_memory(),
            csrf: CsrfConfig {
                enabled: false,
                cookie_secure: false,
            },
            ..Self::default()
        }
    }
}

impl Default for UserServiceConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_allowed_origin: None,
            csrf: CsrfConfig::default(),
        }
    }
}

fn env_flag(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .and_then(|value| match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}
