use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Signing secret used when `JWT_SECRET` is unset. Refused in production.
pub const DEV_JWT_SECRET: &str = "apiary-development-secret-change-me";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Without a URL the server runs on the in-memory store (outside production).
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Public listing page size when `size` is not given.
    pub page_size: u32,
    pub max_page_size: u32,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub cors_origins: Vec<String>,
    /// Adds `Secure` to the session cookie.
    pub cookie_secure: bool,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set to a non-default value in production")]
    DevelopmentSecret,

    #[error("DATABASE_URL is required in production")]
    MissingDatabaseUrl,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        Self::preset(environment).with_overrides(|key| env::var(key).ok())
    }

    pub fn preset(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    /// Apply overrides from a variable lookup; unparsable values keep the preset.
    pub fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        // Database overrides
        if let Some(v) = var("DATABASE_URL").filter(|v| !v.trim().is_empty()) {
            self.database.url = Some(v);
        }
        if let Some(v) = var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Server overrides
        if let Some(v) = var("APIARY_HOST") {
            self.server.host = v;
        }
        if let Some(v) = var("APIARY_PORT").or_else(|| var("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // API overrides
        if let Some(v) = var("API_PAGE_SIZE") {
            self.api.page_size = v.parse().unwrap_or(self.api.page_size);
        }
        if let Some(v) = var("API_MAX_PAGE_SIZE") {
            self.api.max_page_size = v.parse().unwrap_or(self.api.max_page_size);
        }
        if let Some(v) = var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Security overrides
        if let Some(v) = var("JWT_SECRET").filter(|v| !v.is_empty()) {
            self.security.jwt_secret = v;
        }
        if let Some(v) = var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Some(v) = var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = var("SECURITY_COOKIE_SECURE") {
            self.security.cookie_secure = v.parse().unwrap_or(self.security.cookie_secure);
        }

        self.api.max_page_size = self.api.max_page_size.max(1);
        self.api.page_size = self.api.page_size.clamp(1, self.api.max_page_size);
        self
    }

    /// Refuse settings that must never reach production.
    pub fn ensure_deployable(&self) -> Result<(), ConfigError> {
        if self.environment != Environment::Production {
            return Ok(());
        }
        if self.security.jwt_secret == DEV_JWT_SECRET {
            return Err(ConfigError::DevelopmentSecret);
        }
        if self.database.url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        Ok(())
    }

    pub fn jwt_expiry_secs(&self) -> i64 {
        (self.security.jwt_expiry_hours as i64).saturating_mul(3600)
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                page_size: 10,
                max_page_size: 40,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                cookie_secure: false,
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                page_size: 10,
                max_page_size: 40,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24,
                cors_origins: vec!["https://staging.example.com".to_string()],
                cookie_secure: true,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                page_size: 10,
                max_page_size: 40,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 4,
                cors_origins: vec!["https://app.example.com".to_string()],
                cookie_secure: true,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.api.page_size, 10);
        assert_eq!(config.api.max_page_size, 40);
        assert!(config.database.url.is_none());
        assert!(config.ensure_deployable().is_ok());
    }

    #[test]
    fn test_production_refuses_development_secret() {
        let config = AppConfig::production()
            .with_overrides(lookup(&[("DATABASE_URL", "postgres://localhost/apiary")]));
        assert_eq!(config.ensure_deployable(), Err(ConfigError::DevelopmentSecret));

        let config = config.with_overrides(lookup(&[("JWT_SECRET", "s3cret-value")]));
        assert!(config.ensure_deployable().is_ok());
    }

    #[test]
    fn test_production_requires_database() {
        let config = AppConfig::production().with_overrides(lookup(&[("JWT_SECRET", "s3cret-value")]));
        assert_eq!(config.ensure_deployable(), Err(ConfigError::MissingDatabaseUrl));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::development().with_overrides(lookup(&[
            ("PORT", "9100"),
            ("API_PAGE_SIZE", "25"),
            ("API_MAX_PAGE_SIZE", "not-a-number"),
            ("SECURITY_CORS_ORIGINS", "https://a.test, https://b.test,"),
        ]));
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.api.page_size, 25);
        assert_eq!(config.api.max_page_size, 40);
        assert_eq!(config.security.cors_origins, vec!["https://a.test", "https://b.test"]);
    }

    #[test]
    fn test_page_size_is_capped() {
        let config = AppConfig::development().with_overrides(lookup(&[("API_PAGE_SIZE", "500")]));
        assert_eq!(config.api.page_size, 40);
    }
}
