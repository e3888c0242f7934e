use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Signing secret used when `JWT_SECRET` is not set. Refused in production.
pub const DEV_JWT_SECRET: &str = "mock-bill-api-dev-secret";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub captcha: CaptchaConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Path prefix the handler table is mounted under, e.g. `/api`
    pub route_prefix: String,
    pub enable_cors: bool,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptchaConfig {
    pub code_length: usize,
    pub id_length: usize,
    pub ttl_secs: i64,
    /// Zero disables the background sweeper; expired sessions are then only
    /// removed when someone tries to verify them.
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(StoreBackend::Memory),
            "postgres" | "postgresql" | "pg" => Ok(StoreBackend::Postgres),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
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
        // Server overrides
        if let Some(v) = env::var("MOCK_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("API_ROUTE_PREFIX") {
            self.server.route_prefix = v;
        }
        if let Ok(v) = env::var("API_ENABLE_CORS") {
            self.server.enable_cors = v.parse().unwrap_or(self.server.enable_cors);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.server.enable_request_logging = v.parse().unwrap_or(self.server.enable_request_logging);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            if !v.is_empty() {
                self.security.jwt_secret = v;
            }
        }
        if let Ok(v) = env::var("SECURITY_ACCESS_TOKEN_TTL_SECS") {
            self.security.access_token_ttl_secs = v.parse().unwrap_or(self.security.access_token_ttl_secs);
        }
        if let Ok(v) = env::var("SECURITY_REFRESH_TOKEN_TTL_SECS") {
            self.security.refresh_token_ttl_secs = v.parse().unwrap_or(self.security.refresh_token_ttl_secs);
        }

        // Captcha overrides
        if let Ok(v) = env::var("CAPTCHA_CODE_LENGTH") {
            self.captcha.code_length = v.parse().unwrap_or(self.captcha.code_length);
        }
        if let Ok(v) = env::var("CAPTCHA_TTL_SECS") {
            self.captcha.ttl_secs = v.parse().unwrap_or(self.captcha.ttl_secs);
        }
        if let Ok(v) = env::var("CAPTCHA_SWEEP_INTERVAL_SECS") {
            self.captcha.sweep_interval_secs = v.parse().unwrap_or(self.captcha.sweep_interval_secs);
        }

        // Store overrides
        if let Ok(v) = env::var("STORE_BACKEND") {
            self.store.backend = v.parse().unwrap_or(self.store.backend);
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.store.database_url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.store.max_connections = v.parse().unwrap_or(self.store.max_connections);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                route_prefix: "/api".to_string(),
                enable_cors: true,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                access_token_ttl_secs: 2 * 60 * 60, // 2 hours
                refresh_token_ttl_secs: 7 * 24 * 60 * 60, // 1 week
            },
            captcha: CaptchaConfig {
                code_length: 6,
                id_length: 16,
                ttl_secs: 5 * 60,
                sweep_interval_secs: 0,
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                database_url: None,
                max_connections: 5,
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                route_prefix: "/api".to_string(),
                enable_cors: true,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                access_token_ttl_secs: 30 * 60,
                refresh_token_ttl_secs: 24 * 60 * 60,
            },
            captcha: CaptchaConfig {
                code_length: 6,
                id_length: 16,
                ttl_secs: 5 * 60,
                sweep_interval_secs: 60,
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                database_url: None,
                max_connections: 10,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                route_prefix: "/api".to_string(),
                enable_cors: false,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                access_token_ttl_secs: 15 * 60,
                refresh_token_ttl_secs: 24 * 60 * 60,
            },
            captcha: CaptchaConfig {
                code_length: 6,
                id_length: 16,
                ttl_secs: 3 * 60,
                sweep_interval_secs: 60,
            },
            store: StoreConfig {
                backend: StoreBackend::Postgres,
                database_url: None,
                max_connections: 20,
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
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.captcha.code_length, 6);
        assert_eq!(config.captcha.id_length, 16);
        assert!(config.security.access_token_ttl_secs < config.security.refresh_token_ttl_secs);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.store.backend, StoreBackend::Postgres);
        assert!(!config.server.enable_cors);
        assert!(config.captcha.sweep_interval_secs > 0);
    }

    #[test]
    fn store_backend_parses_aliases() {
        assert_eq!("PG".parse::<StoreBackend>(), Ok(StoreBackend::Postgres));
        assert_eq!(" memory ".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("redis".parse::<StoreBackend>().is_err());
    }
}
