use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use portfolio_site_core::engine::DEFAULT_FALLBACK_OWNER;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Where site documents live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::Postgres => "postgres",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            _ => Err(()),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to.
    pub host: String,
    /// Server port to bind to.
    pub port: u16,
    pub store_backend: StoreBackend,
    /// PostgreSQL connection URL. Required for the postgres backend.
    pub database_url: Option<String>,
    /// Maximum database connections in the pool.
    pub db_max_connections: u32,
    /// Minimum database connections in the pool.
    pub db_min_connections: u32,
    /// HS256 secret shared with the identity provider.
    pub jwt_secret: String,
    /// Directory for the file cache. In-memory cache when unset.
    pub cache_dir: Option<PathBuf>,
    /// Owner shown when no site has been published.
    pub fallback_owner: String,
    /// Apply owner access rules to every store call.
    pub enforce_owner_rules: bool,
    /// Allowed CORS origin. Any origin when unset.
    pub cors_origin: Option<String>,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let store_backend = parse_or(&var, "STORE_BACKEND", StoreBackend::Memory)?;
        let database_url = var("DATABASE_URL");
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&var, "PORT", 3030)?,
            store_backend,
            database_url,
            db_max_connections: parse_or(&var, "DB_MAX_CONNECTIONS", 20)?,
            db_min_connections: parse_or(&var, "DB_MIN_CONNECTIONS", 5)?,
            jwt_secret: var("JWT_SECRET")
                .unwrap_or_else(|| "dev-secret-change-me-in-production".to_string()),
            cache_dir: var("CACHE_DIR").map(PathBuf::from),
            fallback_owner: var("FALLBACK_OWNER_UID")
                .unwrap_or_else(|| DEFAULT_FALLBACK_OWNER.to_string()),
            enforce_owner_rules: match var("ENFORCE_OWNER_RULES") {
                Some(value) => parse_flag(&value).ok_or(ConfigError::Invalid {
                    key: "ENFORCE_OWNER_RULES",
                    value,
                })?,
                None => false,
            },
            cors_origin: var("CORS_ORIGIN"),
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match var(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.addr(), "0.0.0.0:3030");
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.fallback_owner, DEFAULT_FALLBACK_OWNER);
        assert!(!config.enforce_owner_rules);
        assert!(config.cache_dir.is_none());
    }

    #[test]
    fn postgres_requires_database_url() {
        assert_eq!(
            load(&[("STORE_BACKEND", "postgres")]).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
        let config = load(&[
            ("STORE_BACKEND", "postgres"),
            ("DATABASE_URL", "postgres://localhost/site"),
            ("ENFORCE_OWNER_RULES", "true"),
        ])
        .unwrap();
        assert_eq!(config.store_backend, StoreBackend::Postgres);
        assert!(config.enforce_owner_rules);
    }

    #[test]
    fn invalid_values_are_reported() {
        assert_eq!(
            load(&[("PORT", "eighty")]).unwrap_err(),
            ConfigError::Invalid {
                key: "PORT",
                value: "eighty".into()
            }
        );
        assert!(matches!(
            load(&[("STORE_BACKEND", "sqlite")]),
            Err(ConfigError::Invalid { key: "STORE_BACKEND", .. })
        ));
        assert!(matches!(
            load(&[("ENFORCE_OWNER_RULES", "maybe")]),
            Err(ConfigError::Invalid { key: "ENFORCE_OWNER_RULES", .. })
        ));
    }
}
