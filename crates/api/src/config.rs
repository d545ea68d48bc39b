//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use domain::JwtConfig;
use secrecy::SecretString;
use thiserror::Error;

/// Signing secret used when `JWT_SECRET` is unset in a development build.
const DEV_JWT_SECRET: &str = "development-only-secret-change-me-0123456789";

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is unset.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(()),
        }
    }
}

/// Administrator account provisioned at startup.
#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub name: String,
    pub email: String,
    pub password: SecretString,
}

/// Database pool settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: SecretString,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Duration,
}

/// Server configuration.
///
/// Reads from environment variables:
/// - `HOST`, `PORT` (default `0.0.0.0:8080`), `RUST_LOG` (default `info`),
///   `LOG_FORMAT` (`text` or `json`)
/// - `DATABASE_URL`; when unset the in-memory store is used.
///   `DB_MAX_CONNECTIONS` (100), `DB_MIN_CONNECTIONS` (50),
///   `DB_MAX_LIFETIME_SECS` (3600)
/// - `JWT_SECRET` (at least 32 bytes), `JWT_ACCESS_TTL_SECS` (86400),
///   `JWT_REFRESH_TTL_SECS` (86400), `JWT_REFRESHED_ACCESS_TTL_SECS` (900)
/// - `LINE_ITEM_CONCURRENCY` (16), kept below the pool size
/// - `RAJAONGKIR_API_KEY`, `RAJAONGKIR_BASE_URL`
/// - `ADMIN_NAME`, `ADMIN_EMAIL`, `ADMIN_PASSWORD`
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub line_item_concurrency: usize,
    pub rajaongkir_api_key: SecretString,
    pub rajaongkir_base_url: String,
    pub admin: Option<AdminAccount>,
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
    }

    /// Loads configuration from an arbitrary variable source.
    ///
    /// `JWT_SECRET` is required in release builds; debug builds fall back to
    /// a fixed development secret.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let database = match lookup("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig {
                url: SecretString::from(url),
                max_connections: parse(&lookup, "DB_MAX_CONNECTIONS", 100)?,
                min_connections: parse(&lookup, "DB_MIN_CONNECTIONS", 50)?,
                max_lifetime: Duration::from_secs(parse(&lookup, "DB_MAX_LIFETIME_SECS", 3600)?),
            }),
            None => None,
        };

        let secret = match lookup("JWT_SECRET") {
            Some(secret) => secret,
            None if cfg!(debug_assertions) => DEV_JWT_SECRET.to_string(),
            None => return Err(ConfigError::Missing("JWT_SECRET")),
        };
        if secret.len() < domain::auth::MIN_SECRET_LENGTH {
            return Err(ConfigError::Invalid {
                name: "JWT_SECRET",
                value: "<redacted>".to_string(),
            });
        }
        let jwt = JwtConfig {
            secret: SecretString::from(secret),
            access_ttl: Duration::from_secs(parse(
                &lookup,
                "JWT_ACCESS_TTL_SECS",
                defaults.jwt.access_ttl.as_secs(),
            )?),
            refresh_ttl: Duration::from_secs(parse(
                &lookup,
                "JWT_REFRESH_TTL_SECS",
                defaults.jwt.refresh_ttl.as_secs(),
            )?),
            refreshed_access_ttl: Duration::from_secs(parse(
                &lookup,
                "JWT_REFRESHED_ACCESS_TTL_SECS",
                defaults.jwt.refreshed_access_ttl.as_secs(),
            )?),
        };

        let requested: usize = parse(
            &lookup,
            "LINE_ITEM_CONCURRENCY",
            defaults.line_item_concurrency,
        )?;
        let line_item_concurrency = match &database {
            Some(db) => requested.min((db.max_connections as usize).saturating_sub(1)),
            None => requested,
        }
        .max(1);

        let admin = match (lookup("ADMIN_EMAIL"), lookup("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminAccount {
                name: lookup("ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
                email,
                password: SecretString::from(password),
            }),
            _ => None,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse(&lookup, "PORT", defaults.port)?,
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: parse(&lookup, "LOG_FORMAT", defaults.log_format)?,
            database,
            jwt,
            line_item_concurrency,
            rajaongkir_api_key: lookup("RAJAONGKIR_API_KEY")
                .map(SecretString::from)
                .unwrap_or(defaults.rajaongkir_api_key),
            rajaongkir_base_url: lookup("RAJAONGKIR_BASE_URL")
                .unwrap_or(defaults.rajaongkir_base_url),
            admin,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database: None,
            jwt: JwtConfig::new(SecretString::from(DEV_JWT_SECRET.to_string())),
            line_item_concurrency: domain::order::DEFAULT_LINE_CONCURRENCY,
            rajaongkir_api_key: SecretString::from(String::new()),
            rajaongkir_base_url: courier::DEFAULT_BASE_URL.to_string(),
            admin: None,
        }
    }
}
