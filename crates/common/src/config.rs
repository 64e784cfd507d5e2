//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Geocoding configuration.
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    /// Outgoing email configuration.
    #[serde(default)]
    pub email: EmailConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
    /// Emit logs as JSON lines.
    #[serde(default)]
    pub log_json: bool,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Bearer credential configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign access tokens.
    pub jwt_secret: String,
    /// Validity window of an access token, in hours.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,
}

/// Geocoding provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingConfig {
    /// Whether the external provider is queried at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Nominatim-compatible search endpoint.
    #[serde(default = "default_geocoding_endpoint")]
    pub endpoint: String,
    /// User agent sent to the provider.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Latitude of the fallback point used when an address cannot be resolved.
    #[serde(default = "default_fallback_latitude")]
    pub fallback_latitude: f64,
    /// Longitude of the fallback point used when an address cannot be resolved.
    #[serde(default = "default_fallback_longitude")]
    pub fallback_longitude: f64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            endpoint: default_geocoding_endpoint(),
            user_agent: default_user_agent(),
            fallback_latitude: default_fallback_latitude(),
            fallback_longitude: default_fallback_longitude(),
        }
    }
}

/// SMTP configuration for verification codes.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SMTP relay host. Email delivery is disabled when unset.
    #[serde(default)]
    pub smtp_host: Option<String>,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: Option<String>,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: Option<String>,
    /// Sender mailbox, e.g. `Platebook <no-reply@example.com>`.
    #[serde(default = "default_from_address")]
    pub from_address: String,
    /// Lifetime of a verification code, in minutes.
    #[serde(default = "default_code_ttl_minutes")]
    pub code_ttl_minutes: i64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            from_address: default_from_address(),
            code_ttl_minutes: default_code_ttl_minutes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_token_ttl_hours() -> u64 {
    24 * 7
}

const fn default_true() -> bool {
    true
}

fn default_geocoding_endpoint() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}

fn default_user_agent() -> String {
    format!("platebook/{}", env!("CARGO_PKG_VERSION"))
}

const fn default_fallback_latitude() -> f64 {
    10.7769
}

const fn default_fallback_longitude() -> f64 {
    106.7009
}

const fn default_smtp_port() -> u16 {
    587
}

fn default_from_address() -> String {
    "Platebook <no-reply@platebook.example>".to_string()
}

const fn default_code_ttl_minutes() -> i64 {
    10
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `PLATEBOOK_ENV`)
    /// 4. Environment variables with `PLATEBOOK__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("PLATEBOOK_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("PLATEBOOK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("PLATEBOOK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_fills_defaults() {
        let raw = r#"
            [server]
            url = "http://localhost:3000"

            [database]
            url = "postgres://localhost/platebook"

            [auth]
            jwt_secret = "secret"
        "#;

        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.token_ttl_hours, 168);
        assert!(config.geocoding.enabled);
        assert!(config.email.smtp_host.is_none());
        assert_eq!(config.email.code_ttl_minutes, 10);
    }
}
