//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GESTAO_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `GESTAO_HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 3000)
//! - `APP_ENV` - `development` or `production` (default: production)
//! - `CORS_ALLOWED_ORIGINS` - Comma-separated origins (default: localhost:3000 and 127.0.0.1:3000)
//! - `STATIC_DIR` - Frontend directory (default: public)
//! - `CNPJ_API_URL` - Company registry base URL (default: ReceitaWS)
//! - `CEP_API_URL` - Postal code base URL (default: `ViaCEP`)
//! - `TRUST_PROXY_HEADERS` - `true` to key rate limits on proxy headers (default: false)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0 to 1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate, 0.0 to 1.0 (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";
const DEFAULT_CNPJ_API_URL: &str = "https://www.receitaws.com.br/v1/cnpj";
const DEFAULT_CEP_API_URL: &str = "https://viacep.com.br/ws";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    /// Whether internal error details may be sent to clients.
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl std::str::FromStr for AppEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("expected development or production, got {other:?}")),
        }
    }
}

/// External lookup API configuration.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Base URL for CNPJ lookups; the CNPJ is appended as a path segment.
    pub cnpj_api_url: String,
    /// Base URL for CEP lookups; `/{cep}/json/` is appended.
    pub cep_api_url: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            cnpj_api_url: DEFAULT_CNPJ_API_URL.to_owned(),
            cep_api_url: DEFAULT_CEP_API_URL.to_owned(),
        }
    }
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Deployment environment
    pub app_env: AppEnv,
    /// Origins allowed by CORS
    pub cors_allowed_origins: Vec<String>,
    /// Directory holding the static frontend
    pub static_dir: PathBuf,
    /// External lookup endpoints
    pub lookup: LookupConfig,
    /// Key rate limits on reverse-proxy headers instead of the peer address
    pub trust_proxy_headers: bool,
    /// Emit JSON logs instead of text
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("GESTAO_DATABASE_URL")?;
        let host = get_env_or_default("GESTAO_HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("GESTAO_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;
        let app_env = get_env_or_default("APP_ENV", "production")
            .parse::<AppEnv>()
            .map_err(|e| ConfigError::InvalidEnvVar("APP_ENV".to_string(), e))?;
        let cors_allowed_origins =
            parse_origins(&get_env_or_default("CORS_ALLOWED_ORIGINS", DEFAULT_CORS_ORIGINS));
        let static_dir = PathBuf::from(get_env_or_default("STATIC_DIR", "public"));

        let lookup = LookupConfig {
            cnpj_api_url: trim_base_url(&get_env_or_default("CNPJ_API_URL", DEFAULT_CNPJ_API_URL)),
            cep_api_url: trim_base_url(&get_env_or_default("CEP_API_URL", DEFAULT_CEP_API_URL)),
        };

        let trust_proxy_headers = parse_flag("TRUST_PROXY_HEADERS")?;
        let json_logs = get_optional_env("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));

        let sentry_dsn = get_optional_env("SENTRY_DSN").filter(|dsn| !dsn.is_empty());
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = parse_rate("SENTRY_SAMPLE_RATE", 1.0)?;
        let sentry_traces_sample_rate = parse_rate("SENTRY_TRACES_SAMPLE_RATE", 0.1)?;

        Ok(Self {
            database_url,
            host,
            port,
            app_env,
            cors_allowed_origins,
            static_dir,
            lookup,
            trust_proxy_headers,
            json_logs,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a 0.0..=1.0 sample rate.
fn parse_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    let rate = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ));
    }
    Ok(rate)
}

/// Parse a boolean flag; unset means false.
fn parse_flag(key: &str) -> Result<bool, ConfigError> {
    get_optional_env(key).map_or(Ok(false), |raw| parse_bool(key, &raw))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "" | "0" | "false" | "no" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected true or false (got {other})"),
        )),
    }
}

/// Split a comma-separated origin list, dropping blanks and trailing slashes.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_owned)
        .collect()
}

fn trim_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}
