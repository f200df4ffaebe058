use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::intake::rate_limit::{DEFAULT_MAX_SUBMISSIONS, DEFAULT_WINDOW_SECS};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub intake: IntakeConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            intake: IntakeConfig::load()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Settings for the submission pipeline.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// Shared secret behind the action-scoped submit token.
    pub secret: String,
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: i64,
    /// Public base URL used for redirect targets and login links.
    pub base_url: String,
    pub operator_email: String,
}

impl IntakeConfig {
    fn load() -> Result<Self, ConfigError> {
        let secret = env::var("WELLFORM_INTAKE_SECRET")
            .unwrap_or_else(|_| "wellform-dev-secret".to_string());

        let rate_limit_max = env::var("WELLFORM_RATE_LIMIT_MAX")
            .unwrap_or_else(|_| DEFAULT_MAX_SUBMISSIONS.to_string())
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidRateLimitMax)?;

        let rate_limit_window_secs = env::var("WELLFORM_RATE_LIMIT_WINDOW_SECS")
            .unwrap_or_else(|_| DEFAULT_WINDOW_SECS.to_string())
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidRateLimitWindow)?;

        let base_url = env::var("WELLFORM_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());

        let operator_email = env::var("WELLFORM_OPERATOR_EMAIL")
            .unwrap_or_else(|_| "care-team@wellform.example".to_string());

        Ok(Self {
            secret,
            rate_limit_max,
            rate_limit_window_secs,
            base_url,
            operator_email,
        })
    }

    pub fn rate_limit_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.rate_limit_window_secs)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidRateLimitMax,
    InvalidRateLimitWindow,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidRateLimitMax => {
                write!(f, "WELLFORM_RATE_LIMIT_MAX must be a valid u32")
            }
            ConfigError::InvalidRateLimitWindow => {
                write!(f, "WELLFORM_RATE_LIMIT_WINDOW_SECS must be a valid i64")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
