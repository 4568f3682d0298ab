use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::notify::DeliveryMode;

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
    pub auth: AuthConfig,
    pub notifications: NotificationConfig,
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

        let jwt_secret = env::var("APP_JWT_SECRET")
            .unwrap_or_else(|_| "change-this-jwt-secret-in-production".to_string());
        let jwt_issuer = env::var("APP_JWT_ISSUER").unwrap_or_else(|_| "leadflow".to_string());
        let token_ttl_hours = env::var("APP_TOKEN_TTL_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse::<i64>()
            .ok()
            .filter(|hours| *hours > 0)
            .ok_or(ConfigError::InvalidTokenTtl)?;

        let notify_mode = DeliveryMode::parse(
            &env::var("APP_NOTIFY_MODE").unwrap_or_else(|_| "detached".to_string()),
        );
        let sender =
            env::var("APP_SENDER_EMAIL").unwrap_or_else(|_| "noreply@example.com".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            auth: AuthConfig {
                jwt_secret,
                jwt_issuer,
                token_ttl_hours,
                allow_registration: env_flag("APP_ALLOW_REGISTRATION"),
                disabled: env_flag("APP_AUTH_DISABLED"),
                bootstrap_username: env::var("APP_BOOTSTRAP_ADMIN_USERNAME").ok(),
                bootstrap_password: env::var("APP_BOOTSTRAP_ADMIN_PASSWORD").ok(),
            },
            notifications: NotificationConfig {
                mode: notify_mode,
                sender,
            },
        })
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
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

/// Token issuing and admin-guard settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub token_ttl_hours: i64,
    pub allow_registration: bool,
    /// Bypass for local and staged environments.
    pub disabled: bool,
    pub bootstrap_username: Option<String>,
    pub bootstrap_password: Option<String>,
}

/// Outbound notification settings.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub mode: DeliveryMode,
    pub sender: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidTokenTtl,
    InvalidHost { source: std::net::AddrParseError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidTokenTtl => {
                write!(f, "APP_TOKEN_TTL_HOURS must be a positive integer")
            }
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidTokenTtl => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_JWT_SECRET",
            "APP_JWT_ISSUER",
            "APP_TOKEN_TTL_HOURS",
            "APP_ALLOW_REGISTRATION",
            "APP_AUTH_DISABLED",
            "APP_NOTIFY_MODE",
            "APP_SENDER_EMAIL",
            "APP_BOOTSTRAP_ADMIN_USERNAME",
            "APP_BOOTSTRAP_ADMIN_PASSWORD",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.auth.jwt_issuer, "leadflow");
        assert_eq!(config.auth.token_ttl_hours, 24);
        assert!(!config.auth.allow_registration);
        assert!(!config.auth.disabled);
        assert_eq!(config.notifications.mode, DeliveryMode::Detached);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn awaited_notify_mode_parses() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_NOTIFY_MODE", "awaited");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.notifications.mode, DeliveryMode::Awaited);
    }

    #[test]
    fn rejects_non_positive_token_ttl() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_TOKEN_TTL_HOURS", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidTokenTtl)
        ));
    }
}
