use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::workflows::grants::applications::TransitionPolicy;

/// Default per-document upload cap (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

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

/// Top-level configuration for the portal.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub storage: StorageConfig,
    pub lifecycle: LifecycleConfig,
    pub scoring: ScoringConfig,
    pub seed_demo: bool,
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

        let upload_dir =
            PathBuf::from(env::var("APP_UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()));
        let max_upload_bytes = match env::var("APP_MAX_UPLOAD_BYTES") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|bytes| *bytes > 0)
                .ok_or(ConfigError::InvalidNumber {
                    key: "APP_MAX_UPLOAD_BYTES",
                })?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let enforce_transitions = parse_flag("APP_ENFORCE_TRANSITIONS")?;
        let seed_demo = parse_flag("APP_SEED_DEMO")?;

        let priority_url = env::var("APP_PRIORITY_SERVICE_URL")
            .unwrap_or_else(|_| "http://localhost:8001".to_string());
        let fraud_url = env::var("APP_FRAUD_SERVICE_URL")
            .unwrap_or_else(|_| "http://localhost:8002".to_string());
        let timeout_secs = match env::var("APP_SCORING_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber {
                    key: "APP_SCORING_TIMEOUT_SECS",
                })?,
            Err(_) => 10,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            storage: StorageConfig {
                upload_dir,
                max_upload_bytes,
            },
            lifecycle: LifecycleConfig {
                enforce_transitions,
            },
            scoring: ScoringConfig {
                priority_url,
                fraud_url,
                timeout: Duration::from_secs(timeout_secs.max(1)),
            },
            seed_demo,
        })
    }
}

fn parse_flag(key: &'static str) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(ConfigError::InvalidFlag { key }),
        },
        Err(_) => Ok(false),
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

/// Where uploaded application documents land and how large they may be.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

/// Status lifecycle switches.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleConfig {
    pub enforce_transitions: bool,
}

impl LifecycleConfig {
    pub fn transition_policy(&self) -> TransitionPolicy {
        if self.enforce_transitions {
            TransitionPolicy::Enforced
        } else {
            TransitionPolicy::Permissive
        }
    }
}

/// Endpoints of the external priority and fraud-detection services.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub priority_url: String,
    pub fraud_url: String,
    pub timeout: Duration,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
    InvalidFlag { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a positive integer")
            }
            ConfigError::InvalidFlag { key } => {
                write!(f, "{key} must be true/false (or 1/0, yes/no, on/off)")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidFlag { .. } => None,
        }
    }
}
