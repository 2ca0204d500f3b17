//! Centralized configuration for api-server.
//!
//! All environment variables are loaded and validated at startup to fail fast
//! on misconfiguration rather than at request time.

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use domain::generate::DEFAULT_ALIAS_LENGTH;
use domain::MAX_ALIAS_LEN;

/// Deployment environment; picks default log level and format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Local,
    Dev,
    Prod,
}

impl AppEnv {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Some(Self::Local),
            "dev" => Some(Self::Dev),
            "prod" => Some(Self::Prod),
            _ => None,
        }
    }

    /// Filter directive used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        match self {
            Self::Local | Self::Dev => "debug",
            Self::Prod => "info",
        }
    }
}

/// Storage backend provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageProvider {
    /// In-memory storage (data lost on restart)
    Memory,
    /// SQLite file-based storage
    Sqlite,
}

impl StorageProvider {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error for {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Server configuration loaded from environment variables.
///
/// All fields are validated at construction time.
#[derive(Debug, Clone)]
pub struct Config {
    pub env: AppEnv,
    /// Listen address (default: 0.0.0.0:8080)
    pub address: SocketAddr,
    /// Per-request timeout (default: 4s)
    pub request_timeout: Duration,
    pub storage_provider: StorageProvider,
    /// SQLite database path (when using sqlite storage)
    pub storage_path: PathBuf,
    /// Length of generated aliases (default: 6)
    pub alias_length: usize,
    /// Extra attempts with a fresh generated alias on conflict (default: 0)
    pub alias_retries: u32,
    pub log_format: LogFormat,
    /// Custom shortlink domain for generated URLs
    pub shortlink_domain: Option<String>,
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// Fails fast on invalid configuration.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        // Environment
        let env = match var("APP_ENV") {
            Some(s) => AppEnv::parse(&s).ok_or_else(|| ConfigError {
                field: "APP_ENV",
                message: format!("expected local, dev or prod, got '{}'", s),
            })?,
            None => AppEnv::Local,
        };

        // Listen address
        let address_str = var("HTTP_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".into());
        let address = address_str.parse().map_err(|e| ConfigError {
            field: "HTTP_ADDRESS",
            message: format!("invalid socket address '{}': {}", address_str, e),
        })?;

        // Request timeout
        let request_timeout = Duration::from_secs(parse_num(&var, "HTTP_TIMEOUT", 4u64)?);
        if request_timeout.is_zero() {
            return Err(ConfigError {
                field: "HTTP_TIMEOUT",
                message: "must be at least 1 second".into(),
            });
        }

        // Storage
        let storage_provider = match var("STORAGE_PROVIDER") {
            Some(s) => StorageProvider::parse(&s).ok_or_else(|| ConfigError {
                field: "STORAGE_PROVIDER",
                message: format!("expected sqlite or memory, got '{}'", s),
            })?,
            None => StorageProvider::Sqlite,
        };
        let storage_path = PathBuf::from(
            var("STORAGE_PATH").unwrap_or_else(|| "./storage/storage.db".into()),
        );

        // Alias generation
        let alias_length = parse_num(&var, "ALIAS_LENGTH", DEFAULT_ALIAS_LENGTH)?;
        if !(1..=MAX_ALIAS_LEN).contains(&alias_length) {
            return Err(ConfigError {
                field: "ALIAS_LENGTH",
                message: format!("must be between 1 and {}", MAX_ALIAS_LEN),
            });
        }
        let alias_retries = parse_num(&var, "ALIAS_RETRIES", 0u32)?;

        // Log format
        let log_format = match var("LOG_FORMAT") {
            Some(s) => LogFormat::from_str(&s),
            None if env == AppEnv::Local => LogFormat::Pretty,
            None => LogFormat::Json,
        };

        // Shortlink domain
        let shortlink_domain = var("SHORTLINK_DOMAIN");

        Ok(Self {
            env,
            address,
            request_timeout,
            storage_provider,
            storage_path,
            alias_length,
            alias_retries,
            log_format,
            shortlink_domain,
        })
    }
}

fn parse_num<T, V>(var: &V, field: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
    V: Fn(&str) -> Option<String>,
{
    match var(field) {
        Some(s) => s.trim().parse().map_err(|e| ConfigError {
            field,
            message: format!("invalid number '{}': {}", s, e),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.env, AppEnv::Local);
        assert_eq!(cfg.address, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.request_timeout, Duration::from_secs(4));
        assert_eq!(cfg.storage_provider, StorageProvider::Sqlite);
        assert_eq!(cfg.storage_path, PathBuf::from("./storage/storage.db"));
        assert_eq!(cfg.alias_length, 6);
        assert_eq!(cfg.alias_retries, 0);
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert_eq!(cfg.shortlink_domain, None);
    }

    #[test]
    fn overrides() {
        let cfg = load(&[
            ("APP_ENV", "PROD"),
            ("HTTP_ADDRESS", "127.0.0.1:9000"),
            ("HTTP_TIMEOUT", "10"),
            ("STORAGE_PROVIDER", "memory"),
            ("STORAGE_PATH", "/tmp/x.db"),
            ("ALIAS_LENGTH", "8"),
            ("ALIAS_RETRIES", "3"),
            ("SHORTLINK_DOMAIN", "https://sho.rt"),
        ])
        .unwrap();
        assert_eq!(cfg.env, AppEnv::Prod);
        assert_eq!(cfg.address.port(), 9000);
        assert_eq!(cfg.request_timeout, Duration::from_secs(10));
        assert_eq!(cfg.storage_provider, StorageProvider::Memory);
        assert_eq!(cfg.storage_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(cfg.alias_length, 8);
        assert_eq!(cfg.alias_retries, 3);
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert_eq!(cfg.shortlink_domain.as_deref(), Some("https://sho.rt"));
    }

    #[test]
    fn explicit_log_format_wins() {
        let cfg = load(&[("APP_ENV", "prod"), ("LOG_FORMAT", "pretty")]).unwrap();
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        let cfg = load(&[("LOG_FORMAT", "JSON")]).unwrap();
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(load(&[("APP_ENV", "staging")]).unwrap_err().field, "APP_ENV");
        assert_eq!(load(&[("HTTP_ADDRESS", "nowhere")]).unwrap_err().field, "HTTP_ADDRESS");
        assert_eq!(load(&[("HTTP_TIMEOUT", "soon")]).unwrap_err().field, "HTTP_TIMEOUT");
        assert_eq!(load(&[("HTTP_TIMEOUT", "0")]).unwrap_err().field, "HTTP_TIMEOUT");
        assert_eq!(load(&[("STORAGE_PROVIDER", "dynamo")]).unwrap_err().field, "STORAGE_PROVIDER");
        assert_eq!(load(&[("ALIAS_LENGTH", "0")]).unwrap_err().field, "ALIAS_LENGTH");
        assert_eq!(load(&[("ALIAS_LENGTH", "65")]).unwrap_err().field, "ALIAS_LENGTH");
        assert_eq!(load(&[("ALIAS_RETRIES", "-1")]).unwrap_err().field, "ALIAS_RETRIES");
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = load(&[("APP_ENV", "  "), ("SHORTLINK_DOMAIN", "")]).unwrap();
        assert_eq!(cfg.env, AppEnv::Local);
        assert_eq!(cfg.shortlink_domain, None);
    }

    #[test]
    fn default_log_filters() {
        assert_eq!(AppEnv::Local.default_log_filter(), "debug");
        assert_eq!(AppEnv::Dev.default_log_filter(), "debug");
        assert_eq!(AppEnv::Prod.default_log_filter(), "info");
    }
}
