use std::{env, path::Path, str::FromStr, time::Duration};

use cookie::SameSite;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
    #[error(transparent)]
    Env(#[from] env::VarError),
    #[error("failed to load .env: {0}")]
    Dotenv(#[from] dotenvy::Error),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub sweeper: SweeperConfig,
    pub relay: RelayConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweeperConfig {
    pub processed_retention_days: u32,
    pub error_retention_days: u32,
    pub batch_size: usize,
    pub interval: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            processed_retention_days: 7,
            error_retention_days: 30,
            batch_size: 1000,
            interval: Duration::from_secs(60 * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub upstream_base: String,
    pub mount_prefix: String,
    pub session_cookie_name: String,
    pub same_site: SameSite,
    pub secure: bool,
    pub upstream_timeout_ms: u64,
    pub max_body_bytes: usize,
}

impl RelayConfig {
    pub fn new(upstream_base: impl Into<String>) -> Self {
        Self {
            upstream_base: upstream_base.into().trim_end_matches('/').to_owned(),
            ..Self::default()
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            upstream_base: String::new(),
            mount_prefix: "/api/proxy".to_owned(),
            session_cookie_name: "token".to_owned(),
            same_site: SameSite::None,
            secure: true,
            upstream_timeout_ms: DEFAULT_UPSTREAM_TIMEOUT_MS,
            max_body_bytes: 5_242_880,
        }
    }
}

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 10_000;
const MAX_RETENTION_DAYS: u32 = 36_500;

impl AppConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv(Path::new(".env"))?;

        let database_url = required("DATABASE_URL")?;
        let bind_addr = optional("BIND_ADDR")?.unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());

        let sweeper_defaults = SweeperConfig::default();
        let batch_size = parsed("STRIPE_EVENT_DELETE_BATCH", sweeper_defaults.batch_size)?;
        if batch_size == 0 {
            return Err(ConfigError::Invalid {
                key: "STRIPE_EVENT_DELETE_BATCH",
                message: "must be at least 1".to_owned(),
            });
        }
        let interval_secs = parsed("SWEEP_INTERVAL_SECS", sweeper_defaults.interval.as_secs())?;
        if interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "SWEEP_INTERVAL_SECS",
                message: "must be at least 1".to_owned(),
            });
        }
        let sweeper = SweeperConfig {
            processed_retention_days: retention_days(
                "STRIPE_EVENT_RETENTION_DAYS",
                sweeper_defaults.processed_retention_days,
            )?,
            error_retention_days: retention_days(
                "STRIPE_EVENT_ERROR_RETENTION_DAYS",
                sweeper_defaults.error_retention_days,
            )?,
            batch_size,
            interval: Duration::from_secs(interval_secs),
        };

        let upstream_base = required("UPSTREAM_BASE_URL")?;
        let parsed_base = Url::parse(&upstream_base).map_err(|err| ConfigError::Invalid {
            key: "UPSTREAM_BASE_URL",
            message: err.to_string(),
        })?;
        if !matches!(parsed_base.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                key: "UPSTREAM_BASE_URL",
                message: format!("unsupported scheme: {}", parsed_base.scheme()),
            });
        }

        let relay_defaults = RelayConfig::new(upstream_base);
        let same_site = match optional("RELAY_SAME_SITE")? {
            Some(raw) => parse_same_site(&raw)?,
            None => relay_defaults.same_site,
        };
        let relay = RelayConfig {
            mount_prefix: optional("RELAY_MOUNT_PREFIX")?
                .map(|raw| raw.trim_end_matches('/').to_owned())
                .unwrap_or_else(|| relay_defaults.mount_prefix.clone()),
            session_cookie_name: optional("RELAY_SESSION_COOKIE")?
                .unwrap_or_else(|| relay_defaults.session_cookie_name.clone()),
            same_site,
            secure: match optional("RELAY_COOKIE_SECURE")? {
                Some(raw) => parse_bool("RELAY_COOKIE_SECURE", &raw)?,
                None => relay_defaults.secure,
            },
            upstream_timeout_ms: parsed(
                "RELAY_UPSTREAM_TIMEOUT_MS",
                relay_defaults.upstream_timeout_ms,
            )?,
            max_body_bytes: parsed("RELAY_MAX_BODY_BYTES", relay_defaults.max_body_bytes)?,
            ..relay_defaults
        };
        if !relay.mount_prefix.starts_with('/') {
            return Err(ConfigError::Invalid {
                key: "RELAY_MOUNT_PREFIX",
                message: "must start with '/'".to_owned(),
            });
        }

        Ok(Self {
            database_url,
            bind_addr,
            sweeper,
            relay,
        })
    }
}

/// A missing file is fine; an unreadable or malformed one is not.
fn load_dotenv(path: &Path) -> Result<(), ConfigError> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn retention_days(key: &'static str, default: u32) -> Result<u32, ConfigError> {
    let days = parsed(key, default)?;
    if days > MAX_RETENTION_DAYS {
        return Err(ConfigError::Invalid {
            key,
            message: format!("must be at most {MAX_RETENTION_DAYS} days"),
        });
    }
    Ok(days)
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key)?.ok_or(ConfigError::Missing(key))
}

fn optional(key: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(raw) => Ok(Some(raw)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn parsed<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(key)? {
        Some(raw) => raw.trim().parse::<T>().map_err(|err| ConfigError::Invalid {
            key,
            message: err.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(ConfigError::Invalid {
            key,
            message: format!("expected a boolean, got {other:?}"),
        }),
    }
}

fn parse_same_site(raw: &str) -> Result<SameSite, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "strict" => Ok(SameSite::Strict),
        "lax" => Ok(SameSite::Lax),
        "none" => Ok(SameSite::None),
        other => Err(ConfigError::Invalid {
            key: "RELAY_SAME_SITE",
            message: format!("expected strict, lax or none, got {other:?}"),
        }),
    }
}
