//! Runtime configuration from environment variables, plus logging setup.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Duration;
use tracing_subscriber::EnvFilter;

pub const ENV_BIND: &str = "LEADCRM_BIND";
pub const ENV_DB_PATH: &str = "LEADCRM_DB_PATH";
pub const ENV_SECRET_KEY: &str = "LEADCRM_SECRET_KEY";
pub const ENV_TOKEN_TTL_HOURS: &str = "LEADCRM_TOKEN_TTL_HOURS";
pub const ENV_USE_FORMS_DB: &str = "LEADCRM_USE_FORMS_DB";
pub const ENV_FORMS_DB_PATH: &str = "LEADCRM_FORMS_DB_PATH";
pub const ENV_LOG_FORMAT: &str = "LEADCRM_LOG_FORMAT";

pub const DEFAULT_BIND: &str = "127.0.0.1:8002";
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
/// Only for local development. Start-up warns when it is in use.
pub const DEV_SECRET_KEY: &str = "leadcrm-dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    /// `None` means the per-user data directory.
    pub db_path: Option<PathBuf>,
    pub secret_key: String,
    pub token_ttl: Duration,
    pub use_forms_db: bool,
    pub forms_db_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_str = lookup(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_str
            .parse()
            .with_context(|| format!("Invalid {}: {}", ENV_BIND, bind_str))?;

        let token_ttl = match lookup(ENV_TOKEN_TTL_HOURS) {
            Some(v) => v
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|h| *h > 0)
                .and_then(Duration::try_hours)
                .with_context(|| format!("Invalid {}: {}", ENV_TOKEN_TTL_HOURS, v))?,
            None => Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
        };

        Ok(Self {
            bind,
            db_path: non_empty(lookup(ENV_DB_PATH)).map(PathBuf::from),
            secret_key: non_empty(lookup(ENV_SECRET_KEY))
                .unwrap_or_else(|| DEV_SECRET_KEY.to_string()),
            token_ttl,
            use_forms_db: lookup(ENV_USE_FORMS_DB).is_some_and(|v| parse_flag(&v)),
            forms_db_path: non_empty(lookup(ENV_FORMS_DB_PATH)).map(PathBuf::from),
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.secret_key == DEV_SECRET_KEY
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Install the global subscriber. `RUST_LOG` picks the filter (default
/// `info`); `LEADCRM_LOG_FORMAT=json` switches to JSON lines.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var(ENV_LOG_FORMAT).is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if result.is_err() {
        tracing::debug!("logging already initialised");
    }
}
