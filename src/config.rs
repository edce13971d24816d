use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::session_store::{DEFAULT_COOKIE_FILE, DEFAULT_EXPIRY_HOURS};

pub const DEFAULT_INPUT: &str = "zwift_ids.csv";
pub const DEFAULT_OUTPUT: &str = "zwiftpower_check.csv";
pub const DEFAULT_REQUEST_DELAY_SECS: f64 = 2.0;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Zwift account used for the SSO login.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: Credentials,
    pub cookie_file: PathBuf,
    pub cookie_expiry: chrono::Duration,
    pub input: PathBuf,
    pub output: PathBuf,
    pub request_delay: Duration,
    pub http_timeout: Duration,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Required env vars
    /// - `ZWIFT_USER`, `ZWIFT_PASS`
    ///
    /// # Optional env vars
    /// - `ZP_COOKIE_FILE` (default `cookies.json`)
    /// - `ZP_COOKIE_EXPIRY_HOURS` (default 4)
    /// - `ZP_INPUT` (default `zwift_ids.csv`)
    /// - `ZP_OUTPUT` (default `zwiftpower_check.csv`)
    /// - `ZP_REQUEST_DELAY_SECS` (default 2)
    /// - `ZP_HTTP_TIMEOUT_SECS` (default 30)
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = required(&lookup, "ZWIFT_USER")?;
        let password = required(&lookup, "ZWIFT_PASS")?;

        let expiry_hours = parse_or(&lookup, "ZP_COOKIE_EXPIRY_HOURS", DEFAULT_EXPIRY_HOURS)?;
        let cookie_expiry = Some(expiry_hours)
            .filter(|hours| *hours >= 0)
            .and_then(chrono::TimeDelta::try_hours)
            .ok_or_else(|| ConfigError::InvalidValue {
                name: "ZP_COOKIE_EXPIRY_HOURS",
                value: expiry_hours.to_string(),
            })?;

        let delay_secs = parse_or(&lookup, "ZP_REQUEST_DELAY_SECS", DEFAULT_REQUEST_DELAY_SECS)?;
        // Rejects negative, NaN, infinite and out-of-range values.
        let request_delay = Duration::try_from_secs_f64(delay_secs).map_err(|_| ConfigError::InvalidValue {
            name: "ZP_REQUEST_DELAY_SECS",
            value: delay_secs.to_string(),
        })?;

        let timeout_secs = parse_or(&lookup, "ZP_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;

        Ok(Settings {
            credentials: Credentials { username, password },
            cookie_file: path_or(&lookup, "ZP_COOKIE_FILE", DEFAULT_COOKIE_FILE),
            cookie_expiry,
            input: path_or(&lookup, "ZP_INPUT", DEFAULT_INPUT),
            output: path_or(&lookup, "ZP_OUTPUT", DEFAULT_OUTPUT),
            request_delay,
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingCredential(name))
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        None => Ok(default),
    }
}

fn path_or<F>(lookup: &F, name: &str, default: &str) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    PathBuf::from(lookup(name).filter(|v| !v.trim().is_empty()).unwrap_or_else(|| default.to_string()))
}
