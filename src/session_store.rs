use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::SessionStoreError;
use crate::transport::CookieSet;

pub const DEFAULT_COOKIE_FILE: &str = "cookies.json";
pub const DEFAULT_EXPIRY_HOURS: i64 = 4;

/// An authenticated session: the cookie jar plus when it was obtained.
/// Never edited in place; a new login produces a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub cookies: CookieSet,
    pub created_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new(cookies: CookieSet, created_at: DateTime<Utc>) -> Self {
        SessionState {
            cookies,
            created_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, expiry: Duration) -> bool {
        now - self.created_at > expiry
    }
}

/// On-disk layout. The timestamp stays text so entries written without a
/// timezone can still be read.
#[derive(Serialize, Deserialize)]
struct CacheRecord {
    cookies: CookieSet,
    #[serde(default)]
    timestamp: Option<String>,
}

/// Parse a cache timestamp. Offsets are honoured; naive values are taken as UTC.
pub fn normalize_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

pub struct SessionStore {
    path: PathBuf,
    expiry: Duration,
}

impl SessionStore {
    pub fn new<P: AsRef<Path>>(path: P, expiry: Duration) -> Self {
        SessionStore {
            path: path.as_ref().to_path_buf(),
            expiry,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Option<SessionState> {
        self.load_at(Utc::now())
    }

    /// Cached session if present, readable and not older than the expiry window.
    /// Every failure is a cache miss.
    pub fn load_at(&self, now: DateTime<Utc>) -> Option<SessionState> {
        if !self.path.exists() {
            info!("No cookie cache at {:?}.", self.path);
            return None;
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to read cookie cache: {}", e);
                return None;
            }
        };

        let record: CacheRecord = match serde_json::from_str(&content) {
            Ok(r) => r,
            Err(e) => {
                error!("Failed to parse cookie cache: {}. Ignoring it.", e);
                return None;
            }
        };

        let Some(created_at) = record.timestamp.as_deref().and_then(normalize_timestamp) else {
            warn!("Cookie cache has no usable timestamp.");
            return None;
        };

        let state = SessionState::new(record.cookies, created_at);
        if state.is_expired(now, self.expiry) {
            warn!("Cookie cache expired.");
            return None;
        }

        info!("Loaded cookies from cache.");
        Some(state)
    }

    pub fn save(&self, state: &SessionState) -> Result<(), SessionStoreError> {
        let record = CacheRecord {
            cookies: state.cookies.clone(),
            timestamp: Some(state.created_at.to_rfc3339_opts(SecondsFormat::Micros, true)),
        };
        let json = serde_json::to_string_pretty(&record)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        file.write_all(json.as_bytes())?;

        info!("Saved cookies to {:?}.", self.path);
        Ok(())
    }
}
