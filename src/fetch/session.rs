use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cookies NSE issues to a browsing session. Each process run loads the
/// cached value, hands it to the fetcher, and saves whatever the fetcher
/// ended up using.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NseSession {
    /// Ready-to-send `Cookie` header value (`name=value; name2=value2`).
    pub cookie_header: String,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl NseSession {
    /// NSE's `nsit`/`nseappid` cookies go stale after a few minutes.
    pub const TTL_MINUTES: i64 = 5;

    pub fn new(cookie_header: String, acquired_at: DateTime<Utc>) -> Self {
        Self {
            cookie_header,
            acquired_at,
            expires_at: acquired_at + Duration::minutes(Self::TTL_MINUTES),
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.cookie_header.is_empty() && now < self.expires_at
    }

    /// Cached session from disk. Missing or unreadable files yield `None`.
    pub fn load(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(session) => Some(session),
            Err(e) => {
                debug!("ignoring unreadable session cache {}: {e}", path.display());
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("writing session cache {}", path.display()))?;
        Ok(())
    }
}

/// Join the `name=value` part of each `Set-Cookie` header into one `Cookie` header.
pub fn cookie_header_from<'a>(set_cookies: impl IntoIterator<Item = &'a str>) -> String {
    set_cookies
        .into_iter()
        .filter_map(|c| c.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect::<Vec<_>>()
        .join("; ")
}
