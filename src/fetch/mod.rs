pub mod nse;
pub mod retry;
pub mod session;
pub mod stub;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{ChainSnapshot, IndexId};

pub use nse::NseFetcher;
pub use retry::RetryPolicy;
pub use session::NseSession;
pub use stub::StaticSource;

/// Failure of a snapshot pull, after the fetcher's own retries.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("network error fetching {what}: {message}")]
    Network { what: String, message: String },

    #[error("session rejected while fetching {what}: {message}")]
    Auth { what: String, message: String },

    #[error("unexpected response for {what}: {message}")]
    Parse { what: String, message: String },
}

impl FetchError {
    pub fn network(what: impl Into<String>, message: impl ToString) -> Self {
        FetchError::Network {
            what: what.into(),
            message: message.to_string(),
        }
    }

    pub fn auth(what: impl Into<String>, message: impl ToString) -> Self {
        FetchError::Auth {
            what: what.into(),
            message: message.to_string(),
        }
    }

    pub fn parse(what: impl Into<String>, message: impl ToString) -> Self {
        FetchError::Parse {
            what: what.into(),
            message: message.to_string(),
        }
    }

    /// A fresh attempt can fix network hiccups and truncated bodies, but not
    /// a rejected session.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::Auth { .. })
    }
}

/// Where option chains and the volatility index come from.
///
/// Implementations own retries, backoff and request timeouts; callers see
/// only the final outcome.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_snapshot(&self, index: IndexId) -> Result<ChainSnapshot, FetchError>;

    /// Latest India VIX print, or `None` if it could not be obtained.
    async fn fetch_volatility_index(&self) -> Option<f64>;
}
