use std::collections::HashMap;

use async_trait::async_trait;

use crate::model::{ChainSnapshot, IndexId};

use super::{FetchError, SnapshotSource};

/// Canned snapshots, for dry runs and tests. Indices without an entry fail
/// with a network error.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    snapshots: HashMap<IndexId, Result<ChainSnapshot, FetchError>>,
    vix: Option<f64>,
}

impl StaticSource {
    pub fn new(vix: Option<f64>) -> Self {
        Self {
            snapshots: HashMap::new(),
            vix,
        }
    }

    pub fn with_snapshot(mut self, index: IndexId, snapshot: ChainSnapshot) -> Self {
        self.snapshots.insert(index, Ok(snapshot));
        self
    }

    pub fn with_failure(mut self, index: IndexId, error: FetchError) -> Self {
        self.snapshots.insert(index, Err(error));
        self
    }
}

#[async_trait]
impl SnapshotSource for StaticSource {
    async fn fetch_snapshot(&self, index: IndexId) -> Result<ChainSnapshot, FetchError> {
        self.snapshots
            .get(&index)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::network(index.symbol(), "no canned snapshot")))
    }

    async fn fetch_volatility_index(&self) -> Option<f64> {
        self.vix
    }
}
