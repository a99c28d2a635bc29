//! YAML file-backed market source.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

use super::{FeedError, MarketSnapshot, MarketSource};

/// FileSource reads a YAML map of pair to snapshot.
///
/// The file is re-read on every call so an external detector can rewrite it
/// between cycles.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Creates a new file source.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads and parses every snapshot in the file.
    pub async fn load_all(&self) -> Result<HashMap<String, MarketSnapshot>, FeedError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let snapshots: HashMap<String, MarketSnapshot> = serde_yaml::from_str(&content)?;
        Ok(snapshots)
    }
}

#[async_trait]
impl MarketSource for FileSource {
    async fn snapshot(&self, pair: &str) -> Result<MarketSnapshot, FeedError> {
        let mut snapshots = self.load_all().await?;
        let snapshot = snapshots
            .remove(pair)
            .ok_or_else(|| FeedError::UnknownPair(pair.to_string()))?;
        snapshot.validate(pair)?;

        debug!(
            pair = %pair,
            price = snapshot.current_price,
            volatility = ?snapshot.volatility,
            supports = snapshot.zones.support_zones.len(),
            resistances = snapshot.zones.resistance_zones.len(),
            "Snapshot loaded"
        );
        Ok(snapshot)
    }
}
