use std::collections::BTreeSet;
use std::sync::Arc;

use super::{CacheStore, StoreHandle};
use crate::Error;

/// Outcome of pruning stale buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, schemars::JsonSchema)]
pub struct PruneReport {
    /// Buckets that were deleted.
    pub deleted: Vec<String>,
    /// Buckets whose deletion failed; left in place for a later activation.
    pub failed: Vec<String>,
}

/// Enumerates, opens and deletes named buckets.
#[derive(Clone)]
pub struct StoreRegistry {
    store: Arc<dyn CacheStore>,
}

impl StoreRegistry {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Open a bucket by name, creating it on first use.
    pub async fn open(&self, name: &str) -> Result<StoreHandle, Error> {
        self.store.open_bucket(name).await?;
        Ok(self.handle(name))
    }

    /// A handle to `name` without touching the store; the bucket appears on first write.
    pub fn handle(&self, name: &str) -> StoreHandle {
        StoreHandle::new(Arc::clone(&self.store), name.to_string())
    }

    pub async fn bucket_names(&self) -> Result<BTreeSet<String>, Error> {
        self.store.bucket_names().await
    }

    pub async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.store.delete_bucket(name).await
    }

    /// Delete every bucket except `current`.
    ///
    /// Listing failures propagate. Individual delete failures are logged and
    /// reported without stopping the remaining deletions.
    pub async fn prune_except(&self, current: &str) -> Result<PruneReport, Error> {
        let mut report = PruneReport::default();

        for name in self.bucket_names().await? {
            if name == current {
                continue;
            }
            match self.delete(&name).await {
                Ok(_) => {
                    tracing::info!(bucket = %name, "deleted stale bucket");
                    report.deleted.push(name);
                }
                Err(e) => {
                    tracing::warn!(bucket = %name, error = %e, "failed to delete stale bucket");
                    report.failed.push(name);
                }
            }
        }

        Ok(report)
    }
}
