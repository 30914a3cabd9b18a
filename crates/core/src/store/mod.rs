//! Bucket store seam plus the handle and registry built on top of it.

mod handle;
mod registry;

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::cache::CacheDb;
use crate::request::RequestIdentity;
use crate::response::Response;
use crate::Error;

pub use handle::StoreHandle;
pub use registry::{PruneReport, StoreRegistry};

/// Persistent map of named buckets, each mapping request identity to response.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Create the bucket if it is missing. Idempotent.
    async fn open_bucket(&self, name: &str) -> Result<(), Error>;

    async fn bucket_names(&self) -> Result<BTreeSet<String>, Error>;

    /// Returns true if the bucket existed.
    async fn delete_bucket(&self, name: &str) -> Result<bool, Error>;

    async fn lookup(&self, bucket: &str, identity: &RequestIdentity) -> Result<Option<Response>, Error>;

    /// Last writer wins. Creates the bucket on first write.
    async fn put(&self, bucket: &str, identity: &RequestIdentity, response: &Response) -> Result<(), Error>;
}

#[async_trait]
impl CacheStore for CacheDb {
    async fn open_bucket(&self, name: &str) -> Result<(), Error> {
        self.create_bucket(name).await
    }

    async fn bucket_names(&self) -> Result<BTreeSet<String>, Error> {
        self.list_buckets().await
    }

    async fn delete_bucket(&self, name: &str) -> Result<bool, Error> {
        self.drop_bucket(name).await
    }

    async fn lookup(&self, bucket: &str, identity: &RequestIdentity) -> Result<Option<Response>, Error> {
        self.get_entry(bucket, identity).await
    }

    async fn put(&self, bucket: &str, identity: &RequestIdentity, response: &Response) -> Result<(), Error> {
        self.upsert_entry(bucket, identity, response).await
    }
}
