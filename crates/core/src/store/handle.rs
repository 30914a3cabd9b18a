use std::sync::Arc;

use futures_util::future::join_all;

use super::CacheStore;
use crate::request::{Request, RequestIdentity};
use crate::response::Response;
use crate::transport::Transport;
use crate::Error;

/// Accessor for one named bucket.
///
/// Cheap to clone; every clone talks to the same underlying store.
#[derive(Clone)]
pub struct StoreHandle {
    store: Arc<dyn CacheStore>,
    name: String,
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle").field("name", &self.name).finish()
    }
}

impl StoreHandle {
    pub(crate) fn new(store: Arc<dyn CacheStore>, name: String) -> Self {
        Self { store, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Most recently written entry for `identity`, or none.
    pub async fn lookup(&self, identity: &RequestIdentity) -> Result<Option<Response>, Error> {
        self.store.lookup(&self.name, identity).await
    }

    /// Persist a duplicate of `response` under `identity`, replacing any prior entry.
    pub async fn write(&self, identity: &RequestIdentity, response: &Response) -> Result<(), Error> {
        let copy = response.duplicate();
        self.store.put(&self.name, identity, &copy).await
    }

    /// Fetch every request from the network and store the results.
    ///
    /// Fetches run concurrently. Entries that succeed are kept even when
    /// others fail; the call still reports `Error::PopulateFailure` listing
    /// every URL that could not be fetched or written.
    pub async fn populate_all(&self, transport: &dyn Transport, requests: &[Request]) -> Result<usize, Error> {
        let results = join_all(requests.iter().map(|request| async move {
            let response = transport.send(request).await?;
            self.write(&request.identity(), &response).await
        }))
        .await;

        let mut failed = Vec::new();
        for (request, result) in requests.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(bucket = %self.name, url = %request.url(), error = %e, "precache failed");
                failed.push(request.url().to_string());
            }
        }

        if failed.is_empty() {
            tracing::debug!(bucket = %self.name, count = requests.len(), "precache complete");
            Ok(requests.len())
        } else {
            Err(Error::PopulateFailure { failed, total: requests.len() })
        }
    }
}
