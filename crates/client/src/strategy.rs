//! Strategy selection and execution.
//!
//! Every intercepted request runs exactly one of four strategies, chosen by
//! [`Strategy::select`] from its classification and the connectivity hint:
//!
//! | classification          | connectivity | strategy                  |
//! |-------------------------|--------------|---------------------------|
//! | not cacheable           | any          | `PassThrough`             |
//! | immutable asset         | any          | `CacheFirst`              |
//! | generic                 | online       | `NetworkFirstPopulate`    |
//! | generic                 | offline      | `CacheOnlyWithFallback`   |
//!
//! Connectivity is only a hint. Each strategy that reads it keeps a fallback
//! for when it is wrong. `PassThrough` never falls back, so a failed
//! side-effecting request is never masked.

use std::fmt::Display;
use std::sync::Arc;

use offgrid_core::{Error, Request, Response, StoreHandle, Transport};
use serde::Serialize;

use crate::classify::{AssetKind, Classification};

/// Process-wide reachability hint, read once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    Online,
    Offline,
}

impl From<bool> for Connectivity {
    fn from(online: bool) -> Self {
        if online { Connectivity::Online } else { Connectivity::Offline }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    PassThrough,
    CacheFirst,
    NetworkFirstPopulate,
    CacheOnlyWithFallback,
}

impl Strategy {
    pub fn select(classification: Classification, connectivity: Connectivity) -> Self {
        match (classification.cacheable, classification.kind, connectivity) {
            (false, _, _) => Strategy::PassThrough,
            (true, AssetKind::ImmutableAsset, _) => Strategy::CacheFirst,
            (true, AssetKind::Generic, Connectivity::Online) => Strategy::NetworkFirstPopulate,
            (true, AssetKind::Generic, Connectivity::Offline) => Strategy::CacheOnlyWithFallback,
        }
    }
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Network,
    Cache,
}

/// A response together with how it was obtained.
#[derive(Debug, Clone)]
pub struct Served {
    pub response: Response,
    pub strategy: Strategy,
    pub source: Source,
}

/// Executes strategies against one bucket and one transport.
#[derive(Clone)]
pub struct StrategyEngine {
    transport: Arc<dyn Transport>,
    bucket: StoreHandle,
}

impl StrategyEngine {
    pub fn new(transport: Arc<dyn Transport>, bucket: StoreHandle) -> Self {
        Self { transport, bucket }
    }

    /// Serve `request` with the strategy selected for it.
    ///
    /// # Errors
    ///
    /// - `NetworkFailure` from `PassThrough`, or from `CacheFirst` on a clean miss
    /// - `Unavailable` when both the bucket and the network fail, or a generic
    ///   request fails on its primary and fallback path
    pub async fn execute(
        &self, classification: Classification, request: &Request, connectivity: Connectivity,
    ) -> Result<Served, Error> {
        let strategy = Strategy::select(classification, connectivity);
        let served = |response, source| Served { response, strategy, source };

        match strategy {
            Strategy::PassThrough => {
                let response = self.transport.send(request).await?;
                Ok(served(response, Source::Network))
            }

            Strategy::CacheFirst => {
                let lookup_failure = match self.cached(request).await {
                    Ok(Some(hit)) => return Ok(served(hit, Source::Cache)),
                    Ok(None) => None,
                    Err(store) => Some(store),
                };
                match (self.fetch_and_store(request).await, lookup_failure) {
                    (Ok(response), _) => Ok(served(response, Source::Network)),
                    (Err(network), None) => Err(network),
                    (Err(network), Some(store)) => Err(unavailable(request, &store, &network)),
                }
            }

            Strategy::NetworkFirstPopulate => match self.fetch_and_store(request).await {
                Ok(response) => Ok(served(response, Source::Network)),
                Err(network) => {
                    tracing::debug!(url = %request.url(), error = %network, "network failed, trying bucket");
                    match self.cached(request).await {
                        Ok(Some(hit)) => Ok(served(hit, Source::Cache)),
                        Ok(None) => Err(unavailable(request, &network, "not in cache")),
                        Err(store) => Err(unavailable(request, &network, &store)),
                    }
                }
            },

            Strategy::CacheOnlyWithFallback => {
                let miss = match self.cached(request).await {
                    Ok(Some(hit)) => return Ok(served(hit, Source::Cache)),
                    Ok(None) => "not in cache".to_string(),
                    Err(store) => store.to_string(),
                };
                match self.fetch_and_store(request).await {
                    Ok(response) => Ok(served(response, Source::Network)),
                    Err(network) => Err(unavailable(request, &miss, &network)),
                }
            }
        }
    }

    /// Look the request up in the bucket. Store failures are logged and returned.
    async fn cached(&self, request: &Request) -> Result<Option<Response>, Error> {
        match self.bucket.lookup(&request.identity()).await {
            Ok(Some(hit)) => {
                tracing::debug!(bucket = %self.bucket.name(), url = %request.url(), "from cache");
                Ok(Some(hit))
            }
            Ok(None) => {
                tracing::debug!(bucket = %self.bucket.name(), url = %request.url(), "not in cache");
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(bucket = %self.bucket.name(), url = %request.url(), error = %e, "bucket lookup failed");
                Err(e)
            }
        }
    }

    /// Fetch from the network and write a copy through to the bucket.
    ///
    /// The entry is keyed by `request` itself. A failed write is logged and
    /// does not fail the fetch.
    async fn fetch_and_store(&self, request: &Request) -> Result<Response, Error> {
        let response = self.transport.send(request).await?;
        match self.bucket.write(&request.identity(), &response).await {
            Ok(()) => tracing::debug!(bucket = %self.bucket.name(), url = %request.url(), "cached"),
            Err(e) => {
                tracing::warn!(bucket = %self.bucket.name(), url = %request.url(), error = %e, "write-through failed")
            }
        }
        Ok(response)
    }
}

fn unavailable(request: &Request, primary: impl Display, fallback: impl Display) -> Error {
    Error::Unavailable { url: request.url().to_string(), primary: primary.to_string(), fallback: fallback.to_string() }
}
