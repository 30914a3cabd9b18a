//! Request interception engine for offgrid.
//!
//! This crate provides the HTTP transport, request classification, the
//! caching strategies, and the install / activate / fetch lifecycle shared
//! by the server.

pub mod classify;
pub mod fetch;
pub mod lifecycle;
pub mod strategy;

#[cfg(test)]
mod testing;

pub use classify::{AssetKind, Classification, RequestClassifier};
pub use fetch::{FetchClient, FetchConfig};
pub use lifecycle::{
    ActivateOutcome, ClientSessions, FetchOutcome, GenerationState, InstallOutcome, LifecycleManager, LifecycleOptions,
};
pub use strategy::{Connectivity, Served, Source, Strategy, StrategyEngine};
