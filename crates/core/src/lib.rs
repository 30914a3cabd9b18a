//! Core types and shared functionality for offgrid.
//!
//! This crate provides:
//! - The request / response data model and request identity keys
//! - Bucket storage with a SQLite backend
//! - The store and transport seams the engine is written against
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod request;
pub mod response;
pub mod store;
pub mod transport;

pub use cache::CacheDb;
pub use config::AppConfig;
pub use error::Error;
pub use request::{Request, RequestIdentity};
pub use response::Response;
pub use store::{CacheStore, PruneReport, StoreHandle, StoreRegistry};
pub use transport::Transport;
