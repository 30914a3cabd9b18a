//! Bucket inspection MCP tools.
//!
//! Read-only views over the SQLite store shared with the lifecycle manager.

pub mod keys;
pub mod lookup;

pub use keys::{CacheKeysParams, keys_impl};
pub use lookup::{CacheMatchParams, match_impl};
