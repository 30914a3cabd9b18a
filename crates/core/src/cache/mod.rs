//! SQLite-backed bucket store.
//!
//! Persistent, versioned response storage using SQLite with async access
//! via tokio-rusqlite:
//!
//! - One row per bucket, one row per (bucket, request identity) entry
//! - Entries keyed by a SHA-256 digest of the request identity
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod buckets;
pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::EntryMeta;
