//! cache_keys tool implementation.
//!
//! Lists buckets and the entries they hold.

use offgrid_core::CacheDb;
use offgrid_core::cache::EntryMeta;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// Only list this bucket.
    #[serde(default)]
    pub bucket: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BucketListing {
    pub name: String,
    /// True for the bucket of the running generation.
    pub current: bool,
    pub entries: Vec<EntryMeta>,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    pub buckets: Vec<BucketListing>,
}

pub async fn keys_impl(cache: &CacheDb, current: &str, params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    let names = cache.list_buckets().await?;

    let mut buckets = Vec::new();
    for name in names {
        if params.bucket.as_ref().is_some_and(|wanted| *wanted != name) {
            continue;
        }
        let entries = cache.list_entries(&name).await?;
        buckets.push(BucketListing { current: name == current, name, entries });
    }

    json_result(&CacheKeysOutput { buckets })
}
