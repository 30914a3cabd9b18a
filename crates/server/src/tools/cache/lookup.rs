//! cache_match tool implementation.
//!
//! Looks up one request identity in a bucket without touching the network.

use offgrid_client::fetch::parse_request;
use offgrid_core::StoreRegistry;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::{ResponseView, json_result};

/// Parameters for the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchParams {
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Bucket to search (default: the current generation's).
    #[serde(default)]
    pub bucket: Option<String>,
}

/// Output from the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchOutput {
    pub bucket: String,
    pub key: String,
    pub response: Option<ResponseView>,
}

pub async fn match_impl(
    registry: &StoreRegistry, current: &str, params: CacheMatchParams,
) -> Result<CallToolResult, McpError> {
    let request = parse_request(params.method.as_deref().unwrap_or("GET"), &params.url)?;
    let identity = request.identity();
    let bucket = params.bucket.unwrap_or_else(|| current.to_string());

    let response = registry.handle(&bucket).lookup(&identity).await?;

    json_result(&CacheMatchOutput { key: identity.key(), bucket, response: response.as_ref().map(ResponseView::from) })
}
