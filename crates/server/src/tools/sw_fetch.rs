//! sw_fetch tool implementation.
//!
//! Routes one request through the active generation. A declined request is
//! sent straight to the network, the way a browser falls back when no
//! worker answers.

use std::sync::atomic::{AtomicBool, Ordering};

use offgrid_client::fetch::parse_request;
use offgrid_client::{Connectivity, FetchOutcome, LifecycleManager, Source, Strategy};
use offgrid_core::Transport;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{ResponseView, json_result};

/// Parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// The URL to request.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Optional request body, sent as UTF-8.
    #[serde(default)]
    pub body: Option<String>,

    /// Override the connectivity hint for this request only.
    #[serde(default)]
    pub online: Option<bool>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the sw_fetch tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwFetchOutput {
    /// False when the generation declined and the request went to the network untouched.
    pub handled: bool,
    pub strategy: Option<Strategy>,
    pub source: Option<Source>,
    pub response: ResponseView,
}

pub async fn fetch_impl(
    manager: &LifecycleManager, transport: &dyn Transport, online: &AtomicBool, params: SwFetchParams,
) -> Result<CallToolResult, McpError> {
    let mut request = parse_request(&params.method, &params.url)?;
    if let Some(body) = params.body {
        request = request.with_body(body);
    }
    let connectivity = Connectivity::from(params.online.unwrap_or_else(|| online.load(Ordering::SeqCst)));

    let output = match manager.on_fetch(&request, connectivity).await? {
        FetchOutcome::Respond(served) => SwFetchOutput {
            handled: true,
            strategy: Some(served.strategy),
            source: Some(served.source),
            response: ResponseView::from(&served.response),
        },
        FetchOutcome::Decline => {
            let response = transport.send(&request).await?;
            SwFetchOutput { handled: false, strategy: None, source: None, response: ResponseView::from(&response) }
        }
    };

    json_result(&output)
}
