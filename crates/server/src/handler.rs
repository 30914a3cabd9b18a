//! MCP server handler implementation.
//!
//! Plays the host side of the engine: lifecycle events, intercepted fetches
//! and the connectivity signal all arrive as tool calls.
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::tools::{
    CacheKeysParams, CacheMatchParams, ClientParams, SetOnlineParams, SwFetchParams, cache,
    lifecycle::{activate_impl, client_impl, install_impl, set_online_impl},
    sw_fetch::fetch_impl,
};

use offgrid_client::LifecycleManager;
use offgrid_core::{CacheDb, Transport};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for offgrid.
#[derive(Clone)]
pub struct OffgridServer {
    manager: Arc<LifecycleManager>,
    transport: Arc<dyn Transport>,
    cache: CacheDb,
    online: Arc<AtomicBool>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl OffgridServer {
    pub fn new(manager: Arc<LifecycleManager>, transport: Arc<dyn Transport>, cache: CacheDb, online: bool) -> Self {
        Self { manager, transport, cache, online: Arc::new(AtomicBool::new(online)), tool_router: Self::tool_router() }
    }

    #[tool(description = "Install the current version: create its bucket and precache the configured resources.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.manager).await
    }

    #[tool(description = "Activate the current version: delete every other bucket, then claim open sessions if configured.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.manager).await
    }

    /// Route one request through the engine.
    ///
    /// Cacheable GETs follow the strategy chosen by asset kind and connectivity;
    /// everything else passes straight through.
    #[tool(
        description = "Handle a request the way the offline cache would. Returns the response plus the strategy and source used."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.manager, self.transport.as_ref(), &self.online, params.0).await
    }

    #[tool(
        description = "Open or close a client session. Sessions held by an older version keep a new install waiting unless it skips waiting."
    )]
    async fn sw_client(&self, params: Parameters<ClientParams>) -> Result<CallToolResult, McpError> {
        client_impl(&self.manager, params.0).await
    }

    #[tool(description = "Set the connectivity hint used when sw_fetch is called without an explicit online flag.")]
    async fn sw_set_online(&self, params: Parameters<SetOnlineParams>) -> Result<CallToolResult, McpError> {
        set_online_impl(&self.online, params.0)
    }

    #[tool(description = "List buckets and the request identities stored in each.")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        cache::keys_impl(&self.cache, self.manager.version(), params.0).await
    }

    #[tool(description = "Look up a stored response by URL and method without touching the network.")]
    async fn cache_match(&self, params: Parameters<CacheMatchParams>) -> Result<CallToolResult, McpError> {
        cache::match_impl(self.manager.registry(), self.manager.version(), params.0).await
    }
}

impl ServerHandler for OffgridServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "offgrid".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
