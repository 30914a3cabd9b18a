//! MCP tool implementations.
//!
//! This module contains all tools exposed by the offgrid server.

pub mod cache;
pub mod lifecycle;
pub mod sw_fetch;

use offgrid_core::{Error, Response};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use cache::{CacheKeysParams, CacheMatchParams};
pub use lifecycle::{ClientParams, SetOnlineParams};
pub use sw_fetch::SwFetchParams;

/// A response as reported back to the MCP caller.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResponseView {
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8, lossy for binary payloads.
    pub body: String,
    pub bytes: usize,
    /// RFC 3339 timestamp, present when the response came from a bucket.
    pub stored_at: Option<String>,
}

impl From<&Response> for ResponseView {
    fn from(response: &Response) -> Self {
        Self {
            status: response.status,
            content_type: response.content_type().map(String::from),
            headers: response.headers.clone(),
            body: String::from_utf8_lossy(&response.body).into_owned(),
            bytes: response.body.len(),
            stored_at: response.stored_at.map(|t| t.to_rfc3339()),
        }
    }
}

pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use offgrid_client::{ClientSessions, LifecycleManager, LifecycleOptions};
    use offgrid_core::{CacheDb, Error, Request, Response, Transport};
    use rmcp::model::CallToolResult;
    use url::Url;

    /// Transport serving canned bodies; any other URL is unreachable.
    #[derive(Default)]
    pub struct CannedTransport {
        pub routes: Mutex<HashMap<String, (u16, String)>>,
    }

    impl CannedTransport {
        pub fn with(routes: &[(&str, u16, &str)]) -> Arc<Self> {
            let map = routes.iter().map(|(u, s, b)| (u.to_string(), (*s, b.to_string()))).collect();
            Arc::new(Self { routes: Mutex::new(map) })
        }

        pub fn clear(&self) {
            self.routes.lock().unwrap().clear();
        }
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn send(&self, request: &Request) -> Result<Response, Error> {
            let url = request.url().to_string();
            match self.routes.lock().unwrap().get(&url) {
                Some((status, body)) => {
                    let headers = vec![("content-type".to_string(), "text/html".to_string())];
                    Ok(Response::new(*status, headers, body.clone()))
                }
                None => Err(Error::NetworkFailure(format!("{url}: unreachable"))),
            }
        }
    }

    pub fn options(version: &str, precache: &[&str]) -> LifecycleOptions {
        LifecycleOptions {
            version: version.to_string(),
            precache: precache.iter().map(|u| Url::parse(u).unwrap()).collect(),
            immutable_suffixes: vec![".png".into()],
            skip_waiting: true,
            claim_clients: false,
        }
    }

    pub async fn manager(
        version: &str, precache: &[&str], transport: Arc<CannedTransport>,
    ) -> (Arc<LifecycleManager>, CacheDb) {
        manager_with(options(version, precache), transport).await
    }

    pub async fn manager_with(
        options: LifecycleOptions, transport: Arc<CannedTransport>,
    ) -> (Arc<LifecycleManager>, CacheDb) {
        let db = CacheDb::open_in_memory().await.unwrap();
        let manager = LifecycleManager::new(options, Arc::new(db.clone()), transport, ClientSessions::new());
        (Arc::new(manager), db)
    }

    pub fn output(result: &CallToolResult) -> serde_json::Value {
        let text = result.content.first().and_then(|c| c.as_text()).expect("Expected text content");
        serde_json::from_str(&text.text).unwrap()
    }
}
