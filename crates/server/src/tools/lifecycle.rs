//! sw_install, sw_activate, sw_client and sw_set_online tool implementations.

use std::sync::atomic::{AtomicBool, Ordering};

use offgrid_client::{GenerationState, LifecycleManager};
use offgrid_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the sw_set_online tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SetOnlineParams {
    /// Whether the host should report itself as online.
    pub online: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SetOnlineOutput {
    pub online: bool,
    pub previous: bool,
}

/// Parameters for the sw_client tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClientParams {
    /// Session id chosen by the host.
    pub id: String,

    /// True to register the session, false to close it (default: true).
    #[serde(default = "default_true")]
    pub open: bool,

    /// Version label already controlling the session. Defaults to this
    /// version when it is active, otherwise the session starts uncontrolled.
    #[serde(default)]
    pub controller: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClientOutput {
    pub id: String,
    pub open: bool,
    pub controller: Option<String>,
    /// Open sessions after this call.
    pub sessions: usize,
    /// Sessions still controlled by another version; a waiting install
    /// cannot activate while this is non-zero unless it skips waiting.
    pub held_by_others: usize,
}

/// Run (or retry) the install step of the current generation.
pub async fn install_impl(manager: &LifecycleManager) -> Result<CallToolResult, McpError> {
    let outcome = manager.on_install().await?;
    json_result(&outcome)
}

pub async fn activate_impl(manager: &LifecycleManager) -> Result<CallToolResult, McpError> {
    let outcome = manager.on_activate().await?;
    json_result(&outcome)
}

pub async fn client_impl(manager: &LifecycleManager, params: ClientParams) -> Result<CallToolResult, McpError> {
    if params.id.trim().is_empty() {
        return Err(Error::InvalidInput("id cannot be empty".into()).into());
    }
    let sessions = manager.sessions();

    let controller = if params.open {
        let controller = match params.controller {
            Some(controller) => Some(controller),
            None if manager.state().await == GenerationState::Active => Some(manager.version().to_string()),
            None => None,
        };
        sessions.register(params.id.clone(), controller.as_deref()).await;
        tracing::debug!(id = %params.id, ?controller, "client opened");
        controller
    } else {
        if !sessions.close(&params.id).await {
            return Err(Error::InvalidInput(format!("unknown client: {}", params.id)).into());
        }
        tracing::debug!(id = %params.id, "client closed");
        None
    };

    json_result(&ClientOutput {
        id: params.id,
        open: params.open,
        controller,
        sessions: sessions.len().await,
        held_by_others: sessions.held_by_others(manager.version()).await,
    })
}

pub fn set_online_impl(online: &AtomicBool, params: SetOnlineParams) -> Result<CallToolResult, McpError> {
    let previous = online.swap(params.online, Ordering::SeqCst);
    if previous != params.online {
        tracing::info!(online = params.online, "connectivity changed");
    }
    json_result(&SetOnlineOutput { online: params.online, previous })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{CannedTransport, manager, manager_with, options, output};
    use offgrid_client::LifecycleOptions;

    fn open(id: &str, controller: Option<&str>) -> ClientParams {
        ClientParams { id: id.into(), open: true, controller: controller.map(String::from) }
    }

    #[tokio::test]
    async fn test_install_then_activate() {
        let transport = CannedTransport::with(&[("https://app.test/", 200, "<html>")]);
        let (manager, db) = manager("2", &["https://app.test/"], transport).await;
        db.create_bucket("1").await.unwrap();

        let install = output(&install_impl(&manager).await.unwrap());
        assert_eq!(install["precached"], 1);
        assert_eq!(install["skip_waiting"], true);

        let activate = output(&activate_impl(&manager).await.unwrap());
        assert_eq!(activate["pruned"]["deleted"], serde_json::json!(["1"]));
        assert_eq!(activate["claimed"], 0);
    }

    #[tokio::test]
    async fn test_install_failure_is_tool_error() {
        let (manager, _db) = manager("1", &["https://app.test/missing.js"], CannedTransport::with(&[])).await;

        let err = install_impl(&manager).await.unwrap_err();
        assert_eq!(err.code.0, -32004);
        assert!(err.message.contains("POPULATE_FAILURE"));
    }

    #[tokio::test]
    async fn test_activate_before_install_is_rejected() {
        let (manager, _db) = manager("1", &[], CannedTransport::with(&[])).await;
        let err = activate_impl(&manager).await.unwrap_err();
        assert_eq!(err.code.0, -32005);
    }

    #[tokio::test]
    async fn test_open_client_holds_back_waiting_install() {
        let waiting = LifecycleOptions { skip_waiting: false, claim_clients: true, ..options("2", &[]) };
        let (manager, _db) = manager_with(waiting, CannedTransport::with(&[])).await;

        let out = output(&client_impl(&manager, open("tab-1", Some("1"))).await.unwrap());
        assert_eq!(out["held_by_others"], 1);

        install_impl(&manager).await.unwrap();
        assert_eq!(activate_impl(&manager).await.unwrap_err().code.0, -32005);

        let closed = ClientParams { open: false, ..open("tab-1", None) };
        let out = output(&client_impl(&manager, closed).await.unwrap());
        assert_eq!(out["sessions"], 0);
        assert_eq!(out["held_by_others"], 0);

        activate_impl(&manager).await.unwrap();
        let out = output(&client_impl(&manager, open("tab-2", None)).await.unwrap());
        assert_eq!(out["controller"], "2");
    }

    #[tokio::test]
    async fn test_activate_claims_registered_clients() {
        let claiming = LifecycleOptions { claim_clients: true, ..options("2", &[]) };
        let (manager, _db) = manager_with(claiming, CannedTransport::with(&[])).await;
        client_impl(&manager, open("tab-1", Some("1"))).await.unwrap();
        client_impl(&manager, open("tab-2", None)).await.unwrap();

        install_impl(&manager).await.unwrap();
        let out = output(&activate_impl(&manager).await.unwrap());

        assert_eq!(out["claimed"], 2);
        assert_eq!(manager.sessions().controller("tab-1").await.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_close_unknown_client_is_invalid_input() {
        let (manager, _db) = manager("1", &[], CannedTransport::with(&[])).await;
        let params = ClientParams { id: "ghost".into(), open: false, controller: None };
        assert_eq!(client_impl(&manager, params).await.unwrap_err().code.0, -32602);
    }

    #[test]
    fn test_set_online_reports_previous() {
        let flag = AtomicBool::new(true);
        let out = output(&set_online_impl(&flag, SetOnlineParams { online: false }).unwrap());
        assert_eq!(out["online"], false);
        assert_eq!(out["previous"], true);
        assert!(!flag.load(Ordering::SeqCst));
    }
}
