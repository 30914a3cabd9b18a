//! Client sessions and the generation controlling each.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

/// Registry of open client sessions, shared by every engine generation.
///
/// Each session maps to the version label of the generation serving it, or
/// `None` while uncontrolled.
#[derive(Debug, Clone, Default)]
pub struct ClientSessions {
    inner: Arc<RwLock<HashMap<String, Option<String>>>>,
}

impl ClientSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, id: impl Into<String>, controller: Option<&str>) {
        self.inner.write().await.insert(id.into(), controller.map(String::from));
    }

    /// Forget a closed session. Returns true if it was registered.
    pub async fn close(&self, id: &str) -> bool {
        self.inner.write().await.remove(id).is_some()
    }

    pub async fn controller(&self, id: &str) -> Option<String> {
        self.inner.read().await.get(id).cloned().flatten()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Sessions controlled by some generation other than `version`.
    pub async fn held_by_others(&self, version: &str) -> usize {
        self.inner
            .read()
            .await
            .values()
            .filter(|c| c.as_deref().is_some_and(|v| v != version))
            .count()
    }

    /// Point every session at `version`. Returns how many changed hands.
    pub async fn claim(&self, version: &str) -> usize {
        let mut sessions = self.inner.write().await;
        let mut claimed = 0;
        for controller in sessions.values_mut() {
            if controller.as_deref() != Some(version) {
                *controller = Some(version.to_string());
                claimed += 1;
            }
        }
        claimed
    }
}
