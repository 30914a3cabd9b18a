//! Engine generations: install, activate, and per-request interception.
//!
//! A generation moves through
//! `Parsed -> Installing -> Waiting -> Active -> Superseded`, or to
//! `Redundant` when its install fails. Only the `Active` generation answers
//! fetches; every other state declines so the host falls back to plain
//! network handling.

mod sessions;

use std::sync::Arc;

use offgrid_core::config::ConfigError;
use offgrid_core::{AppConfig, CacheStore, Error, PruneReport, Request, StoreRegistry, Transport};
use serde::Serialize;
use tokio::sync::RwLock;
use url::Url;

use crate::classify::{RequestClassifier, path_extension};
use crate::strategy::{Connectivity, Served, StrategyEngine};

pub use sessions::ClientSessions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    Parsed,
    Installing,
    Waiting,
    Active,
    /// Install failed; the host may retry it.
    Redundant,
    Superseded,
}

/// Settings for one generation.
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    pub version: String,
    pub precache: Vec<Url>,
    pub immutable_suffixes: Vec<String>,
    pub skip_waiting: bool,
    pub claim_clients: bool,
}

impl LifecycleOptions {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            version: config.version.clone(),
            precache: config.precache_urls()?,
            immutable_suffixes: config.immutable_suffixes.clone(),
            skip_waiting: config.skip_waiting,
            claim_clients: config.claim_clients,
        })
    }
}

#[derive(Debug, Clone, Serialize, schemars::JsonSchema)]
pub struct InstallOutcome {
    pub version: String,
    pub precached: usize,
    /// Ready to take over without waiting for older sessions to close.
    pub skip_waiting: bool,
}

#[derive(Debug, Clone, Serialize, schemars::JsonSchema)]
pub struct ActivateOutcome {
    pub version: String,
    pub pruned: PruneReport,
    pub claimed: usize,
}

/// Result of handling one intercepted request.
#[derive(Debug)]
pub enum FetchOutcome {
    Respond(Served),
    /// The host should perform its default network handling.
    Decline,
}

/// One engine generation and the entry points the host calls.
pub struct LifecycleManager {
    version: String,
    precache: Vec<Request>,
    skip_waiting: bool,
    claim_clients: bool,
    registry: StoreRegistry,
    transport: Arc<dyn Transport>,
    classifier: RequestClassifier,
    engine: StrategyEngine,
    sessions: ClientSessions,
    state: RwLock<GenerationState>,
}

impl LifecycleManager {
    pub fn new(
        options: LifecycleOptions, store: Arc<dyn CacheStore>, transport: Arc<dyn Transport>,
        sessions: ClientSessions,
    ) -> Self {
        let registry = StoreRegistry::new(store);
        let engine = StrategyEngine::new(Arc::clone(&transport), registry.handle(&options.version));

        Self {
            precache: options.precache.into_iter().map(Request::get).collect(),
            classifier: RequestClassifier::new(&options.immutable_suffixes),
            version: options.version,
            skip_waiting: options.skip_waiting,
            claim_clients: options.claim_clients,
            registry,
            transport,
            engine,
            sessions,
            state: RwLock::new(GenerationState::Parsed),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn registry(&self) -> &StoreRegistry {
        &self.registry
    }

    pub fn sessions(&self) -> &ClientSessions {
        &self.sessions
    }

    pub async fn state(&self) -> GenerationState {
        *self.state.read().await
    }

    /// Open this generation's bucket and precache every configured resource.
    ///
    /// Allowed from `Parsed`, or from `Redundant` when the host retries.
    ///
    /// # Errors
    ///
    /// `PopulateFailure` or a store failure moves the generation to
    /// `Redundant`; `InvalidState` when called from any other state.
    pub async fn on_install(&self) -> Result<InstallOutcome, Error> {
        self.transition(&[GenerationState::Parsed, GenerationState::Redundant], GenerationState::Installing)
            .await?;
        tracing::info!(version = %self.version, resources = self.precache.len(), "install");

        let result = async {
            let bucket = self.registry.open(&self.version).await?;
            bucket.populate_all(self.transport.as_ref(), &self.precache).await
        }
        .await;

        let mut state = self.state.write().await;
        match result {
            Ok(precached) => {
                *state = GenerationState::Waiting;
                if self.skip_waiting {
                    tracing::info!(version = %self.version, "installed, skipping wait");
                } else {
                    tracing::info!(version = %self.version, "installed, waiting for older sessions");
                }
                Ok(InstallOutcome { version: self.version.clone(), precached, skip_waiting: self.skip_waiting })
            }
            Err(e) => {
                *state = GenerationState::Redundant;
                tracing::warn!(version = %self.version, error = %e, "install failed");
                Err(e)
            }
        }
    }

    /// True when the generation is installed and nothing holds it back.
    pub async fn can_activate(&self) -> bool {
        match self.state().await {
            GenerationState::Waiting => self.skip_waiting || self.sessions.held_by_others(&self.version).await == 0,
            GenerationState::Active => true,
            _ => false,
        }
    }

    /// Delete every stale bucket, become active, then claim sessions if configured.
    ///
    /// Pruning failures are logged and reported but never block activation.
    /// Running it again while active prunes nothing new.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the generation is `Waiting` (and allowed to take
    /// over) or already `Active`.
    pub async fn on_activate(&self) -> Result<ActivateOutcome, Error> {
        let state = self.state().await;
        if !self.can_activate().await {
            let reason = if state == GenerationState::Waiting {
                let held = self.sessions.held_by_others(&self.version).await;
                format!("version {} waiting for {held} session(s) held by older versions", self.version)
            } else {
                format!("cannot activate version {} from {state:?}", self.version)
            };
            return Err(Error::InvalidState(reason));
        }
        tracing::info!(version = %self.version, "activate");

        let pruned = match self.registry.prune_except(&self.version).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(version = %self.version, error = %e, "could not list buckets; skipping prune");
                PruneReport::default()
            }
        };

        *self.state.write().await = GenerationState::Active;

        let claimed = if self.claim_clients { self.sessions.claim(&self.version).await } else { 0 };
        if claimed > 0 {
            tracing::info!(version = %self.version, claimed, "claimed client sessions");
        }

        Ok(ActivateOutcome { version: self.version.clone(), pruned, claimed })
    }

    /// Handle one intercepted request.
    ///
    /// Declines unless the generation is `Active`.
    pub async fn on_fetch(&self, request: &Request, connectivity: Connectivity) -> Result<FetchOutcome, Error> {
        let state = self.state().await;
        if state != GenerationState::Active {
            tracing::debug!(version = %self.version, ?state, url = %request.url(), "declining fetch");
            return Ok(FetchOutcome::Decline);
        }

        let classification = self.classifier.classify(request);
        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            extension = path_extension(request).as_deref().unwrap_or(""),
            ?classification,
            ?connectivity,
            "fetch"
        );

        let served = self.engine.execute(classification, request, connectivity).await?;
        Ok(FetchOutcome::Respond(served))
    }

    /// Mark this generation as replaced by a newer one.
    pub async fn supersede(&self) {
        *self.state.write().await = GenerationState::Superseded;
        tracing::info!(version = %self.version, "superseded");
    }

    async fn transition(&self, from: &[GenerationState], to: GenerationState) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if !from.contains(&*state) {
            return Err(Error::InvalidState(format!("version {}: cannot go from {:?} to {to:?}", self.version, *state)));
        }
        *state = to;
        Ok(())
    }
}
