//! Application configuration with layered loading.
//!
//! Configuration is loaded with figment from multiple sources:
//!
//! 1. Environment variables (OFFGRID_*)
//! 2. TOML config file (if OFFGRID_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (OFFGRID_*)
/// 2. TOML config file (if OFFGRID_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version label of this engine generation; names its bucket.
    ///
    /// Changing it makes every other bucket stale on the next activation.
    /// Set via OFFGRID_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: String,

    /// Path to the SQLite bucket database.
    ///
    /// Set via OFFGRID_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Base URL that relative precache entries are resolved against.
    ///
    /// Set via OFFGRID_SCOPE environment variable.
    #[serde(default)]
    pub scope: Option<String>,

    /// Resources fetched into the bucket at install time.
    ///
    /// Set via OFFGRID_PRECACHE environment variable (e.g. `["/", "/app.js"]`).
    #[serde(default)]
    pub precache: Vec<String>,

    /// Path suffixes that mark a request as an immutable asset.
    ///
    /// Set via OFFGRID_IMMUTABLE_SUFFIXES environment variable.
    #[serde(default = "default_immutable_suffixes")]
    pub immutable_suffixes: Vec<String>,

    /// Take over right after install instead of waiting for old sessions to close.
    ///
    /// Set via OFFGRID_SKIP_WAITING environment variable.
    #[serde(default = "default_true")]
    pub skip_waiting: bool,

    /// Claim every open client session once activation has pruned stale buckets.
    ///
    /// Set via OFFGRID_CLAIM_CLIENTS environment variable.
    #[serde(default)]
    pub claim_clients: bool,

    /// Initial value of the connectivity signal.
    ///
    /// Set via OFFGRID_START_ONLINE environment variable.
    #[serde(default = "default_true")]
    pub start_online: bool,

    /// User-Agent string for outgoing requests.
    ///
    /// Set via OFFGRID_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via OFFGRID_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum response body size in bytes.
    ///
    /// Set via OFFGRID_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_version() -> String {
    "1".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./offgrid-cache.sqlite")
}

fn default_immutable_suffixes() -> Vec<String> {
    [
        ".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg", ".ico", ".avif", ".woff", ".woff2", ".ttf", ".otf",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_user_agent() -> String {
    "offgrid/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            db_path: default_db_path(),
            scope: None,
            precache: Vec::new(),
            immutable_suffixes: default_immutable_suffixes(),
            skip_waiting: true,
            claim_clients: false,
            start_online: true,
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed,
    /// or if validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("OFFGRID_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("OFFGRID_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Precache entries resolved to absolute URLs.
    ///
    /// Relative entries need `scope`; absolute entries are used as given.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for an entry that cannot be resolved.
    pub fn precache_urls(&self) -> Result<Vec<url::Url>, ConfigError> {
        let base = self
            .scope
            .as_deref()
            .map(url::Url::parse)
            .transpose()
            .map_err(|e| ConfigError::Invalid { field: "scope".into(), reason: e.to_string() })?;

        let mut urls = Vec::with_capacity(self.precache.len());
        for entry in &self.precache {
            let resolved = match url::Url::parse(entry) {
                Ok(url) => url,
                Err(url::ParseError::RelativeUrlWithoutBase) => match &base {
                    Some(base) => base.join(entry).map_err(|e| ConfigError::Invalid {
                        field: "precache".into(),
                        reason: format!("{entry}: {e}"),
                    })?,
                    None => {
                        return Err(ConfigError::Missing {
                            field: "scope".into(),
                            hint: format!("relative precache entry {entry} needs OFFGRID_SCOPE"),
                        });
                    }
                },
                Err(e) => {
                    return Err(ConfigError::Invalid { field: "precache".into(), reason: format!("{entry}: {e}") });
                }
            };
            if !urls.contains(&resolved) {
                urls.push(resolved);
            }
        }

        Ok(urls)
    }
}
