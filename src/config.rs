//! TOML configuration for the call-cycle service.
//!
//! Every field has a compiled-in default, so an empty (or absent) file is a
//! valid configuration. The file is located, in order, by the `--config`
//! flag / `CALLCYCLE_CONFIG`, then `/etc/callcycle/callcycle.toml`.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const SYSTEM_CONFIG_PATH: &str = "/etc/callcycle/callcycle.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cycle: CyclePeers,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the active configuration came from.
///
/// Config is resolved before the tracing subscriber exists (the subscriber
/// depends on `[logging]`), so the outcome is carried here and reported
/// through [`ConfigOrigin::log`] once logging is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    Defaults,
    /// A system config file exists but failed to load; defaults are in use.
    SystemFallback { path: PathBuf, error: String },
}

impl ConfigOrigin {
    pub fn log(&self) {
        match self {
            ConfigOrigin::File(path) => {
                info!(path = %path.display(), "loaded configuration");
            }
            ConfigOrigin::Defaults => {
                debug!("no config file found, using compiled-in defaults");
            }
            ConfigOrigin::SystemFallback { path, error } => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "system config file exists but could not be loaded, using defaults"
                );
            }
        }
    }
}

impl CycleConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load `explicit` if given (failing hard if it cannot be read), else the
    /// system path if it exists, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<(Self, ConfigOrigin)> {
        Self::resolve_with(explicit, Path::new(SYSTEM_CONFIG_PATH))
    }

    fn resolve_with(explicit: Option<&Path>, system_path: &Path) -> Result<(Self, ConfigOrigin)> {
        if let Some(path) = explicit {
            let cfg = Self::load(path)?;
            return Ok((cfg, ConfigOrigin::File(path.to_path_buf())));
        }

        if system_path.exists() {
            return Ok(match Self::load(system_path) {
                Ok(cfg) => (cfg, ConfigOrigin::File(system_path.to_path_buf())),
                Err(e) => (
                    Self::default(),
                    ConfigOrigin::SystemFallback {
                        path: system_path.to_path_buf(),
                        error: format!("{:#}", e),
                    },
                ),
            });
        }

        Ok((Self::default(), ConfigOrigin::Defaults))
    }

    pub fn validate(&self) -> Result<()> {
        self.server.bind_addr()?;
        check_peer_url("cycle.endpoint_a_url", &self.cycle.endpoint_a_url)?;
        check_peer_url("cycle.endpoint_b_url", &self.cycle.endpoint_b_url)?;
        Ok(())
    }
}

fn check_peer_url(field: &str, raw: &str) -> Result<()> {
    let url = Url::parse(raw).with_context(|| format!("{} is not a valid URL: {:?}", field, raw))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("{} must use http or https, got {:?}", field, url.scheme());
    }
    if url.host_str().is_none() {
        bail!("{} has no host: {:?}", field, raw);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener address. All interfaces by default.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind
            .parse()
            .with_context(|| format!("server.bind is not a socket address: {:?}", self.bind))
    }
}

// ---------------------------------------------------------------------------
// Cycle
// ---------------------------------------------------------------------------

/// Where each endpoint's scheduled call goes, and after how long.
///
/// Both URLs normally point back at this service's own public address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CyclePeers {
    /// Target of the call scheduled by `/endpoint-b` and by `/start-cycle`.
    pub endpoint_a_url: String,
    /// Target of the call scheduled by `/endpoint-a`.
    pub endpoint_b_url: String,
    /// Delay before a scheduled call fires.
    pub delay_secs: u64,
}

impl Default for CyclePeers {
    fn default() -> Self {
        Self {
            endpoint_a_url: "http://127.0.0.1:8000/endpoint-a".to_string(),
            endpoint_b_url: "http://127.0.0.1:8000/endpoint-b".to_string(),
            delay_secs: 300,
        }
    }
}

impl CyclePeers {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum tracing level (`trace`, `debug`, `info`, `warn`, `error`).
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Json,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
