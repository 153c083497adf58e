use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tress_core::{CacheStrategy, DEFAULT_RING_SIZE};

use crate::services::{DEFAULT_JOB_TTL, DEFAULT_MAX_JOBS};

/// Commented default configuration, written by `tresser init`.
pub const DEFAULT_CONFIG_YAML: &str = r#"# Tresser configuration

filter:
  # Neighbourhood half-width in pixels (1..=100)
  radius: 5
  # Extra reduction of the HSV value channel (0.0..=1.0)
  darken_amount: 0.0
  # Time budget for one scan step in milliseconds
  step_budget_ms: 50
  # Column cache: "ring" (fixed slots) or "full" (one slot per pixel)
  cache: ring
  ring_size: 256

server:
  # BIND_ADDR overrides this
  bind_addr: "0.0.0.0:3000"
  # Directory served under /static (disabled when null)
  static_dir: null
  # Jobs kept in memory at once; the oldest finished job makes room
  max_jobs: 64
  # Seconds a finished job stays available before it is dropped
  job_ttl_secs: 600
"#;

/// Application configuration loaded from config.yaml
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    /// Default filter parameters
    #[serde(default)]
    pub filter: FilterConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Cache layout selector as written in config files and on the command line
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    #[default]
    Ring,
    Full,
}

/// Filter defaults applied when a request or CLI flag leaves a value out
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FilterConfig {
    #[serde(default = "default_radius")]
    pub radius: usize,

    #[serde(default)]
    pub darken_amount: f64,

    #[serde(default = "default_step_budget_ms")]
    pub step_budget_ms: u64,

    #[serde(default)]
    pub cache: CacheKind,

    #[serde(default = "default_ring_size")]
    pub ring_size: usize,
}

fn default_radius() -> usize {
    5
}

fn default_step_budget_ms() -> u64 {
    50
}

fn default_ring_size() -> usize {
    DEFAULT_RING_SIZE
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            radius: default_radius(),
            darken_amount: 0.0,
            step_budget_ms: default_step_budget_ms(),
            cache: CacheKind::Ring,
            ring_size: default_ring_size(),
        }
    }
}

impl FilterConfig {
    pub fn cache_strategy(&self) -> CacheStrategy {
        match self.cache {
            CacheKind::Ring => CacheStrategy::Ring {
                size: self.ring_size,
            },
            CacheKind::Full => CacheStrategy::Full,
        }
    }

    pub fn step_budget(&self) -> Duration {
        Duration::from_millis(self.step_budget_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default)]
    pub static_dir: Option<String>,

    #[serde(default = "default_max_jobs")]
    pub max_jobs: usize,

    #[serde(default = "default_job_ttl_secs")]
    pub job_ttl_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_max_jobs() -> usize {
    DEFAULT_MAX_JOBS
}

fn default_job_ttl_secs() -> u64 {
    DEFAULT_JOB_TTL.as_secs()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            static_dir: None,
            max_jobs: default_max_jobs(),
            job_ttl_secs: default_job_ttl_secs(),
        }
    }
}

impl ServerConfig {
    /// Bind address, with `BIND_ADDR` taking precedence over the file
    pub fn resolve_bind_addr(&self) -> String {
        std::env::var("BIND_ADDR").unwrap_or_else(|_| self.bind_addr.clone())
    }

    /// How long a finished job is kept
    pub fn job_ttl(&self) -> Duration {
        Duration::from_secs(self.job_ttl_secs)
    }
}

impl AppConfig {
    /// Load configuration from a file, falling back to defaults.
    ///
    /// A missing path means "use defaults"; an unreadable or invalid file is
    /// logged and also yields defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            tracing::debug!("No config file given, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_yaml(&content) {
                Ok(config) => {
                    tracing::info!(
                        path = %path.display(),
                        radius = config.filter.radius,
                        darken_amount = config.filter.darken_amount,
                        "Loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!(%e, path = %path.display(), "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(%e, path = %path.display(), "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes to unit, not to an empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }
}
