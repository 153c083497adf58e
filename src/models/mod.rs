pub mod config;
pub mod job;

pub use config::{AppConfig, CacheKind, FilterConfig, ServerConfig, DEFAULT_CONFIG_YAML};
pub use job::{JobCreated, JobId, JobInfo, JobStatus};
