use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use tress_core::CacheStrategy;

/// Content-derived job identifier (16 lowercase hex digits)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Hash the uploaded bytes together with every parameter that affects
    /// the output, so identical submissions map to the same job.
    pub fn derive(image: &[u8], radius: usize, darken_amount: f64, cache: CacheStrategy) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(image);
        hasher.update((radius as u64).to_le_bytes());
        hasher.update(darken_amount.to_bits().to_le_bytes());
        match cache {
            CacheStrategy::Ring { size } => {
                hasher.update(b"ring");
                hasher.update((size as u64).to_le_bytes());
            }
            CacheStrategy::Full => hasher.update(b"full"),
        }
        let digest = hasher.finalize();
        Self(hex::encode(&digest[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Complete,
}

/// Response body for a newly submitted job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCreated {
    pub id: JobId,
    pub width: usize,
    pub height: usize,
    pub status: JobStatus,
    pub progress: f64,
}

/// Full job status report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInfo {
    pub id: JobId,
    pub width: usize,
    pub height: usize,
    pub radius: usize,
    pub darken_amount: f64,
    pub status: JobStatus,
    pub progress: f64,
    pub created_at: DateTime<Utc>,
}

impl From<JobInfo> for JobCreated {
    fn from(info: JobInfo) -> Self {
        Self {
            id: info.id,
            width: info.width,
            height: info.height,
            status: info.status,
            progress: info.progress,
        }
    }
}
