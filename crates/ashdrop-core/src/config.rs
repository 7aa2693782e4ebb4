use serde::{Deserialize, Serialize};

/// Top-level configuration (loaded from ashdrop.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AshdropConfig {
    pub transfer: TransferConfig,
    pub storage: StorageConfig,
}

/// Limits and cadence for the transfer gateway and sweeper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Ceiling on uploaded ciphertext size in bytes (default: 20 MB).
    /// Checked before anything is written.
    pub max_object_bytes: u64,
    /// Upper bound on the optional expiry deadline in minutes
    /// (default: 1440 = 24 hours).
    pub max_deadline_minutes: i64,
    /// Sweep period for the expiry task in seconds (default: 60).
    pub sweep_interval_secs: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            max_object_bytes: 20_000_000,
            max_deadline_minutes: 1440,
            sweep_interval_secs: 60,
        }
    }
}

/// S3-compatible object storage endpoint.
///
/// Credentials are injected at operator construction, not persisted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// S3 endpoint
    pub endpoint: String,
    /// S3 region (default: us-east-1)
    pub region: String,
    /// Bucket holding ciphertext objects
    pub bucket: String,
    /// Enforce HTTPS for S3 connections (warn/error on HTTP endpoints)
    pub enforce_tls: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9000".into(),
            region: "us-east-1".into(),
            bucket: "ashdrop".into(),
            enforce_tls: false,
        }
    }
}
