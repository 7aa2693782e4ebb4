//! OpenDAL Operator factory for the ciphertext object bucket

use anyhow::{Context, Result};
use ashdrop_core::config::StorageConfig;
use opendal::Operator;

/// Build an OpenDAL Operator for any S3-compatible endpoint.
///
/// Credentials are passed in rather than read from config, so they can come
/// from the environment or a secrets manager. Path-style addressing (the
/// opendal 0.55 default) is required by MinIO and SeaweedFS.
///
/// If `enforce_tls` is set and the endpoint uses HTTP, this returns an
/// error; otherwise a plaintext endpoint only logs a warning.
pub fn build_operator(
    cfg: &StorageConfig,
    access_key_id: &str,
    secret_access_key: &str,
) -> Result<Operator> {
    if cfg.endpoint.starts_with("http://") {
        if cfg.enforce_tls {
            anyhow::bail!(
                "S3 endpoint uses plaintext HTTP ({}), but enforce_tls is enabled. \
                 Use an HTTPS endpoint or set storage.enforce_tls = false for local development.",
                cfg.endpoint
            );
        }
        tracing::warn!(
            endpoint = %cfg.endpoint,
            "S3 endpoint uses plaintext HTTP — ciphertext objects are transmitted unencrypted in transit"
        );
    }

    let builder = opendal::services::S3::default()
        .endpoint(&cfg.endpoint)
        .region(&cfg.region)
        .bucket(&cfg.bucket)
        .access_key_id(access_key_id)
        .secret_access_key(secret_access_key);

    let op = Operator::new(builder)
        .context("creating OpenDAL S3 operator")?
        .layer(opendal::layers::LoggingLayer::default())
        .layer(
            opendal::layers::RetryLayer::new()
                .with_max_times(5)
                .with_jitter(),
        )
        .finish();

    Ok(op)
}
