//! Storage reachability probe, run once at process start before the
//! sweeper or any gateway is wired up.

use anyhow::Result;
use opendal::Operator;

/// Verify the bucket is reachable by listing the transfer prefix.
pub async fn check_health(op: &Operator) -> Result<()> {
    op.list("transfers/")
        .await
        .map(|_| ())
        .map_err(|e| anyhow::anyhow!("object storage unreachable: {e}"))
}

/// Non-panicking variant for readiness polling.
pub async fn is_healthy(op: &Operator) -> bool {
    check_health(op).await.is_ok()
}
