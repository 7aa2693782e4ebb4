//! Outbound notification hook
//!
//! Fire-and-forget by contract: the gateway spawns the call and logs
//! failures, so a dead mail provider can never fail an upload. The
//! message carries the transfer id and an optional sender name — never
//! the passphrase or the verifier.

use ashdrop_core::TransferId;
use async_trait::async_trait;
use tracing::info;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Tell `contact` that transfer `id` is waiting for them.
    async fn notify(
        &self,
        contact: &str,
        id: &TransferId,
        sender_name: Option<&str>,
    ) -> anyhow::Result<()>;
}

/// Default hook: records the event in the log stream. Deployments wire a
/// real `Notifier` against their mail or webhook provider.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        contact: &str,
        id: &TransferId,
        sender_name: Option<&str>,
    ) -> anyhow::Result<()> {
        info!(
            contact,
            transfer_id = %id,
            sender = sender_name.unwrap_or("anonymous"),
            "transfer notification"
        );
        Ok(())
    }
}
