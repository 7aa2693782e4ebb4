//! Lifecycle sweeper: the recurring expiry task
//!
//! Runs independently of requests and races them for the same records;
//! both sides go through the store's conditional transition, so each
//! overdue record is expired (and its object deleted) by exactly one of
//! them. The task is an owned handle — created once at startup, stopped
//! on shutdown — never an anonymous orphaned timer.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use opendal::Operator;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use ashdrop_core::{TransferResult, TransferState};
use ashdrop_storage::MetadataStore;

/// One sweep pass: expire every overdue `Live` record.
///
/// Returns how many records this pass transitioned. Object-deletion
/// failures are logged and do not block the transition — a record marked
/// `Expired` is never served again even if the physical delete has to be
/// retried out-of-band.
pub async fn sweep_once<M: MetadataStore + ?Sized>(
    meta: &M,
    objects: &Operator,
) -> TransferResult<usize> {
    let now = Utc::now();
    let overdue = meta.find_expired(now).await?;

    let mut expired = 0;
    for record in overdue {
        if meta
            .transition(&record.id, TransferState::Expired, now)
            .await?
        {
            if let Err(e) = objects.delete(record.object_ref.as_str()).await {
                warn!(
                    transfer_id = %record.id,
                    object = record.object_ref.as_str(),
                    "object delete failed during sweep: {e}"
                );
            }
            debug!(transfer_id = %record.id, "transfer expired by sweep");
            expired += 1;
        }
        // A lost transition means a download (or another sweep) already
        // owned this record; nothing left to do here.
    }
    Ok(expired)
}

/// Handle to the recurring sweep task.
pub struct Sweeper {
    handle: JoinHandle<()>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Sweeper {
    /// Start sweeping every `period`. The first pass runs immediately.
    pub fn spawn<M: MetadataStore + 'static>(
        meta: Arc<M>,
        objects: Operator,
        period: Duration,
    ) -> Self {
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

        let handle = tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        info!("sweeper: shutdown signal received");
                        break;
                    }
                    _ = tick.tick() => {
                        match sweep_once(meta.as_ref(), &objects).await {
                            Ok(0) => {}
                            Ok(n) => info!(expired = n, "sweep pass complete"),
                            Err(e) => warn!("sweep pass failed: {e}"),
                        }
                    }
                }
            }
        });

        Self {
            handle,
            shutdown_tx,
        }
    }

    /// Stop the task and wait for the in-flight pass to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.handle.await;
    }
}
