//! Transfer gateway: upload, download, and owner listing
//!
//! Download evaluates its checks in a fixed order — lookup, credential,
//! lifecycle, stream, commit — so an expired transfer with the right
//! passphrase reports "gone" while a live one with the wrong passphrase
//! reports "access denied", and neither outcome shifts with timing. The
//! credential comparison runs unconditionally (constant time) before the
//! lifecycle result is acted on.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{Duration, Utc};
use opendal::Operator;
use tracing::{info, warn};

use ashdrop_core::config::TransferConfig;
use ashdrop_core::{
    ObjectRef, PublicReference, TransferError, TransferId, TransferRecord, TransferResult,
    TransferState, TransferSummary,
};
use ashdrop_crypto::Verifier;
use ashdrop_storage::MetadataStore;

use crate::notify::Notifier;

/// Everything an upload needs. The ciphertext is opaque to the gateway —
/// sealing happened on the client edge, and the verifier is already a
/// one-way digest.
pub struct UploadRequest {
    pub ciphertext: Bytes,
    pub display_name: String,
    pub owner_id: String,
    pub verifier: Verifier,
    /// Optional self-destruct deadline, in minutes from now.
    pub deadline_minutes: Option<i64>,
    /// Where to send the "you have a file" notification, if anywhere.
    pub receiver_contact: Option<String>,
    pub sender_name: Option<String>,
}

/// What the sender gets back: the id and the public download reference.
/// Never the verifier, never the passphrase.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub id: TransferId,
    pub reference: PublicReference,
}

/// A delivered transfer: the sealed bytes plus the filename hint the
/// receiving edge needs for its Content-Disposition header.
#[derive(Debug, Clone)]
pub struct DownloadPayload {
    pub ciphertext: Bytes,
    pub display_name: String,
    pub extension: String,
}

/// Orchestrates the one-time transfer lifecycle over a metadata store and
/// an object bucket.
pub struct TransferGateway<M: MetadataStore> {
    meta: Arc<M>,
    objects: Operator,
    notifier: Arc<dyn Notifier>,
    config: TransferConfig,
}

impl<M: MetadataStore + 'static> TransferGateway<M> {
    pub fn new(
        meta: Arc<M>,
        objects: Operator,
        notifier: Arc<dyn Notifier>,
        config: TransferConfig,
    ) -> Self {
        Self {
            meta,
            objects,
            notifier,
            config,
        }
    }

    /// Store a sealed blob and create its `Live` record.
    ///
    /// Never partially commits: if the record cannot be created after the
    /// object was written, the orphan object is removed before returning.
    pub async fn upload(&self, req: UploadRequest) -> TransferResult<UploadReceipt> {
        if req.display_name.trim().is_empty() {
            return Err(TransferError::validation("display name is required"));
        }
        if req.ciphertext.is_empty() {
            return Err(TransferError::validation("no ciphertext provided"));
        }
        if req.ciphertext.len() as u64 > self.config.max_object_bytes {
            return Err(TransferError::validation(format!(
                "ciphertext exceeds {} byte limit",
                self.config.max_object_bytes
            )));
        }
        if let Some(minutes) = req.deadline_minutes {
            if minutes < 1 || minutes > self.config.max_deadline_minutes {
                return Err(TransferError::validation(format!(
                    "deadline must be between 1 and {} minutes",
                    self.config.max_deadline_minutes
                )));
            }
        }

        let id = TransferId::generate();
        let object_ref = ObjectRef::for_transfer(&id);
        let now = Utc::now();
        let expires_at = req
            .deadline_minutes
            .map(|minutes| now + Duration::minutes(minutes));

        self.objects
            .write(object_ref.as_str(), req.ciphertext.to_vec())
            .await
            .map_err(TransferError::storage)?;

        let record = TransferRecord {
            id,
            owner_id: req.owner_id,
            object_ref: object_ref.clone(),
            extension: extension_of(&req.display_name),
            display_name: req.display_name,
            credential_verifier: req.verifier,
            created_at: now,
            expires_at,
            state: TransferState::Live,
            terminal_at: None,
        };

        if let Err(e) = self.meta.create(record).await {
            // No orphan objects: the record is the source of truth, so an
            // object without one must not linger.
            self.delete_object(&object_ref).await;
            return Err(e);
        }

        info!(transfer_id = %id, expires_at = ?expires_at, "transfer stored");

        if let Some(contact) = req.receiver_contact {
            let notifier = Arc::clone(&self.notifier);
            let sender_name = req.sender_name;
            tokio::spawn(async move {
                if let Err(e) = notifier
                    .notify(&contact, &id, sender_name.as_deref())
                    .await
                {
                    warn!(transfer_id = %id, "notification failed: {e}");
                }
            });
        }

        Ok(UploadReceipt {
            id,
            reference: PublicReference::for_id(&id),
        })
    }

    /// Deliver a transfer exactly once.
    ///
    /// The record is committed `Consumed` only after the full object read
    /// succeeded; a failed read surfaces as `Storage` and leaves the
    /// record `Live` and retryable. If the commit loses to a concurrent
    /// download or the sweeper, the bytes are discarded and the caller
    /// sees `Gone` — two callers can never both succeed.
    pub async fn download(
        &self,
        reference: &str,
        presented: &Verifier,
    ) -> TransferResult<DownloadPayload> {
        let id = PublicReference::parse(reference).ok_or(TransferError::NotFound)?;
        let record = self
            .meta
            .get(&id)
            .await?
            .ok_or(TransferError::NotFound)?;

        // Always compared, constant time, before the lifecycle result is
        // acted on — the outcome below must not leak whether a guess on a
        // dead transfer was correct.
        let credential_ok = record.credential_verifier.matches(presented);

        let now = Utc::now();
        if record.state.is_terminal() || record.is_overdue(now) {
            if record.is_live()
                && self
                    .meta
                    .transition(&id, TransferState::Expired, now)
                    .await?
            {
                self.delete_object(&record.object_ref).await;
                info!(transfer_id = %id, "transfer expired on access");
            }
            return Err(TransferError::Gone);
        }

        if !credential_ok {
            return Err(TransferError::AccessDenied);
        }

        let ciphertext = match self.objects.read(record.object_ref.as_str()).await {
            Ok(buffer) => buffer.to_bytes(),
            Err(e) => {
                // A concurrent winner may have erased the object between
                // our lookup and this read. Re-check before blaming storage
                // so the loser reports Gone, not a retryable failure.
                return match self.meta.get(&id).await? {
                    Some(current) if !current.is_live() => Err(TransferError::Gone),
                    _ => Err(TransferError::storage(e)),
                };
            }
        };

        if !self
            .meta
            .transition(&id, TransferState::Consumed, Utc::now())
            .await?
        {
            // Lost the race out of Live; the winner owns the object.
            return Err(TransferError::Gone);
        }

        self.delete_object(&record.object_ref).await;
        info!(transfer_id = %id, "transfer consumed");

        Ok(DownloadPayload {
            ciphertext,
            display_name: record.display_name,
            extension: record.extension,
        })
    }

    /// Transfer history for an owner, newest first, terminal records
    /// included. Pure read.
    pub async fn list_by_owner(&self, owner_id: &str) -> TransferResult<Vec<TransferSummary>> {
        let records = self.meta.list_by_owner(owner_id).await?;
        Ok(records.iter().map(TransferRecord::summary).collect())
    }

    /// Best-effort object deletion. A failure is logged, never propagated:
    /// the record is already terminal, so the transfer can never be served
    /// again even while the physical delete waits for an out-of-band retry.
    async fn delete_object(&self, object_ref: &ObjectRef) {
        if let Err(e) = self.objects.delete(object_ref.as_str()).await {
            warn!(object = object_ref.as_str(), "object delete failed: {e}");
        }
    }
}

fn extension_of(display_name: &str) -> String {
    std::path::Path::new(display_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}
