//! Metadata store: the persistence seam for transfer records
//!
//! The trait is what the gateway and sweeper program against; a database
//! adapter implements it on top of whatever the deployment persists to.
//! [`MemoryMetaStore`] is the in-process reference implementation used by
//! tests and single-node embedders.
//!
//! The only write primitive past `create` is [`MetadataStore::transition`]:
//! a conditional update that succeeds only while the record is still
//! `Live`. That condition is the per-record mutual exclusion — when a
//! download and the sweeper race for the same record, exactly one caller
//! observes `true` and owns the follow-up object deletion.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use ashdrop_core::{TransferError, TransferId, TransferRecord, TransferResult, TransferState};

#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Persist a freshly created record. Refuses an already-known id.
    async fn create(&self, record: TransferRecord) -> TransferResult<()>;

    /// Fetch a record by id.
    async fn get(&self, id: &TransferId) -> TransferResult<Option<TransferRecord>>;

    /// All records for an owner, newest first, terminal ones included.
    async fn list_by_owner(&self, owner_id: &str) -> TransferResult<Vec<TransferRecord>>;

    /// Live records whose deadline has passed as of `now`.
    async fn find_expired(&self, now: DateTime<Utc>) -> TransferResult<Vec<TransferRecord>>;

    /// Conditional state transition out of `Live`.
    ///
    /// Returns `true` iff this call moved the record from `Live` to `to`
    /// and stamped `terminal_at = at`. Returns `false` if the record is
    /// already terminal — the caller lost the race and must not touch the
    /// object. `to` must be a terminal state.
    async fn transition(
        &self,
        id: &TransferId,
        to: TransferState,
        at: DateTime<Utc>,
    ) -> TransferResult<bool>;
}

type SharedRecord = Arc<RwLock<TransferRecord>>;

/// In-memory store with per-record locks.
///
/// The outer map is write-locked only on `create`; every mutation past
/// that takes the individual record's lock, so transitions on different
/// ids never contend with each other. A database adapter gets the same
/// guarantee from a conditional `UPDATE … WHERE state = 'Live'`.
#[derive(Default)]
pub struct MemoryMetaStore {
    records: RwLock<HashMap<TransferId, SharedRecord>>,
}

impl MemoryMetaStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn shared(&self, id: &TransferId) -> Option<SharedRecord> {
        self.records.read().await.get(id).cloned()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetaStore {
    async fn create(&self, record: TransferRecord) -> TransferResult<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(TransferError::storage(format!(
                "duplicate transfer id {}",
                record.id
            )));
        }
        records.insert(record.id, Arc::new(RwLock::new(record)));
        Ok(())
    }

    async fn get(&self, id: &TransferId) -> TransferResult<Option<TransferRecord>> {
        match self.shared(id).await {
            Some(record) => Ok(Some(record.read().await.clone())),
            None => Ok(None),
        }
    }

    async fn list_by_owner(&self, owner_id: &str) -> TransferResult<Vec<TransferRecord>> {
        // Snapshot the handles first so the map lock is not held while
        // individual records are read.
        let handles: Vec<SharedRecord> = self.records.read().await.values().cloned().collect();

        let mut owned = Vec::new();
        for handle in handles {
            let record = handle.read().await;
            if record.owner_id == owner_id {
                owned.push(record.clone());
            }
        }
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> TransferResult<Vec<TransferRecord>> {
        let handles: Vec<SharedRecord> = self.records.read().await.values().cloned().collect();

        let mut overdue = Vec::new();
        for handle in handles {
            let record = handle.read().await;
            if record.is_live() && record.is_overdue(now) {
                overdue.push(record.clone());
            }
        }
        Ok(overdue)
    }

    async fn transition(
        &self,
        id: &TransferId,
        to: TransferState,
        at: DateTime<Utc>,
    ) -> TransferResult<bool> {
        if !to.is_terminal() {
            return Err(TransferError::validation(
                "transition target must be terminal",
            ));
        }
        let handle = self.shared(id).await.ok_or(TransferError::NotFound)?;
        let mut record = handle.write().await;
        if !record.is_live() {
            return Ok(false);
        }
        record.state = to;
        record.terminal_at = Some(at);
        Ok(true)
    }
}
