//! Transfer record model and the identifiers around it

use ashdrop_crypto::Verifier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque unique transfer identifier. Immutable once created; the public
/// download reference is derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(Uuid);

impl TransferId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for TransferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for TransferId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Handle to the stored ciphertext object. Valid only while the record is
/// `Live`; dangling afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectRef(String);

impl ObjectRef {
    /// Key under which a transfer's ciphertext is stored.
    pub fn for_transfer(id: &TransferId) -> Self {
        Self(format!("transfers/{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The opaque path a receiver uses to address a transfer:
/// `download/<uuid>`. The embedding edge prepends its own origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicReference(String);

impl PublicReference {
    pub fn for_id(id: &TransferId) -> Self {
        Self(format!("download/{id}"))
    }

    /// Extract the transfer id from a reference or a full download link.
    /// Only the last path segment matters, so both `download/<uuid>` and
    /// `https://host/download/<uuid>` parse.
    pub fn parse(reference: &str) -> Option<TransferId> {
        let segment = reference.rsplit('/').next()?;
        segment.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PublicReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a transfer.
///
/// Transitions are monotonic: `Live` may move to `Consumed` (streamed to
/// the receiver) or `Expired` (deadline passed); terminal states are
/// sticky and never transition again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferState {
    /// Ciphertext stored and downloadable.
    Live,
    /// Delivered once; the object is gone.
    Consumed,
    /// Deadline passed before delivery; the object is gone.
    Expired,
}

impl TransferState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransferState::Live)
    }
}

/// The single persistent entity: one record per transfer.
///
/// Records are never deleted — terminal records remain for history
/// listings — only the ciphertext object they reference is erased.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub id: TransferId,
    /// Uploading principal; used for listing only, never for download
    /// access control.
    pub owner_id: String,
    pub object_ref: ObjectRef,
    pub display_name: String,
    /// Cosmetic, echoed back to the receiver (e.g. `pdf`).
    pub extension: String,
    pub credential_verifier: Verifier,
    pub created_at: DateTime<Utc>,
    /// Absent means the record never expires on a timer.
    pub expires_at: Option<DateTime<Utc>>,
    pub state: TransferState,
    /// Set exactly when the state leaves `Live`.
    pub terminal_at: Option<DateTime<Utc>>,
}

impl TransferRecord {
    pub fn is_live(&self) -> bool {
        self.state == TransferState::Live
    }

    /// Whether the expiry deadline has passed as of `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }

    pub fn summary(&self) -> TransferSummary {
        TransferSummary {
            id: self.id,
            display_name: self.display_name.clone(),
            extension: self.extension.clone(),
            created_at: self.created_at,
            expires_at: self.expires_at,
            state: self.state,
        }
    }
}

/// Read-only listing row: no ciphertext, no verifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferSummary {
    pub id: TransferId,
    pub display_name: String,
    pub extension: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub state: TransferState,
}
