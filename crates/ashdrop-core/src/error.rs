use thiserror::Error;

pub type TransferResult<T> = Result<T, TransferError>;

/// Failure taxonomy for the transfer core.
///
/// Messages stay small and generic: a caller learns which of the four
/// access outcomes occurred and nothing more. `AccessDenied` and `Gone`
/// are distinct on purpose — a legitimate receiver needs to know whether
/// to re-check the passphrase or give up — but neither reveals anything
/// about how close a guess was.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Bad size, format, or missing field. Rejected before any side effect.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Credential mismatch on a still-live record.
    #[error("access denied")]
    AccessDenied,

    /// Expired or already consumed; no bytes are available anymore.
    /// The two causes are indistinguishable to the caller by design.
    #[error("no longer available")]
    Gone,

    /// Unknown reference.
    #[error("not found")]
    NotFound,

    /// Object or record I/O failed with no partial state committed;
    /// the whole operation is safe to retry.
    #[error("storage error: {0}")]
    Storage(String),
}

impl TransferError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }
}
