//! ashdrop-core: shared types, error taxonomy, and config schema

pub mod config;
pub mod error;
pub mod types;

pub use error::{TransferError, TransferResult};
pub use types::{
    ObjectRef, PublicReference, TransferId, TransferRecord, TransferState, TransferSummary,
};
