//! ashdrop-transfer: one-time transfer orchestration
//!
//! The [`TransferGateway`] is the only writer on the upload and download
//! paths; the [`Sweeper`] is the only other writer anywhere, expiring
//! overdue records on a timer. Both funnel every state change through the
//! metadata store's conditional transition, so a record leaves `Live`
//! exactly once no matter who races whom.

pub mod gateway;
pub mod notify;
pub mod sweeper;

pub use gateway::{DownloadPayload, TransferGateway, UploadReceipt, UploadRequest};
pub use notify::{LogNotifier, Notifier};
pub use sweeper::{sweep_once, Sweeper};
