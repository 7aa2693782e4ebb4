//! ashdrop-storage: OpenDAL object storage + transfer metadata store

pub mod health;
pub mod meta;
pub mod operator;

pub use health::check_health;
pub use meta::{MemoryMetaStore, MetadataStore};
pub use operator::build_operator;
