//! Repository layer.
//!
//! Each repository is a zero-sized struct. Reads take a pool or any
//! executor; writes take a `&mut PgConnection` so callers can group them in
//! one transaction.

pub mod audit_repo;
pub mod entity_repo;
pub mod message_repo;
pub mod stats_repo;

pub use audit_repo::AuditEventRepo;
pub use entity_repo::{EntityRepo, ReasonUpdate};
pub use message_repo::EntityMessageRepo;
pub use stats_repo::StatsRepo;
