//! The curriculum lifecycle engine.
//!
//! Every mutating operation runs in one transaction that locks the subject's
//! version family, re-reads it, checks the caller's permissions and the
//! transition table, writes, appends its audit event, re-verifies the family
//! invariants and commits. A failed guard rolls the whole transaction back,
//! so no audit event is left behind for a rejected request.
//!
//! - [`versions`] -- create, branch, edit and the read helpers.
//! - [`approval`] -- submit, approve, reject, withdraw, publish and delete.
//! - [`recorder`] -- audit events, messages and timelines.
//! - [`stats`] -- per-status counts.

pub mod approval;
pub mod family;
pub mod recorder;
pub mod stats;
pub mod versions;
