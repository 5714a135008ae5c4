//! Domain logic for the curriculum lifecycle engine.
//!
//! This crate has no internal dependencies and performs no I/O, so the
//! state machine, branching rules and permission guards can be exercised
//! directly by unit tests and reused by the database and API layers.

pub mod approval;
pub mod audit;
pub mod curriculum;
pub mod error;
pub mod lifecycle;
pub mod permissions;
pub mod roles;
pub mod types;
pub mod versioning;
