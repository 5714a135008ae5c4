//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` request DTOs accepted by the API layer
//! - Plain create DTOs used by the repositories

pub mod audit;
pub mod curriculum_entity;
pub mod message;
pub mod stats;
