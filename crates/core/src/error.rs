use crate::curriculum::EntityKind;
use crate::lifecycle::{EntityStatus, Trigger};
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A family already has an open (draft, pending or approved) version.
    #[error(
        "Conflict: {kind} {code} already has a {status} version (v{version}); \
         only one open version is allowed at a time"
    )]
    OpenVersionExists {
        kind: EntityKind,
        code: String,
        status: EntityStatus,
        version: i32,
    },

    #[error("Invalid transition: cannot {trigger} an entity in status '{from}'")]
    InvalidTransition { from: EntityStatus, trigger: Trigger },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
