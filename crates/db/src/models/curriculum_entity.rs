//! Curriculum entity version model and DTOs.

use curricula_core::curriculum::EntityKind;
use curricula_core::lifecycle::EntityStatus;
use curricula_core::permissions::VisibilityScope;
use curricula_core::types::{DbId, Timestamp};
use curricula_core::versioning::VersionedEntity;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `curriculum_entities` table: one version of a family.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CurriculumEntity {
    pub id: DbId,
    #[sqlx(try_from = "String")]
    pub kind: EntityKind,
    pub code: String,
    pub version: i32,
    pub parent_entity_id: Option<DbId>,
    pub is_latest_version: bool,
    #[sqlx(try_from = "String")]
    pub status: EntityStatus,
    pub creator_id: DbId,
    pub approver_id: Option<DbId>,
    pub updater_id: Option<DbId>,
    pub department_id: DbId,
    pub rejection_reason: Option<String>,
    pub payload: serde_json::Value,
    pub lock_version: i32,
    pub created_at: Timestamp,
    pub submitted_at: Option<Timestamp>,
    pub approved_at: Option<Timestamp>,
    pub published_at: Option<Timestamp>,
    pub archived_at: Option<Timestamp>,
    pub updated_at: Timestamp,
    /// Derived: another version of the family is draft, pending or approved.
    /// Only populated by queries that compute it.
    #[sqlx(default)]
    pub has_new_pending_version: bool,
}

impl CurriculumEntity {
    /// Whether this row ever reached `approved`. Such rows are archived
    /// rather than hard-deleted.
    pub fn ever_approved(&self) -> bool {
        self.approved_at.is_some()
    }
}

impl VersionedEntity for CurriculumEntity {
    fn id(&self) -> DbId {
        self.id
    }

    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn code(&self) -> &str {
        &self.code
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn status(&self) -> EntityStatus {
        self.status
    }

    fn parent_entity_id(&self) -> Option<DbId> {
        self.parent_entity_id
    }

    fn is_latest_version(&self) -> bool {
        self.is_latest_version
    }
}

/// DTO for inserting version 1 of a new family.
#[derive(Debug, Clone)]
pub struct CreateCurriculumEntity {
    pub kind: EntityKind,
    pub code: String,
    pub department_id: DbId,
    pub creator_id: DbId,
    pub payload: serde_json::Value,
}

/// Filter and pagination for entity listings.
#[derive(Debug, Clone)]
pub struct EntityListQuery {
    pub kind: EntityKind,
    pub scope: VisibilityScope,
    pub status: Option<EntityStatus>,
    pub department_id: Option<DbId>,
    pub code: Option<String>,
    /// Only rows carrying the family's latest flag.
    pub latest_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Paginated listing.
#[derive(Debug, Clone, Serialize)]
pub struct EntityPage {
    pub items: Vec<CurriculumEntity>,
    pub total: i64,
}

/// Request body for `POST /{courses|degrees}`.
///
/// Every key other than `code` and `department_id` is a payload field.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEntityRequest {
    pub code: String,
    pub department_id: Option<DbId>,
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

/// Request body for the submit endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitRequest {
    pub message: Option<String>,
}

/// Request body for the reject endpoint. A missing reason fails the
/// length check rather than deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RejectRequest {
    pub reason: String,
}

/// Query parameters for entity listings.
#[derive(Debug, Clone, Deserialize)]
pub struct ListEntitiesParams {
    pub status: Option<EntityStatus>,
    pub department_id: Option<DbId>,
    pub code: Option<String>,
    #[serde(default)]
    pub latest_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
