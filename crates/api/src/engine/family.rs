//! Family-scoped locking and post-write verification.

use curricula_core::curriculum::EntityKind;
use curricula_core::error::CoreError;
use curricula_core::types::DbId;
use curricula_core::versioning::{check_family_invariants, latest_candidate};
use curricula_db::models::curriculum_entity::CurriculumEntity;
use curricula_db::repositories::EntityRepo;
use sqlx::PgConnection;

use crate::error::AppResult;

/// A version family locked for the rest of the current transaction.
#[derive(Debug)]
pub struct LockedFamily {
    pub kind: EntityKind,
    pub code: String,
    /// Rows as read under the lock, oldest first.
    pub rows: Vec<CurriculumEntity>,
}

impl LockedFamily {
    /// Lock the family `(kind, code)`, which may not exist yet.
    pub async fn lock(conn: &mut PgConnection, kind: EntityKind, code: &str) -> AppResult<Self> {
        let rows = EntityRepo::lock_family(conn, kind, code).await?;
        Ok(Self {
            kind,
            code: code.to_string(),
            rows,
        })
    }

    /// Lock the family of version `id` and return it with the version's
    /// locked row.
    ///
    /// Fails with `NotFound` if the row does not exist, belongs to another
    /// kind, or was deleted between the lookup and the lock.
    pub async fn lock_for(
        conn: &mut PgConnection,
        kind: EntityKind,
        id: DbId,
    ) -> AppResult<(Self, CurriculumEntity)> {
        let not_found = || CoreError::NotFound {
            entity: kind.label(),
            id,
        };

        // Kind and code never change, so an unlocked read is enough to find
        // the family.
        let unlocked = EntityRepo::find_by_id(&mut *conn, id)
            .await?
            .filter(|e| e.kind == kind)
            .ok_or_else(not_found)?;

        let family = Self::lock(conn, kind, &unlocked.code).await?;
        let subject = family.find(id).cloned().ok_or_else(not_found)?;
        Ok((family, subject))
    }

    pub fn find(&self, id: DbId) -> Option<&CurriculumEntity> {
        self.rows.iter().find(|e| e.id == id)
    }

    /// Move the latest flag to the row that should carry it after versions
    /// were archived or removed.
    pub async fn sync_latest(&self, conn: &mut PgConnection) -> AppResult<()> {
        let rows = EntityRepo::list_family(&mut *conn, self.kind, &self.code).await?;
        let Some(candidate) = latest_candidate(&rows) else {
            return Ok(());
        };
        let already_latest = rows
            .iter()
            .any(|e| e.id == candidate && e.is_latest_version);
        if !already_latest {
            EntityRepo::set_latest(conn, self.kind, &self.code, candidate).await?;
        }
        Ok(())
    }

    /// Re-read the family after writes and check its invariants.
    ///
    /// A violation is reported as an internal error, which rolls back the
    /// caller's transaction. Returns the fresh rows, with the derived
    /// pending flag populated.
    pub async fn verify(&self, conn: &mut PgConnection) -> AppResult<Vec<CurriculumEntity>> {
        let rows = EntityRepo::list_family(&mut *conn, self.kind, &self.code).await?;
        if let Err(violation) = check_family_invariants(&rows) {
            tracing::error!(
                kind = %self.kind,
                code = %self.code,
                violation = %violation,
                "Family invariant violated; rolling back"
            );
            return Err(CoreError::Internal(format!(
                "{} {} would violate a family invariant: {violation}",
                self.kind, self.code
            ))
            .into());
        }
        Ok(rows)
    }
}

/// Take version `id` out of freshly verified family rows.
pub fn take_row(rows: Vec<CurriculumEntity>, kind: EntityKind, id: DbId) -> AppResult<CurriculumEntity> {
    rows.into_iter()
        .find(|e| e.id == id)
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: kind.label(),
                id,
            }
            .into()
        })
}
