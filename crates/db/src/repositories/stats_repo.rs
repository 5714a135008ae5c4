//! Aggregate counts over `curriculum_entities`.

use curricula_core::permissions::VisibilityScope;
use sqlx::PgPool;

use crate::models::stats::{CurriculumStats, StatusCountRow};

/// Provides dashboard aggregates.
pub struct StatsRepo;

impl StatsRepo {
    /// Per-kind, per-status counts within `scope`.
    ///
    /// A department scope counts only that department's rows, unlike
    /// listings, which also show other departments' active versions.
    pub async fn counts(
        pool: &PgPool,
        scope: VisibilityScope,
    ) -> Result<CurriculumStats, sqlx::Error> {
        let (department_id, active_only) = match scope {
            VisibilityScope::All => (None, false),
            VisibilityScope::Department(department_id) => (Some(department_id), false),
            VisibilityScope::ActiveOnly => (None, true),
        };
        let rows = sqlx::query_as::<_, StatusCountRow>(
            "SELECT kind, status, COUNT(*)::BIGINT AS count \
             FROM curriculum_entities \
             WHERE ($1::BIGINT IS NULL OR department_id = $1) \
               AND (NOT $2 OR status = 'active') \
             GROUP BY kind, status",
        )
        .bind(department_id)
        .bind(active_only)
        .fetch_all(pool)
        .await?;

        Ok(CurriculumStats::from_rows(rows))
    }
}
