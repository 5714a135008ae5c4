//! Stats aggregator.

use curricula_core::permissions::{visibility_scope, Actor};
use curricula_db::models::stats::CurriculumStats;
use curricula_db::repositories::StatsRepo;
use curricula_db::DbPool;

use crate::error::AppResult;

/// Per-kind, per-status counts of what `actor` may see: everything for
/// admins, the own department for staff, active versions for students.
pub async fn curriculum_stats(pool: &DbPool, actor: &Actor) -> AppResult<CurriculumStats> {
    Ok(StatsRepo::counts(pool, visibility_scope(actor)).await?)
}
