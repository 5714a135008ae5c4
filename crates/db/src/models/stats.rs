//! Per-status counts for dashboard summaries.

use curricula_core::curriculum::EntityKind;
use curricula_core::lifecycle::EntityStatus;
use serde::Serialize;
use sqlx::FromRow;

/// One `GROUP BY kind, status` row.
#[derive(Debug, Clone, FromRow)]
pub struct StatusCountRow {
    #[sqlx(try_from = "String")]
    pub kind: EntityKind,
    #[sqlx(try_from = "String")]
    pub status: EntityStatus,
    pub count: i64,
}

/// Counts of one entity kind by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub draft: i64,
    pub pending_approval: i64,
    pub approved: i64,
    pub active: i64,
    pub archived: i64,
}

impl StatusCounts {
    fn add(&mut self, status: EntityStatus, count: i64) {
        let slot = match status {
            EntityStatus::Draft => &mut self.draft,
            EntityStatus::PendingApproval => &mut self.pending_approval,
            EntityStatus::Approved => &mut self.approved,
            EntityStatus::Active => &mut self.active,
            EntityStatus::Archived => &mut self.archived,
        };
        *slot += count;
    }
}

/// Response body of `GET /stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CurriculumStats {
    pub courses: StatusCounts,
    pub degrees: StatusCounts,
}

impl CurriculumStats {
    /// Fold grouped count rows into per-kind counts. Missing groups are zero.
    pub fn from_rows(rows: impl IntoIterator<Item = StatusCountRow>) -> Self {
        let mut stats = CurriculumStats::default();
        for row in rows {
            let counts = match row.kind {
                EntityKind::Course => &mut stats.courses,
                EntityKind::Degree => &mut stats.degrees,
            };
            counts.add(row.status, row.count);
        }
        stats
    }
}
