//! Audit trail action names and timeline merging.
//!
//! Every mutating lifecycle operation appends one audit event; submit and
//! reject notes also go to a separate message log. The timeline is the
//! merge of both logs for one entity.

use serde::Serialize;

use crate::curriculum::EntityKind;
use crate::lifecycle::Trigger;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Action constants
// ---------------------------------------------------------------------------

/// Known audit event actions.
pub mod actions {
    pub const CREATED: &str = "created";
    pub const UPDATED: &str = "updated";
    pub const VERSION_CREATED: &str = "version_created";
    pub const SUBMITTED: &str = "submitted";
    pub const APPROVED: &str = "approved";
    pub const REJECTED: &str = "rejected";
    pub const WITHDRAWN: &str = "withdrawn";
    pub const PUBLISHED: &str = "published";
    pub const ARCHIVED: &str = "archived";
    pub const DELETED: &str = "deleted";
}

/// Audit action recorded on the subject row for `trigger`.
pub fn action_for(trigger: Trigger) -> &'static str {
    match trigger {
        Trigger::Edit => actions::UPDATED,
        Trigger::Submit => actions::SUBMITTED,
        Trigger::Approve => actions::APPROVED,
        Trigger::Reject => actions::REJECTED,
        Trigger::Withdraw => actions::WITHDRAWN,
        Trigger::Publish => actions::PUBLISHED,
        Trigger::Supersede | Trigger::Delete => actions::ARCHIVED,
        Trigger::Branch => actions::VERSION_CREATED,
    }
}

/// Human-readable description of an audit event.
pub fn describe(action: &str, kind: EntityKind, code: &str, version: i32) -> String {
    let subject = format!("{kind} {code} v{version}");
    match action {
        actions::CREATED => format!("Created {subject}"),
        actions::UPDATED => format!("Edited {subject}"),
        actions::VERSION_CREATED => format!("Created {subject} as a new draft"),
        actions::SUBMITTED => format!("Submitted {subject} for approval"),
        actions::APPROVED => format!("Approved {subject}"),
        actions::REJECTED => format!("Rejected {subject}"),
        actions::WITHDRAWN => format!("Withdrew approval of {subject}"),
        actions::PUBLISHED => format!("Published {subject}"),
        actions::ARCHIVED => format!("Archived {subject}"),
        actions::DELETED => format!("Deleted {subject}"),
        other => format!("{other}: {subject}"),
    }
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// Source log of a timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEntryKind {
    Event,
    Message,
}

/// One item of an entity's merged history.
///
/// `id` is drawn from a sequence shared by both logs, so it orders entries
/// by insertion when timestamps tie.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub id: DbId,
    pub entry_type: TimelineEntryKind,
    /// Audit action; `None` for messages.
    pub action: Option<String>,
    pub actor_id: DbId,
    pub text: String,
    pub timestamp: Timestamp,
}

/// Merge audit events and messages, newest first.
pub fn merge_timeline(
    events: Vec<TimelineEntry>,
    messages: Vec<TimelineEntry>,
) -> Vec<TimelineEntry> {
    let mut merged: Vec<TimelineEntry> = events.into_iter().chain(messages).collect();
    merged.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
    merged
}
