//! Curriculum entity status state machine.
//!
//! Every status change in the engine goes through [`validate_transition`],
//! which owns the transition table. Guards that depend on the caller or on
//! sibling versions live in [`crate::permissions`] and [`crate::versioning`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_PENDING_APPROVAL: &str = "pending_approval";
pub const STATUS_APPROVED: &str = "approved";
pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_ARCHIVED: &str = "archived";

/// Lifecycle status of a single version row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    Draft,
    PendingApproval,
    Approved,
    Active,
    Archived,
}

impl EntityStatus {
    pub const ALL: [EntityStatus; 5] = [
        EntityStatus::Draft,
        EntityStatus::PendingApproval,
        EntityStatus::Approved,
        EntityStatus::Active,
        EntityStatus::Archived,
    ];

    /// Statuses that count as an open successor of the active version.
    pub const IN_FLIGHT: [EntityStatus; 3] = [
        EntityStatus::Draft,
        EntityStatus::PendingApproval,
        EntityStatus::Approved,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityStatus::Draft => STATUS_DRAFT,
            EntityStatus::PendingApproval => STATUS_PENDING_APPROVAL,
            EntityStatus::Approved => STATUS_APPROVED,
            EntityStatus::Active => STATUS_ACTIVE,
            EntityStatus::Archived => STATUS_ARCHIVED,
        }
    }

    pub fn is_in_flight(self) -> bool {
        Self::IN_FLIGHT.contains(&self)
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid status '{s}'. Must be one of: draft, pending_approval, \
                     approved, active, archived"
                ))
            })
    }
}

impl TryFrom<String> for EntityStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Triggers
// ---------------------------------------------------------------------------

/// An action that is checked against the transition table.
///
/// `Edit` and `Branch` do not change the subject's status but are still
/// gated by it, so they share the same table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Edit,
    Submit,
    Approve,
    Reject,
    Withdraw,
    Publish,
    /// Archival of the previous active version when a sibling is published.
    Supersede,
    Branch,
    Delete,
}

impl Trigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Trigger::Edit => "edit",
            Trigger::Submit => "submit",
            Trigger::Approve => "approve",
            Trigger::Reject => "reject",
            Trigger::Withdraw => "withdraw",
            Trigger::Publish => "publish",
            Trigger::Supersede => "supersede",
            Trigger::Branch => "create a new version of",
            Trigger::Delete => "delete",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// Status of the subject row after `trigger` is applied in status `from`.
///
/// Returns `None` when the table has no such row. `Delete` maps to
/// `Archived`; the engine hard-deletes instead when the row never reached
/// `approved` and nothing branched from it.
///
/// ```text
/// draft            --edit-->      draft
/// draft            --submit-->    pending_approval
/// pending_approval --approve-->   approved
/// pending_approval --reject-->    draft
/// approved         --withdraw-->  draft
/// approved         --publish-->   active
/// active           --supersede--> archived
/// approved|active  --branch-->    (unchanged)
/// draft|pending_approval|approved --delete--> archived
/// ```
pub fn next_status(from: EntityStatus, trigger: Trigger) -> Option<EntityStatus> {
    use EntityStatus::*;

    match (from, trigger) {
        (Draft, Trigger::Edit) => Some(Draft),
        (Draft, Trigger::Submit) => Some(PendingApproval),
        (PendingApproval, Trigger::Approve) => Some(Approved),
        (PendingApproval, Trigger::Reject) => Some(Draft),
        (Approved, Trigger::Withdraw) => Some(Draft),
        (Approved, Trigger::Publish) => Some(Active),
        (Active, Trigger::Supersede) => Some(Archived),
        (Approved | Active, Trigger::Branch) => Some(from),
        (Draft | PendingApproval | Approved, Trigger::Delete) => Some(Archived),
        _ => None,
    }
}

/// Triggers permitted in status `from`.
pub fn valid_triggers(from: EntityStatus) -> Vec<Trigger> {
    const TRIGGERS: [Trigger; 9] = [
        Trigger::Edit,
        Trigger::Submit,
        Trigger::Approve,
        Trigger::Reject,
        Trigger::Withdraw,
        Trigger::Publish,
        Trigger::Supersede,
        Trigger::Branch,
        Trigger::Delete,
    ];
    TRIGGERS
        .into_iter()
        .filter(|trigger| next_status(from, *trigger).is_some())
        .collect()
}

/// Validate a transition, returning the resulting status.
pub fn validate_transition(from: EntityStatus, trigger: Trigger) -> Result<EntityStatus, CoreError> {
    next_status(from, trigger).ok_or(CoreError::InvalidTransition { from, trigger })
}
