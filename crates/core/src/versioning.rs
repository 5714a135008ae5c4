//! Version families and the branching rules that keep them consistent.
//!
//! A family is every version sharing one `code` (per kind). The functions
//! here operate on a snapshot of a family, as loaded under the family lock,
//! and decide what a branch or publish must do.

use crate::curriculum::EntityKind;
use crate::error::CoreError;
use crate::lifecycle::{validate_transition, EntityStatus, Trigger};
use crate::types::DbId;

/// Read access to the lifecycle fields of a version row.
pub trait VersionedEntity {
    fn id(&self) -> DbId;
    fn kind(&self) -> EntityKind;
    fn code(&self) -> &str;
    fn version(&self) -> i32;
    fn status(&self) -> EntityStatus;
    fn parent_entity_id(&self) -> Option<DbId>;
    fn is_latest_version(&self) -> bool;
}

/// The in-flight version of the family other than `exclude_id`, if any.
pub fn in_flight_sibling<E: VersionedEntity>(family: &[E], exclude_id: DbId) -> Option<&E> {
    family
        .iter()
        .find(|e| e.id() != exclude_id && e.status().is_in_flight())
}

/// Whether another version of the family is draft, pending or approved.
pub fn has_new_pending_version<E: VersionedEntity>(family: &[E], id: DbId) -> bool {
    in_flight_sibling(family, id).is_some()
}

/// The active version of the family other than `exclude_id`, if any.
pub fn active_sibling<E: VersionedEntity>(family: &[E], exclude_id: DbId) -> Option<&E> {
    family
        .iter()
        .find(|e| e.id() != exclude_id && e.status() == EntityStatus::Active)
}

/// Next version number for a new branch: one past the highest existing.
pub fn next_version<E: VersionedEntity>(family: &[E]) -> i32 {
    family.iter().map(|e| e.version()).max().unwrap_or(0) + 1
}

/// Check that `source` may be branched into a new draft.
///
/// The source must be `approved` or `active`, and the family must not
/// already hold an in-flight version. An approved source is itself in
/// flight, so it is reported as the conflicting version.
pub fn ensure_can_branch<E: VersionedEntity>(source: &E, family: &[E]) -> Result<(), CoreError> {
    validate_transition(source.status(), Trigger::Branch)?;
    let open = family
        .iter()
        .filter(|e| e.status().is_in_flight())
        .max_by_key(|e| e.version());
    match open {
        Some(open) => Err(CoreError::OpenVersionExists {
            kind: source.kind(),
            code: source.code().to_string(),
            status: open.status(),
            version: open.version(),
        }),
        None => Ok(()),
    }
}

/// Version number for `create` on a code whose family is `family`.
///
/// An unused code starts at version 1. A family whose every version is
/// archived can be started again: the new line continues the numbering so
/// versions stay contiguous. Any live version makes the create a conflict.
pub fn version_for_create<E: VersionedEntity>(family: &[E]) -> Result<i32, CoreError> {
    match family
        .iter()
        .filter(|e| e.status() != EntityStatus::Archived)
        .max_by_key(|e| e.version())
    {
        Some(live) => Err(CoreError::Conflict(format!(
            "{} {} already exists (v{} is {}); create a new version instead",
            live.kind(),
            live.code(),
            live.version(),
            live.status()
        ))),
        None => Ok(next_version(family)),
    }
}

/// The row that should carry `is_latest_version`: the highest non-archived
/// version, or the highest version when every row is archived.
pub fn latest_candidate<E: VersionedEntity>(family: &[E]) -> Option<DbId> {
    family
        .iter()
        .max_by_key(|e| (e.status() != EntityStatus::Archived, e.version()))
        .map(|e| e.id())
}

/// Check every family invariant, returning a description of the first
/// violation found.
pub fn check_family_invariants<E: VersionedEntity>(family: &[E]) -> Result<(), String> {
    if family.is_empty() {
        return Ok(());
    }

    let in_flight = family.iter().filter(|e| e.status().is_in_flight()).count();
    if in_flight > 1 {
        return Err(format!("{in_flight} in-flight versions"));
    }

    let active = family
        .iter()
        .filter(|e| e.status() == EntityStatus::Active)
        .count();
    if active > 1 {
        return Err(format!("{active} active versions"));
    }

    let mut versions: Vec<i32> = family.iter().map(|e| e.version()).collect();
    versions.sort_unstable();
    if versions.iter().zip(1..).any(|(v, expected)| *v != expected) {
        return Err(format!("version numbers are not contiguous: {versions:?}"));
    }

    let latest: Vec<DbId> = family
        .iter()
        .filter(|e| e.is_latest_version())
        .map(|e| e.id())
        .collect();
    if latest.len() != 1 {
        return Err(format!("{} rows flagged latest", latest.len()));
    }
    if latest_candidate(family) != Some(latest[0]) {
        return Err(format!("row {} is flagged latest but is not the newest", latest[0]));
    }

    Ok(())
}
