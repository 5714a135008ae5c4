//! Caller permission guards.
//!
//! The department is the ownership boundary: staff act only on entities of
//! their own department, HODs review only their own department, and admins
//! act everywhere. Students only ever see active entities.

use serde::Serialize;

use crate::error::CoreError;
use crate::lifecycle::EntityStatus;
use crate::roles::Role;
use crate::types::DbId;

/// The authenticated caller of an engine operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub user_id: DbId,
    pub role: Role,
    pub department_id: Option<DbId>,
}

impl Actor {
    pub fn new(user_id: DbId, role: Role, department_id: Option<DbId>) -> Self {
        Self {
            user_id,
            role,
            department_id,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    fn belongs_to(&self, department_id: DbId) -> bool {
        self.department_id == Some(department_id)
    }
}

/// The set of entities a caller may read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityScope {
    /// Every entity (admin).
    All,
    /// Every entity of one department (faculty, HOD).
    Department(DbId),
    /// Active entities of every department (students, and staff without a
    /// department).
    ActiveOnly,
}

/// Resolve the read scope of a caller.
pub fn visibility_scope(actor: &Actor) -> VisibilityScope {
    match (actor.role, actor.department_id) {
        (Role::Admin, _) => VisibilityScope::All,
        (Role::Faculty | Role::Hod, Some(department_id)) => VisibilityScope::Department(department_id),
        _ => VisibilityScope::ActiveOnly,
    }
}

/// Check that `actor` may read an entity.
pub fn ensure_can_view(
    actor: &Actor,
    department_id: DbId,
    status: EntityStatus,
) -> Result<(), CoreError> {
    let visible = match visibility_scope(actor) {
        VisibilityScope::All => true,
        VisibilityScope::Department(own) => own == department_id || status == EntityStatus::Active,
        VisibilityScope::ActiveOnly => status == EntityStatus::Active,
    };
    if visible {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "You do not have access to this entity".into(),
        ))
    }
}

/// Resolve and check the department a new family is created in.
///
/// Staff create in their own department (an explicit `requested` must match
/// it); admins must name the department.
pub fn resolve_authoring_department(
    actor: &Actor,
    requested: Option<DbId>,
) -> Result<DbId, CoreError> {
    if !actor.role.is_staff() {
        return Err(CoreError::Forbidden(
            "Only faculty, HODs and admins may author curriculum entities".into(),
        ));
    }
    if actor.is_admin() {
        return requested.ok_or_else(|| {
            CoreError::Validation("department_id is required when creating as admin".into())
        });
    }
    let own = actor.department_id.ok_or_else(|| {
        CoreError::Forbidden("Your account is not assigned to a department".into())
    })?;
    match requested {
        Some(department_id) if department_id != own => Err(CoreError::Forbidden(format!(
            "You may only author entities in your own department ({own})"
        ))),
        _ => Ok(own),
    }
}

/// Check that `actor` may branch, edit or submit an entity: its creator,
/// a staff member of its department, or an admin.
pub fn ensure_can_author(
    actor: &Actor,
    department_id: DbId,
    creator_id: DbId,
) -> Result<(), CoreError> {
    if actor.is_admin() {
        return Ok(());
    }
    if actor.role.is_staff() && (actor.user_id == creator_id || actor.belongs_to(department_id)) {
        return Ok(());
    }
    Err(CoreError::Forbidden(
        "Only the creator or staff of the owning department may modify this entity".into(),
    ))
}

/// Check that `actor` may approve, reject, withdraw or publish: the HOD of
/// the entity's department, or an admin.
pub fn ensure_can_review(actor: &Actor, department_id: DbId) -> Result<(), CoreError> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::Hod if actor.belongs_to(department_id) => Ok(()),
        Role::Hod => Err(CoreError::Forbidden(
            "HODs may only review entities of their own department".into(),
        )),
        _ => Err(CoreError::Forbidden(
            "Only the HOD of the owning department or an admin may review this entity".into(),
        )),
    }
}

/// Check that `actor` may delete an entity: its creator, the HOD of its
/// department, or an admin.
pub fn ensure_can_delete(
    actor: &Actor,
    department_id: DbId,
    creator_id: DbId,
) -> Result<(), CoreError> {
    let allowed = actor.is_admin()
        || (actor.role.is_staff() && actor.user_id == creator_id)
        || (actor.role == Role::Hod && actor.belongs_to(department_id));
    if allowed {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Only the creator, the department HOD or an admin may delete this entity".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const DEPT_A: DbId = 1;
    const DEPT_B: DbId = 2;

    fn faculty(user_id: DbId, dept: DbId) -> Actor {
        Actor::new(user_id, Role::Faculty, Some(dept))
    }

    fn hod(user_id: DbId, dept: DbId) -> Actor {
        Actor::new(user_id, Role::Hod, Some(dept))
    }

    fn admin() -> Actor {
        Actor::new(99, Role::Admin, None)
    }

    fn student() -> Actor {
        Actor::new(50, Role::Student, Some(DEPT_A))
    }

    #[test]
    fn faculty_from_other_department_cannot_review() {
        assert_matches!(
            ensure_can_review(&faculty(10, DEPT_B), DEPT_A),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn faculty_of_same_department_cannot_review() {
        assert!(ensure_can_review(&faculty(10, DEPT_A), DEPT_A).is_err());
    }

    #[test]
    fn hod_reviews_only_own_department() {
        assert!(ensure_can_review(&hod(20, DEPT_A), DEPT_A).is_ok());
        assert!(ensure_can_review(&hod(20, DEPT_B), DEPT_A).is_err());
    }

    #[test]
    fn admin_reviews_everything() {
        assert!(ensure_can_review(&admin(), DEPT_A).is_ok());
        assert!(ensure_can_review(&admin(), DEPT_B).is_ok());
    }

    #[test]
    fn department_collaborators_may_author() {
        assert!(ensure_can_author(&faculty(11, DEPT_A), DEPT_A, 10).is_ok());
        assert!(ensure_can_author(&faculty(11, DEPT_B), DEPT_A, 10).is_err());
        // The creator keeps access after moving department.
        assert!(ensure_can_author(&faculty(10, DEPT_B), DEPT_A, 10).is_ok());
        assert!(ensure_can_author(&student(), DEPT_A, 10).is_err());
    }

    #[test]
    fn delete_rights() {
        assert!(ensure_can_delete(&faculty(10, DEPT_A), DEPT_A, 10).is_ok());
        assert!(ensure_can_delete(&faculty(11, DEPT_A), DEPT_A, 10).is_err());
        assert!(ensure_can_delete(&hod(20, DEPT_A), DEPT_A, 10).is_ok());
        assert!(ensure_can_delete(&hod(20, DEPT_B), DEPT_A, 10).is_err());
        assert!(ensure_can_delete(&admin(), DEPT_A, 10).is_ok());
    }

    #[test]
    fn authoring_department_resolution() {
        assert_eq!(resolve_authoring_department(&faculty(10, DEPT_A), None).unwrap(), DEPT_A);
        assert_eq!(
            resolve_authoring_department(&faculty(10, DEPT_A), Some(DEPT_A)).unwrap(),
            DEPT_A
        );
        assert_matches!(
            resolve_authoring_department(&faculty(10, DEPT_A), Some(DEPT_B)),
            Err(CoreError::Forbidden(_))
        );
        assert_matches!(
            resolve_authoring_department(&admin(), None),
            Err(CoreError::Validation(_))
        );
        assert_eq!(resolve_authoring_department(&admin(), Some(DEPT_B)).unwrap(), DEPT_B);
        assert!(resolve_authoring_department(&student(), None).is_err());
    }

    #[test]
    fn visibility_scopes() {
        assert_eq!(visibility_scope(&admin()), VisibilityScope::All);
        assert_eq!(visibility_scope(&hod(20, DEPT_A)), VisibilityScope::Department(DEPT_A));
        assert_eq!(visibility_scope(&student()), VisibilityScope::ActiveOnly);
        assert_eq!(
            visibility_scope(&Actor::new(7, Role::Faculty, None)),
            VisibilityScope::ActiveOnly
        );
    }

    #[test]
    fn students_only_view_active() {
        assert!(ensure_can_view(&student(), DEPT_A, EntityStatus::Active).is_ok());
        assert!(ensure_can_view(&student(), DEPT_A, EntityStatus::Draft).is_err());
    }

    #[test]
    fn staff_view_other_departments_only_when_active() {
        assert!(ensure_can_view(&faculty(10, DEPT_B), DEPT_A, EntityStatus::Active).is_ok());
        assert!(ensure_can_view(&faculty(10, DEPT_B), DEPT_A, EntityStatus::Approved).is_err());
        assert!(ensure_can_view(&faculty(10, DEPT_A), DEPT_A, EntityStatus::Archived).is_ok());
    }
}
