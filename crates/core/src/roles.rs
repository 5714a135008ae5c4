//! Well-known role names carried in access tokens.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_FACULTY: &str = "faculty";
pub const ROLE_HOD: &str = "hod";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_STUDENT: &str = "student";

/// All valid role names.
pub const VALID_ROLES: &[&str] = &[ROLE_FACULTY, ROLE_HOD, ROLE_ADMIN, ROLE_STUDENT];

/// The role a caller acts under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Faculty,
    Hod,
    Admin,
    Student,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Faculty => ROLE_FACULTY,
            Role::Hod => ROLE_HOD,
            Role::Admin => ROLE_ADMIN,
            Role::Student => ROLE_STUDENT,
        }
    }

    /// Staff roles may author curriculum entities.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Faculty | Role::Hod | Role::Admin)
    }

    /// Roles allowed to approve, reject, withdraw and publish.
    pub fn is_approver(self) -> bool {
        matches!(self, Role::Hod | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_FACULTY => Ok(Role::Faculty),
            ROLE_HOD => Ok(Role::Hod),
            ROLE_ADMIN => Ok(Role::Admin),
            ROLE_STUDENT => Ok(Role::Student),
            other => Err(CoreError::Validation(format!(
                "Invalid role '{other}'. Must be one of: {}",
                VALID_ROLES.join(", ")
            ))),
        }
    }
}
