//! Authentication and authorization middleware extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireStaff`] -- Requires `faculty`, `hod` or `admin`.
//! - [`rbac::RequireApprover`] -- Requires `hod` or `admin`.
//!
//! These are coarse role gates. Department ownership is checked by the
//! engine against the entity being acted on.

pub mod auth;
pub mod rbac;
