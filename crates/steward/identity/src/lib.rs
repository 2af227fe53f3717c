//! Steward Identity - user directory and role/permission store
//!
//! Identity is the foundation of every authorization decision in the
//! work-order core: the session issuer reads user roles from here, and the
//! service layer resolves a role's grant set from here before dispatching
//! any operation.

#![deny(unsafe_code)]

pub mod password;
pub mod rbac;
pub mod user;

pub use password::{Blake3PasswordHasher, PasswordHasher};
pub use rbac::{
    AssignmentReport, Permission, PermissionGrant, PruneReport, RemovalReport, Role,
    RolePermission, RoleRegistry, UserRole,
};
pub use user::{NewUser, User, UserRegistry};
