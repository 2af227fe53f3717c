//! Steward Types - shared vocabulary for the work-order core
//!
//! Identifiers are newtype strings so a `RoomId` can never be passed where a
//! `UserId` is expected. The error taxonomy in [`CoreError`] is shared by
//! every crate in the workspace; callers match on the variant to decide
//! whether a failure is retryable, a caller bug, or a fault.

#![deny(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Identifiers ──────────────────────────────────────────────────────

/// Unique identifier for a user account
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a role
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(pub String);

impl RoleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a permission
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionId(pub String);

impl PermissionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for PermissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a facility location
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationId(pub String);

impl LocationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for LocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a room within a location
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a work order
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkOrderId(pub String);

impl WorkOrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl std::fmt::Display for WorkOrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a checklist item within a work order
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChecklistItemId(pub String);

impl ChecklistItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for ChecklistItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── User status ──────────────────────────────────────────────────────

/// Employment status of a user. Only `Active` users can log in or be
/// assigned to new work orders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub fn is_active(self) -> bool {
        matches!(self, UserStatus::Active)
    }
}

// ── Error taxonomy ───────────────────────────────────────────────────

/// Workspace-wide error taxonomy.
///
/// `Conflict` is reported rather than fatal (duplicate names, occupied
/// room/location pairs). `Internal` wraps storage and lock failures; it is
/// surfaced generically and must never take the process down.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum CoreError {
    /// Malformed or missing input. Retrying the same request cannot succeed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The caller's role or ownership does not permit the operation.
    /// Not a fault; no retry.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness rule would be violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A referenced entity exists but is not in the required state.
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    /// Missing, invalid, or expired credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Storage or other unexpected failure. Logged with context at the
    /// site that produced it.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Lock poisoning and similar infrastructure failures.
    pub fn internal(context: impl Into<String>) -> Self {
        CoreError::Internal(context.into())
    }
}

/// Result alias used across the workspace
pub type CoreResult<T> = Result<T, CoreError>;
