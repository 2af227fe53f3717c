//! Steward Service - the capability-gated operation surface
//!
//! Every operation declares the capability it requires; the facade resolves
//! the caller's role from the session token and checks the role's grant set
//! before dispatching. There are no role-name comparisons in business
//! logic - granting a capability to a new role is a data change, not a code
//! change.

#![deny(unsafe_code)]

pub mod capability;
pub mod facade;
pub mod reports;

pub use capability::DefaultRoles;
pub use facade::{CreateWorkOrderRequest, Steward, SubmitSessionRequest};
pub use reports::{CleanerHistory, RoomHistory, StaffMember};
