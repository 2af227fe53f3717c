//! Steward Session - authentication and role-scoped session issuance
//!
//! Login runs a small state machine: credentials are checked once, then the
//! attempt lands in one of three states - rejected, authenticated with a
//! long-lived token, or pending role selection with a 60-second provisional
//! token. Tokens are opaque downstream; every later authorization decision
//! reads the role from the token, never from a fresh store lookup, so role
//! edits only take effect for sessions issued after them.

#![deny(unsafe_code)]

pub mod issuer;
pub mod token;

pub use issuer::{AvailableRole, LoginOutcome, SessionIssuer};
pub use token::{SessionClaims, SessionToken, TokenKind, TokenSigner};
