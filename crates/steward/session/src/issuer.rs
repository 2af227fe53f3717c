//! The session issuer.
//!
//! Credential verification happens exactly once per attempt; everything
//! downstream trusts the token. Multi-role users get a provisional token
//! and must pick a role before any role-scoped operation will accept them.

use crate::token::{SessionClaims, SessionToken, TokenKind, TokenSigner};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use steward_identity::{PasswordHasher, RoleRegistry, UserRegistry};
use steward_types::{CoreError, CoreResult, RoleId};
use tracing::{info, warn};

const DEFAULT_SESSION_TTL_SECS: i64 = 360_000;
const PROVISIONAL_TTL_SECS: i64 = 60;

/// One role a multi-role user may select at login.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AvailableRole {
    pub role_id: RoleId,
    pub role_name: String,
}

/// Where a login attempt landed after the credential check.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum LoginOutcome {
    /// Single-role user: ready to work.
    Authenticated { token: SessionToken },
    /// Multi-role user: pick one within the provisional window.
    RoleSelectionRequired {
        provisional_token: SessionToken,
        available_roles: Vec<AvailableRole>,
    },
}

/// Issues and validates role-scoped session tokens.
pub struct SessionIssuer {
    signer: TokenSigner,
    users: Arc<UserRegistry>,
    roles: Arc<RoleRegistry>,
    hasher: Arc<dyn PasswordHasher>,
    session_ttl: Duration,
    provisional_ttl: Duration,
}

impl SessionIssuer {
    pub fn new(
        signer: TokenSigner,
        users: Arc<UserRegistry>,
        roles: Arc<RoleRegistry>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            signer,
            users,
            roles,
            hasher,
            session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
            provisional_ttl: Duration::seconds(PROVISIONAL_TTL_SECS),
        }
    }

    /// Override token lifetimes (deploy-time configuration).
    pub fn with_ttls(mut self, session_ttl: Duration, provisional_ttl: Duration) -> Self {
        self.session_ttl = session_ttl;
        self.provisional_ttl = provisional_ttl;
        self
    }

    /// Check credentials and issue a token.
    ///
    /// The rejection message is identical for unknown username, wrong
    /// password, and inactive account, so callers cannot probe which
    /// usernames exist.
    pub fn login(&self, username: &str, password: &str) -> CoreResult<LoginOutcome> {
        let rejected = || CoreError::Unauthorized("incorrect credentials".into());

        let user = self.users.find_by_username(username)?.ok_or_else(rejected)?;
        if !self.hasher.verify(password, &user.password_hash) {
            warn!(username = %user.username, "login rejected: bad password");
            return Err(rejected());
        }
        if !user.status.is_active() {
            warn!(username = %user.username, "login rejected: inactive account");
            return Err(rejected());
        }

        let user_roles = self.roles.roles_for(&user.id)?;
        match user_roles.len() {
            0 => Err(CoreError::Unauthorized(
                "no role assigned; contact an administrator".into(),
            )),
            1 => {
                let row = &user_roles[0];
                let token = self.mint(
                    &user.id,
                    &user.username,
                    &row.role_id,
                    TokenKind::Full,
                    self.session_ttl,
                )?;
                info!(user = %user.id, role = %row.role_id, "session issued");
                Ok(LoginOutcome::Authenticated { token })
            }
            _ => {
                // Provisional tokens are bound to the first listed role but
                // only role selection will accept them.
                let first = &user_roles[0];
                let provisional_token = self.mint(
                    &user.id,
                    &user.username,
                    &first.role_id,
                    TokenKind::Provisional,
                    self.provisional_ttl,
                )?;
                let available_roles = user_roles
                    .into_iter()
                    .map(|row| AvailableRole {
                        role_id: row.role_id,
                        role_name: row.role_name,
                    })
                    .collect();
                info!(user = %user.id, "role selection required");
                Ok(LoginOutcome::RoleSelectionRequired {
                    provisional_token,
                    available_roles,
                })
            }
        }
    }

    /// Exchange a provisional token plus a role choice for a full session
    /// token. The chosen role must be one the user actually holds.
    pub fn select_role(
        &self,
        provisional: &SessionToken,
        selected_role: &RoleId,
    ) -> CoreResult<SessionToken> {
        let claims = self.signer.decode(provisional)?;
        if claims.kind != TokenKind::Provisional {
            return Err(CoreError::Unauthorized(
                "role selection requires a provisional token".into(),
            ));
        }
        if claims.is_expired_at(Utc::now()) {
            return Err(CoreError::Unauthorized("provisional token expired".into()));
        }

        let held = self
            .roles
            .roles_for(&claims.user_id)?
            .into_iter()
            .any(|row| &row.role_id == selected_role);
        if !held {
            return Err(CoreError::Validation(
                "selected role is not assigned to this user".into(),
            ));
        }

        let token = self.mint(
            &claims.user_id,
            &claims.username,
            selected_role,
            TokenKind::Full,
            self.session_ttl,
        )?;
        info!(user = %claims.user_id, role = %selected_role, "session issued after role selection");
        Ok(token)
    }

    /// Resolve the caller behind a token. Provisional tokens are rejected:
    /// they exist only to complete role selection.
    pub fn authenticate(&self, token: &SessionToken) -> CoreResult<SessionClaims> {
        let claims = self.signer.decode(token)?;
        if claims.kind != TokenKind::Full {
            return Err(CoreError::Unauthorized(
                "provisional token cannot authorize operations".into(),
            ));
        }
        if claims.is_expired_at(Utc::now()) {
            return Err(CoreError::Unauthorized("session expired".into()));
        }
        Ok(claims)
    }

    fn mint(
        &self,
        user_id: &steward_types::UserId,
        username: &str,
        role_id: &RoleId,
        kind: TokenKind,
        ttl: Duration,
    ) -> CoreResult<SessionToken> {
        let now = Utc::now();
        self.signer.encode(&SessionClaims {
            user_id: user_id.clone(),
            username: username.to_string(),
            role_id: role_id.clone(),
            kind,
            issued_at: now,
            expires_at: now + ttl,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steward_identity::{Blake3PasswordHasher, NewUser};
    use steward_types::UserId;

    struct Fixture {
        issuer: SessionIssuer,
        users: Arc<UserRegistry>,
        roles: Arc<RoleRegistry>,
        signer: TokenSigner,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(UserRegistry::new());
        let roles = Arc::new(RoleRegistry::new());
        let signer = TokenSigner::new([7u8; 32]);
        let issuer = SessionIssuer::new(
            signer.clone(),
            Arc::clone(&users),
            Arc::clone(&roles),
            Arc::new(Blake3PasswordHasher::new()),
        );
        Fixture {
            issuer,
            users,
            roles,
            signer,
        }
    }

    fn add_user(f: &Fixture, username: &str) -> UserId {
        f.users
            .create_user(
                NewUser {
                    username: username.into(),
                    password: "pw".into(),
                    email: format!("{username}@example.com"),
                    phone: "555-0100".into(),
                    address_ref: None,
                },
                &Blake3PasswordHasher::new(),
            )
            .unwrap()
            .id
    }

    #[test]
    fn single_role_login_issues_a_usable_token() {
        let f = fixture();
        let user = add_user(&f, "alice");
        let role = f.roles.create_role("Inspector").unwrap();
        f.roles.assign_role(&user, &role.id).unwrap();

        let outcome = f.issuer.login("alice", "pw").unwrap();
        let LoginOutcome::Authenticated { token } = outcome else {
            panic!("expected immediate authentication");
        };

        let claims = f.issuer.authenticate(&token).unwrap();
        assert_eq!(claims.user_id, user);
        assert_eq!(claims.role_id, role.id);
    }

    #[test]
    fn two_role_login_requires_selection() {
        let f = fixture();
        let user = add_user(&f, "bob");
        let inspector = f.roles.create_role("Inspector").unwrap();
        let manager = f.roles.create_role("Manager").unwrap();
        f.roles.assign_role(&user, &inspector.id).unwrap();
        f.roles.assign_role(&user, &manager.id).unwrap();

        let outcome = f.issuer.login("bob", "pw").unwrap();
        let LoginOutcome::RoleSelectionRequired {
            provisional_token,
            available_roles,
        } = outcome
        else {
            panic!("expected role selection");
        };
        assert_eq!(available_roles.len(), 2);

        // the provisional token cannot authorize role-scoped work
        let err = f.issuer.authenticate(&provisional_token).unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));

        let token = f
            .issuer
            .select_role(&provisional_token, &manager.id)
            .unwrap();
        let claims = f.issuer.authenticate(&token).unwrap();
        assert_eq!(claims.role_id, manager.id);
    }

    #[test]
    fn selecting_an_unheld_role_fails_validation_without_a_token() {
        let f = fixture();
        let user = add_user(&f, "carol");
        let r1 = f.roles.create_role("Inspector").unwrap();
        let r2 = f.roles.create_role("Manager").unwrap();
        let foreign = f.roles.create_role("Admin").unwrap();
        f.roles.assign_role(&user, &r1.id).unwrap();
        f.roles.assign_role(&user, &r2.id).unwrap();

        let LoginOutcome::RoleSelectionRequired {
            provisional_token, ..
        } = f.issuer.login("carol", "pw").unwrap()
        else {
            panic!("expected role selection");
        };

        let err = f
            .issuer
            .select_role(&provisional_token, &foreign.id)
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn expired_provisional_token_is_unauthorized() {
        let f = fixture();
        let user = add_user(&f, "dave");
        let role = f.roles.create_role("Inspector").unwrap();
        f.roles.assign_role(&user, &role.id).unwrap();

        let now = Utc::now();
        let stale = f
            .signer
            .encode(&SessionClaims {
                user_id: user,
                username: "dave".into(),
                role_id: role.id.clone(),
                kind: TokenKind::Provisional,
                issued_at: now - Duration::seconds(120),
                expires_at: now - Duration::seconds(60),
            })
            .unwrap();

        let err = f.issuer.select_role(&stale, &role.id).unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));
    }

    #[test]
    fn login_failures_share_one_message() {
        let f = fixture();
        let user = add_user(&f, "erin");
        let role = f.roles.create_role("Cleaner").unwrap();
        f.roles.assign_role(&user, &role.id).unwrap();

        let unknown = f.issuer.login("nobody", "pw").unwrap_err();
        let wrong_pw = f.issuer.login("erin", "nope").unwrap_err();
        f.users.deactivate_user(&user).unwrap();
        let inactive = f.issuer.login("erin", "pw").unwrap_err();

        assert_eq!(unknown, wrong_pw);
        assert_eq!(wrong_pw, inactive);
    }

    #[test]
    fn role_edits_do_not_revoke_issued_tokens() {
        let f = fixture();
        let user = add_user(&f, "frank");
        let role = f.roles.create_role("Inspector").unwrap();
        f.roles.assign_role(&user, &role.id).unwrap();

        let LoginOutcome::Authenticated { token } = f.issuer.login("frank", "pw").unwrap() else {
            panic!("expected immediate authentication");
        };

        // removing the role after issuance does not invalidate the token
        f.roles.remove_user_role(&user, &role.id).unwrap();
        let claims = f.issuer.authenticate(&token).unwrap();
        assert_eq!(claims.role_id, role.id);
    }

    #[test]
    fn zero_roles_cannot_log_in() {
        let f = fixture();
        add_user(&f, "grace");
        let err = f.issuer.login("grace", "pw").unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));
    }
}
