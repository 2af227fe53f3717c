//! User directory.
//!
//! Usernames are unique case-insensitively and stored lowercase; lookups
//! fold case the same way. Deactivation flips the status flag and nothing
//! else - existing work orders keep their assignments (active status is
//! checked at creation time only).

use crate::password::PasswordHasher;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use steward_types::{CoreError, CoreResult, UserId, UserStatus};
use tracing::info;

/// A user account
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_ref: Option<String>,
    pub status: UserStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Request to create a user
#[derive(Clone, Debug, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub phone: String,
    pub address_ref: Option<String>,
}

struct UserTable {
    users: HashMap<UserId, User>,
    by_username: HashMap<String, UserId>,
}

/// In-memory user directory
pub struct UserRegistry {
    table: RwLock<UserTable>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(UserTable {
                users: HashMap::new(),
                by_username: HashMap::new(),
            }),
        }
    }

    /// Create a user. The username is lowercased before the uniqueness
    /// check so `Alice` and `alice` collide.
    pub fn create_user(
        &self,
        request: NewUser,
        hasher: &dyn PasswordHasher,
    ) -> CoreResult<User> {
        let username = request.username.trim().to_lowercase();
        if username.is_empty() {
            return Err(CoreError::Validation("username cannot be empty".into()));
        }

        let mut table = self
            .table
            .write()
            .map_err(|_| CoreError::internal("user table lock poisoned"))?;

        if table.by_username.contains_key(&username) {
            return Err(CoreError::Conflict(format!(
                "username '{}' already in use",
                username
            )));
        }

        let user = User {
            id: UserId::generate(),
            username: username.clone(),
            password_hash: hasher.hash(&request.password),
            email: request.email,
            phone: request.phone,
            address_ref: request.address_ref,
            status: UserStatus::Active,
            created_at: chrono::Utc::now(),
        };

        table.by_username.insert(username, user.id.clone());
        table.users.insert(user.id.clone(), user.clone());

        info!(user = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    pub fn find_user(&self, id: &UserId) -> CoreResult<User> {
        let table = self
            .table
            .read()
            .map_err(|_| CoreError::internal("user table lock poisoned"))?;
        table
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("user {}", id)))
    }

    /// Case-insensitive username lookup.
    pub fn find_by_username(&self, username: &str) -> CoreResult<Option<User>> {
        let table = self
            .table
            .read()
            .map_err(|_| CoreError::internal("user table lock poisoned"))?;
        let id = table.by_username.get(&username.trim().to_lowercase());
        Ok(id.and_then(|id| table.users.get(id)).cloned())
    }

    pub fn is_active(&self, id: &UserId) -> CoreResult<bool> {
        Ok(self.find_user(id)?.status.is_active())
    }

    /// Mark a user inactive. Existing assignments are untouched.
    pub fn deactivate_user(&self, id: &UserId) -> CoreResult<()> {
        self.set_status(id, UserStatus::Inactive)
    }

    pub fn activate_user(&self, id: &UserId) -> CoreResult<()> {
        self.set_status(id, UserStatus::Active)
    }

    fn set_status(&self, id: &UserId, status: UserStatus) -> CoreResult<()> {
        let mut table = self
            .table
            .write()
            .map_err(|_| CoreError::internal("user table lock poisoned"))?;
        let user = table
            .users
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound(format!("user {}", id)))?;
        user.status = status;
        info!(user = %id, status = ?status, "user status changed");
        Ok(())
    }

    /// All users, for joining against role assignments.
    pub fn all_users(&self) -> CoreResult<Vec<User>> {
        let table = self
            .table
            .read()
            .map_err(|_| CoreError::internal("user table lock poisoned"))?;
        Ok(table.users.values().cloned().collect())
    }
}

impl Default for UserRegistry {
    fn default() -> Self {
        Self::new()
    }
}
