//! Roles, permissions, and their bindings.
//!
//! Grant assignment uses merge semantics: permissions a role already holds
//! are reported back to the caller and excluded from the insert, so only
//! net-new grants land. Removal likewise reports whether anything actually
//! matched instead of failing.
//!
//! `UserRole` rows snapshot the role name at assignment time; renaming a
//! role later does not rewrite existing rows.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use steward_types::{CoreError, CoreResult, PermissionId, RoleId, UserId};
use tracing::info;

/// A named role
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

/// A named permission
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
}

/// One permission granted to a role
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub permission_id: PermissionId,
    pub name: String,
}

/// The full grant set of one role
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RolePermission {
    pub role_id: RoleId,
    pub permissions: Vec<PermissionGrant>,
}

/// A role held by a user. Immutable snapshot row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserRole {
    pub user_id: UserId,
    pub role_id: RoleId,
    pub role_name: String,
    pub assigned_at: chrono::DateTime<chrono::Utc>,
}

/// Outcome of a merge-assign call
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssignmentReport {
    /// Grants inserted by this call
    pub added: Vec<PermissionGrant>,
    /// Names of grants the role already held; excluded from the insert
    pub already_present: Vec<String>,
    /// The role's grant set after the merge
    pub permissions: Vec<PermissionGrant>,
}

/// Outcome of a grant-removal call
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemovalReport {
    /// How many grants were actually pulled; zero is a report, not an error
    pub removed: usize,
}

/// Outcome of a global permission delete
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PruneReport {
    pub deleted: Permission,
    /// How many role bindings referenced the permission and were pruned
    pub roles_pruned: usize,
}

struct RbacTable {
    roles: HashMap<RoleId, Role>,
    permissions: HashMap<PermissionId, Permission>,
    role_permissions: HashMap<RoleId, Vec<PermissionGrant>>,
    user_roles: Vec<UserRole>,
}

/// In-memory role and permission store
pub struct RoleRegistry {
    table: RwLock<RbacTable>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(RbacTable {
                roles: HashMap::new(),
                permissions: HashMap::new(),
                role_permissions: HashMap::new(),
                user_roles: Vec::new(),
            }),
        }
    }

    pub fn create_role(&self, name: impl Into<String>) -> CoreResult<Role> {
        let name = name.into();
        let mut table = self.write()?;
        if table.roles.values().any(|r| r.name == name) {
            return Err(CoreError::Conflict(format!("role '{}' already exists", name)));
        }
        let role = Role {
            id: RoleId::generate(),
            name,
        };
        table.roles.insert(role.id.clone(), role.clone());
        info!(role = %role.id, name = %role.name, "role created");
        Ok(role)
    }

    pub fn create_permission(&self, name: impl Into<String>) -> CoreResult<Permission> {
        let name = name.into();
        let mut table = self.write()?;
        if table.permissions.values().any(|p| p.name == name) {
            return Err(CoreError::Conflict(format!(
                "permission '{}' already exists",
                name
            )));
        }
        let permission = Permission {
            id: PermissionId::generate(),
            name,
        };
        table
            .permissions
            .insert(permission.id.clone(), permission.clone());
        Ok(permission)
    }

    pub fn find_role(&self, id: &RoleId) -> CoreResult<Role> {
        let table = self.read()?;
        table
            .roles
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("role {}", id)))
    }

    pub fn all_roles(&self) -> CoreResult<Vec<Role>> {
        Ok(self.read()?.roles.values().cloned().collect())
    }

    pub fn all_permissions(&self) -> CoreResult<Vec<Permission>> {
        Ok(self.read()?.permissions.values().cloned().collect())
    }

    /// Delete a role along with its grant set. User-role snapshot rows for
    /// the role are removed as well so it stops appearing in login role
    /// lists.
    pub fn delete_role(&self, id: &RoleId) -> CoreResult<Role> {
        let mut table = self.write()?;
        let role = table
            .roles
            .remove(id)
            .ok_or_else(|| CoreError::NotFound(format!("role {}", id)))?;
        table.role_permissions.remove(id);
        table.user_roles.retain(|ur| &ur.role_id != id);
        info!(role = %id, name = %role.name, "role deleted");
        Ok(role)
    }

    /// Merge new grants into a role's set. Grants already present are
    /// reported, not errored, and excluded from the insert.
    pub fn assign_permissions(
        &self,
        role_id: &RoleId,
        grants: Vec<PermissionGrant>,
    ) -> CoreResult<AssignmentReport> {
        let mut table = self.write()?;
        if !table.roles.contains_key(role_id) {
            return Err(CoreError::NotFound(format!("role {}", role_id)));
        }
        for grant in &grants {
            if !table.permissions.contains_key(&grant.permission_id) {
                return Err(CoreError::NotFound(format!(
                    "permission {}",
                    grant.permission_id
                )));
            }
        }

        let existing = table.role_permissions.entry(role_id.clone()).or_default();

        let mut added = Vec::new();
        let mut already_present = Vec::new();
        for grant in grants {
            if existing
                .iter()
                .any(|g| g.permission_id == grant.permission_id)
            {
                already_present.push(grant.name);
            } else {
                existing.push(grant.clone());
                added.push(grant);
            }
        }

        let permissions = existing.clone();
        info!(
            role = %role_id,
            added = added.len(),
            skipped = already_present.len(),
            "permissions assigned"
        );
        Ok(AssignmentReport {
            added,
            already_present,
            permissions,
        })
    }

    /// Pull matching grants from a role. Nothing matching is reported via
    /// `removed == 0`, not a failure.
    pub fn remove_permissions(
        &self,
        role_id: &RoleId,
        permission_ids: &[PermissionId],
    ) -> CoreResult<RemovalReport> {
        let mut table = self.write()?;
        let Some(existing) = table.role_permissions.get_mut(role_id) else {
            return Ok(RemovalReport { removed: 0 });
        };
        let before = existing.len();
        existing.retain(|g| !permission_ids.contains(&g.permission_id));
        Ok(RemovalReport {
            removed: before - existing.len(),
        })
    }

    /// Delete a permission globally and prune it from every role binding
    /// that references it.
    pub fn delete_permission(&self, id: &PermissionId) -> CoreResult<PruneReport> {
        let mut table = self.write()?;
        let permission = table
            .permissions
            .remove(id)
            .ok_or_else(|| CoreError::NotFound(format!("permission {}", id)))?;

        let mut roles_pruned = 0;
        for grants in table.role_permissions.values_mut() {
            let before = grants.len();
            grants.retain(|g| &g.permission_id != id);
            if grants.len() != before {
                roles_pruned += 1;
            }
        }

        info!(permission = %id, roles_pruned, "permission deleted");
        Ok(PruneReport {
            deleted: permission,
            roles_pruned,
        })
    }

    /// Append a user-role row with the role name snapshotted now.
    /// Re-assigning a role the user already holds returns the existing row
    /// unchanged rather than stacking duplicates.
    pub fn assign_role(&self, user_id: &UserId, role_id: &RoleId) -> CoreResult<UserRole> {
        let mut table = self.write()?;
        let role = table
            .roles
            .get(role_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("role {}", role_id)))?;

        if let Some(existing) = table
            .user_roles
            .iter()
            .find(|ur| &ur.user_id == user_id && &ur.role_id == role_id)
        {
            return Ok(existing.clone());
        }

        let row = UserRole {
            user_id: user_id.clone(),
            role_id: role_id.clone(),
            role_name: role.name,
            assigned_at: chrono::Utc::now(),
        };
        table.user_roles.push(row.clone());
        info!(user = %user_id, role = %role_id, name = %row.role_name, "role assigned");
        Ok(row)
    }

    pub fn remove_user_role(&self, user_id: &UserId, role_id: &RoleId) -> CoreResult<RemovalReport> {
        let mut table = self.write()?;
        let before = table.user_roles.len();
        table
            .user_roles
            .retain(|ur| !(&ur.user_id == user_id && &ur.role_id == role_id));
        Ok(RemovalReport {
            removed: before - table.user_roles.len(),
        })
    }

    /// All role rows held by a user, in assignment order.
    pub fn roles_for(&self, user_id: &UserId) -> CoreResult<Vec<UserRole>> {
        let table = self.read()?;
        Ok(table
            .user_roles
            .iter()
            .filter(|ur| &ur.user_id == user_id)
            .cloned()
            .collect())
    }

    /// Users holding the named role, for staff listings.
    pub fn users_holding(&self, role_name: &str) -> CoreResult<Vec<UserId>> {
        let table = self.read()?;
        Ok(table
            .user_roles
            .iter()
            .filter(|ur| ur.role_name == role_name)
            .map(|ur| ur.user_id.clone())
            .collect())
    }

    /// The grant set the authorization layer checks capabilities against.
    pub fn permissions_for(&self, role_id: &RoleId) -> CoreResult<Vec<PermissionGrant>> {
        let table = self.read()?;
        Ok(table
            .role_permissions
            .get(role_id)
            .cloned()
            .unwrap_or_default())
    }

    pub fn role_has_permission(&self, role_id: &RoleId, name: &str) -> CoreResult<bool> {
        Ok(self
            .permissions_for(role_id)?
            .iter()
            .any(|g| g.name == name))
    }

    fn read(&self) -> CoreResult<std::sync::RwLockReadGuard<'_, RbacTable>> {
        self.table
            .read()
            .map_err(|_| CoreError::internal("rbac table lock poisoned"))
    }

    fn write(&self) -> CoreResult<std::sync::RwLockWriteGuard<'_, RbacTable>> {
        self.table
            .write()
            .map_err(|_| CoreError::internal("rbac table lock poisoned"))
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
