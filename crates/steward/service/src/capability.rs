//! Capability catalogue.
//!
//! One permission name per operation family, `domain:action` style. The
//! default role set mirrors the facility staffing model: managers open
//! work orders, cleaners log sessions, inspectors approve items, admins
//! run the directory.

use steward_identity::{PermissionGrant, Role, RoleRegistry};
use steward_types::CoreResult;

pub const WORKORDER_CREATE: &str = "workorder:create";
pub const WORKORDER_APPROVE: &str = "workorder:approve";
pub const WORKORDER_VIEW: &str = "workorder:view";
pub const TIMELOG_RECORD: &str = "timelog:record";
pub const REPORT_VIEW: &str = "report:view";
pub const USER_MANAGE: &str = "user:manage";
pub const ROLE_MANAGE: &str = "role:manage";
pub const PERMISSION_MANAGE: &str = "permission:manage";

pub const ALL: &[&str] = &[
    WORKORDER_CREATE,
    WORKORDER_APPROVE,
    WORKORDER_VIEW,
    TIMELOG_RECORD,
    REPORT_VIEW,
    USER_MANAGE,
    ROLE_MANAGE,
    PERMISSION_MANAGE,
];

/// The four stock roles created by [`seed_default_rbac`].
#[derive(Clone, Debug)]
pub struct DefaultRoles {
    pub admin: Role,
    pub manager: Role,
    pub cleaner: Role,
    pub inspector: Role,
}

/// Create the full permission catalogue and the stock roles with their
/// grants. Idempotence is not attempted; call once on an empty registry.
pub fn seed_default_rbac(roles: &RoleRegistry) -> CoreResult<DefaultRoles> {
    let mut grants = std::collections::HashMap::new();
    for name in ALL {
        let permission = roles.create_permission(*name)?;
        grants.insert(
            *name,
            PermissionGrant {
                permission_id: permission.id,
                name: permission.name,
            },
        );
    }
    let grant = |name: &str| grants[name].clone();

    let admin = roles.create_role("Admin")?;
    roles.assign_permissions(
        &admin.id,
        vec![
            grant(USER_MANAGE),
            grant(ROLE_MANAGE),
            grant(PERMISSION_MANAGE),
            grant(WORKORDER_VIEW),
            grant(REPORT_VIEW),
        ],
    )?;

    let manager = roles.create_role("Manager")?;
    roles.assign_permissions(
        &manager.id,
        vec![
            grant(WORKORDER_CREATE),
            grant(WORKORDER_VIEW),
            grant(REPORT_VIEW),
        ],
    )?;

    let cleaner = roles.create_role("Cleaner")?;
    roles.assign_permissions(
        &cleaner.id,
        vec![grant(TIMELOG_RECORD), grant(WORKORDER_VIEW)],
    )?;

    let inspector = roles.create_role("Inspector")?;
    roles.assign_permissions(
        &inspector.id,
        vec![grant(WORKORDER_APPROVE), grant(WORKORDER_VIEW)],
    )?;

    Ok(DefaultRoles {
        admin,
        manager,
        cleaner,
        inspector,
    })
}
