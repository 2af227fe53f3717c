//! The service facade.
//!
//! Wiring: one user registry, one role registry, one session issuer, one
//! work-order engine, one time-log recorder. `login` and `select_role` are
//! the only unauthenticated entry points; everything else goes through
//! `authorize`, which resolves the caller from the token and checks the
//! required capability against the role's grant set.

use crate::capability;
use crate::reports::{CleanerHistory, RoomHistory, StaffMember};
use serde::Deserialize;
use std::sync::Arc;
use steward_identity::{
    AssignmentReport, Blake3PasswordHasher, NewUser, PasswordHasher, Permission, PermissionGrant,
    PruneReport, RemovalReport, Role, RoleRegistry, User, UserRegistry, UserRole,
};
use steward_session::{LoginOutcome, SessionClaims, SessionIssuer, SessionToken, TokenSigner};
use steward_timelog::{TimeLog, TimeLogRecorder};
use steward_types::{
    ChecklistItemId, CoreError, CoreResult, LocationId, PermissionId, RoleId, RoomId, UserId,
    WorkOrderId,
};
use steward_workorder::{
    ChecklistItem, CompletionReport, CreateWorkOrder, InMemoryWorkOrderStore, RoomDirectory,
    UserDirectory, WorkOrder, WorkOrderEngine, WorkOrderStore,
};
use tracing::warn;

/// Bridges the identity crate's user registry into the work-order engine's
/// read-only directory seam.
struct RegistryUserDirectory(Arc<UserRegistry>);

impl UserDirectory for RegistryUserDirectory {
    fn is_active(&self, user: &UserId) -> CoreResult<bool> {
        match self.0.is_active(user) {
            Ok(active) => Ok(active),
            Err(CoreError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// Request to open a work order. The manager is the authenticated caller.
#[derive(Clone, Debug, Deserialize)]
pub struct CreateWorkOrderRequest {
    pub room: RoomId,
    pub location: LocationId,
    pub cleaner: UserId,
    pub inspector: UserId,
}

/// Request to log a cleaning session.
#[derive(Clone, Debug, Deserialize)]
pub struct SubmitSessionRequest {
    pub work_order: WorkOrderId,
    pub room: RoomId,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub stop_time: chrono::DateTime<chrono::Utc>,
}

/// The capability-gated work-order service.
pub struct Steward {
    users: Arc<UserRegistry>,
    roles: Arc<RoleRegistry>,
    issuer: SessionIssuer,
    engine: WorkOrderEngine,
    timelogs: TimeLogRecorder,
    hasher: Arc<dyn PasswordHasher>,
}

impl Steward {
    /// Assemble a service around a room directory, with in-memory stores
    /// and a fresh token key.
    pub fn new(rooms: Arc<dyn RoomDirectory>) -> Self {
        Self::with_store(rooms, Arc::new(InMemoryWorkOrderStore::new()))
    }

    /// Assemble with an explicit work-order store (the persistence seam).
    pub fn with_store(rooms: Arc<dyn RoomDirectory>, store: Arc<dyn WorkOrderStore>) -> Self {
        let users = Arc::new(UserRegistry::new());
        let roles = Arc::new(RoleRegistry::new());
        let hasher: Arc<dyn PasswordHasher> = Arc::new(Blake3PasswordHasher::new());
        let issuer = SessionIssuer::new(
            TokenSigner::from_random_key(),
            Arc::clone(&users),
            Arc::clone(&roles),
            Arc::clone(&hasher),
        );
        let engine = WorkOrderEngine::new(
            store,
            rooms,
            Arc::new(RegistryUserDirectory(Arc::clone(&users))),
        );
        Self {
            users,
            roles,
            issuer,
            engine,
            timelogs: TimeLogRecorder::new(),
            hasher,
        }
    }

    pub fn users(&self) -> &Arc<UserRegistry> {
        &self.users
    }

    pub fn roles(&self) -> &Arc<RoleRegistry> {
        &self.roles
    }

    /// Resolve the caller and require one capability.
    fn authorize(&self, token: &SessionToken, required: &str) -> CoreResult<SessionClaims> {
        let claims = self.issuer.authenticate(token)?;
        if !self
            .roles
            .role_has_permission(&claims.role_id, required)?
        {
            warn!(
                user = %claims.user_id,
                role = %claims.role_id,
                capability = required,
                "operation denied"
            );
            return Err(CoreError::PermissionDenied(format!(
                "missing capability '{}'",
                required
            )));
        }
        Ok(claims)
    }

    // ── Sessions ─────────────────────────────────────────────────────

    pub fn login(&self, username: &str, password: &str) -> CoreResult<LoginOutcome> {
        self.issuer.login(username, password)
    }

    pub fn select_role(
        &self,
        provisional: &SessionToken,
        selected_role: &RoleId,
    ) -> CoreResult<SessionToken> {
        self.issuer.select_role(provisional, selected_role)
    }

    // ── Work orders ──────────────────────────────────────────────────

    pub fn create_work_order(
        &self,
        token: &SessionToken,
        request: CreateWorkOrderRequest,
    ) -> CoreResult<WorkOrder> {
        let claims = self.authorize(token, capability::WORKORDER_CREATE)?;
        self.engine.create(CreateWorkOrder {
            manager: claims.user_id,
            room: request.room,
            location: request.location,
            cleaner: request.cleaner,
            inspector: request.inspector,
        })
    }

    /// Approve checklist items; the engine additionally pins the caller to
    /// the order's assigned inspector.
    pub fn approve_items(
        &self,
        token: &SessionToken,
        work_order: &WorkOrderId,
        items: &[ChecklistItemId],
    ) -> CoreResult<CompletionReport> {
        let claims = self.authorize(token, capability::WORKORDER_APPROVE)?;
        self.engine
            .mark_items_done(work_order, &claims.user_id, items)
    }

    pub fn pending_items(
        &self,
        token: &SessionToken,
        work_order: &WorkOrderId,
    ) -> CoreResult<Vec<ChecklistItem>> {
        self.authorize(token, capability::WORKORDER_VIEW)?;
        self.engine.pending_items(work_order)
    }

    /// Open orders assigned to the calling inspector.
    pub fn inspector_rooms(&self, token: &SessionToken) -> CoreResult<Vec<WorkOrder>> {
        let claims = self.authorize(token, capability::WORKORDER_VIEW)?;
        self.engine
            .store()
            .open_orders_for_inspector(&claims.user_id)
    }

    /// Open orders assigned to the calling cleaner.
    pub fn cleaner_rooms(&self, token: &SessionToken) -> CoreResult<Vec<WorkOrder>> {
        let claims = self.authorize(token, capability::WORKORDER_VIEW)?;
        self.engine.store().open_orders_for_cleaner(&claims.user_id)
    }

    pub fn all_work_orders(&self, token: &SessionToken) -> CoreResult<Vec<WorkOrder>> {
        self.authorize(token, capability::WORKORDER_VIEW)?;
        self.engine.store().all()
    }

    // ── Time logs ────────────────────────────────────────────────────

    /// Record a cleaning session. Never touches work-order state.
    pub fn submit_cleaning_session(
        &self,
        token: &SessionToken,
        request: SubmitSessionRequest,
    ) -> CoreResult<()> {
        self.authorize(token, capability::TIMELOG_RECORD)?;
        // referenced order must exist, but its state is irrelevant
        self.engine.store().get(&request.work_order)?;
        self.timelogs.record(TimeLog {
            work_order: request.work_order,
            room: request.room,
            start_time: request.start_time,
            stop_time: request.stop_time,
        })
    }

    // ── Reporting ────────────────────────────────────────────────────

    pub fn room_history(&self, token: &SessionToken, room: &RoomId) -> CoreResult<RoomHistory> {
        self.authorize(token, capability::REPORT_VIEW)?;
        Ok(RoomHistory {
            work_order: self.engine.store().find_by_room(room)?,
            sessions: self.timelogs.for_room(room)?,
        })
    }

    pub fn cleaner_history(
        &self,
        token: &SessionToken,
        cleaner: &UserId,
    ) -> CoreResult<CleanerHistory> {
        self.authorize(token, capability::REPORT_VIEW)?;
        let work_orders = self.engine.store().orders_for_cleaner(cleaner)?;
        let mut sessions = Vec::new();
        for order in &work_orders {
            sessions.extend(self.timelogs.for_work_order(&order.id)?);
        }
        Ok(CleanerHistory {
            cleaner: cleaner.clone(),
            work_orders,
            sessions,
        })
    }

    /// Active staff holding the named role.
    pub fn staff_with_role(
        &self,
        token: &SessionToken,
        role_name: &str,
    ) -> CoreResult<Vec<StaffMember>> {
        self.authorize(token, capability::USER_MANAGE)?;
        let holders = self.roles.users_holding(role_name)?;
        let mut staff = Vec::new();
        for user_id in holders {
            match self.users.find_user(&user_id) {
                Ok(user) if user.status.is_active() => staff.push(StaffMember {
                    user_id: user.id,
                    username: user.username,
                    email: user.email,
                    role_name: role_name.to_string(),
                }),
                Ok(_) => {}
                // a dangling role row is a data quirk, not a failure
                Err(CoreError::NotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(staff)
    }

    // ── Identity administration ──────────────────────────────────────

    pub fn create_user(&self, token: &SessionToken, request: NewUser) -> CoreResult<User> {
        self.authorize(token, capability::USER_MANAGE)?;
        self.users.create_user(request, self.hasher.as_ref())
    }

    pub fn deactivate_user(&self, token: &SessionToken, user: &UserId) -> CoreResult<()> {
        self.authorize(token, capability::USER_MANAGE)?;
        self.users.deactivate_user(user)
    }

    pub fn create_role(&self, token: &SessionToken, name: &str) -> CoreResult<Role> {
        self.authorize(token, capability::ROLE_MANAGE)?;
        self.roles.create_role(name)
    }

    pub fn delete_role(&self, token: &SessionToken, role: &RoleId) -> CoreResult<Role> {
        self.authorize(token, capability::ROLE_MANAGE)?;
        self.roles.delete_role(role)
    }

    pub fn assign_role(
        &self,
        token: &SessionToken,
        user: &UserId,
        role: &RoleId,
    ) -> CoreResult<UserRole> {
        self.authorize(token, capability::ROLE_MANAGE)?;
        self.roles.assign_role(user, role)
    }

    pub fn remove_user_role(
        &self,
        token: &SessionToken,
        user: &UserId,
        role: &RoleId,
    ) -> CoreResult<RemovalReport> {
        self.authorize(token, capability::ROLE_MANAGE)?;
        self.roles.remove_user_role(user, role)
    }

    pub fn create_permission(&self, token: &SessionToken, name: &str) -> CoreResult<Permission> {
        self.authorize(token, capability::PERMISSION_MANAGE)?;
        self.roles.create_permission(name)
    }

    pub fn delete_permission(
        &self,
        token: &SessionToken,
        permission: &PermissionId,
    ) -> CoreResult<PruneReport> {
        self.authorize(token, capability::PERMISSION_MANAGE)?;
        self.roles.delete_permission(permission)
    }

    pub fn assign_permissions(
        &self,
        token: &SessionToken,
        role: &RoleId,
        grants: Vec<PermissionGrant>,
    ) -> CoreResult<AssignmentReport> {
        self.authorize(token, capability::PERMISSION_MANAGE)?;
        self.roles.assign_permissions(role, grants)
    }

    pub fn remove_permissions(
        &self,
        token: &SessionToken,
        role: &RoleId,
        permissions: &[PermissionId],
    ) -> CoreResult<RemovalReport> {
        self.authorize(token, capability::PERMISSION_MANAGE)?;
        self.roles.remove_permissions(role, permissions)
    }
}
