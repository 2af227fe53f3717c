//! Creation checks and the completion barrier.
//!
//! Creation validates collaborators in a fixed order (assignee status,
//! room/location membership, pair uniqueness, template non-emptiness) and
//! only then persists. The completion path applies item updates first and
//! evaluates the barrier afterwards; the closing write itself is the
//! store's compare-and-set, so a lost race surfaces as `AlreadyClosed`
//! rather than a duplicate closure.

use crate::directory::{RoomDirectory, UserDirectory};
use crate::order::{ChecklistItem, WorkOrder};
use crate::store::WorkOrderStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use steward_types::{
    ChecklistItemId, CoreError, CoreResult, LocationId, RoomId, UserId, WorkOrderId,
};
use tracing::info;

/// Request to create a work order.
#[derive(Clone, Debug, Deserialize)]
pub struct CreateWorkOrder {
    pub manager: UserId,
    pub room: RoomId,
    pub location: LocationId,
    pub cleaner: UserId,
    pub inspector: UserId,
}

/// Where a batch of item approvals left the order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionOutcome {
    /// Items remain open; no state change beyond the item updates.
    Incomplete,
    /// This call performed the one closing transition.
    Closed,
    /// Every item is done but another call already closed the order.
    AlreadyClosed,
}

/// Result of `mark_items_done`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompletionReport {
    pub outcome: CompletionOutcome,
    /// Item ids still open after this call.
    pub pending: Vec<ChecklistItemId>,
}

/// Work-order creation and checklist completion.
pub struct WorkOrderEngine {
    store: Arc<dyn WorkOrderStore>,
    rooms: Arc<dyn RoomDirectory>,
    users: Arc<dyn UserDirectory>,
}

impl WorkOrderEngine {
    pub fn new(
        store: Arc<dyn WorkOrderStore>,
        rooms: Arc<dyn RoomDirectory>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            store,
            rooms,
            users,
        }
    }

    pub fn store(&self) -> &Arc<dyn WorkOrderStore> {
        &self.store
    }

    /// Create a work order for a room/location pair.
    ///
    /// Active-status checks apply at creation time only; deactivating an
    /// assignee later does not touch existing orders.
    pub fn create(&self, request: CreateWorkOrder) -> CoreResult<WorkOrder> {
        if !self.users.is_active(&request.cleaner)? {
            return Err(CoreError::FailedPrecondition(format!(
                "cleaner {} is not active",
                request.cleaner
            )));
        }
        if !self.users.is_active(&request.inspector)? {
            return Err(CoreError::FailedPrecondition(format!(
                "inspector {} is not active",
                request.inspector
            )));
        }

        if !self
            .rooms
            .room_in_location(&request.room, &request.location)?
        {
            return Err(CoreError::Validation(format!(
                "room {} does not belong to location {}",
                request.room, request.location
            )));
        }

        if self
            .store
            .find_by_pair(&request.room, &request.location)?
            .is_some()
        {
            return Err(CoreError::Conflict(format!(
                "a work order for room {} at location {} already exists",
                request.room, request.location
            )));
        }

        let template = self.rooms.checklist_template(&request.room)?;
        if template.is_empty() {
            return Err(CoreError::Validation(format!(
                "room {} has an empty checklist template",
                request.room
            )));
        }

        let items: Vec<ChecklistItem> = template
            .into_iter()
            .map(|entry| ChecklistItem::new(entry.name, entry.image_ref))
            .collect();

        let order = WorkOrder {
            id: WorkOrderId::generate(),
            manager: request.manager,
            cleaner: request.cleaner,
            inspector: request.inspector,
            location: request.location,
            room: request.room,
            items,
            is_closed: false,
            created_at: chrono::Utc::now(),
        };

        // insert re-checks the pair under the write lock, closing the gap
        // between the check above and the write
        self.store.insert(order.clone())?;
        info!(
            order = %order.id,
            room = %order.room,
            location = %order.location,
            items = order.items.len(),
            "work order created"
        );
        Ok(order)
    }

    /// Approve checklist items and run the barrier.
    ///
    /// Only the order's assigned inspector may call this. Item ids matching
    /// nothing are silently ignored; re-marking an already-done item is
    /// idempotent, including after closure.
    pub fn mark_items_done(
        &self,
        order_id: &WorkOrderId,
        caller: &UserId,
        item_ids: &[ChecklistItemId],
    ) -> CoreResult<CompletionReport> {
        let order = self.store.get(order_id)?;
        if &order.inspector != caller {
            return Err(CoreError::PermissionDenied(format!(
                "user {} is not the assigned inspector of work order {}",
                caller, order_id
            )));
        }

        let updated = self.store.mark_items(order_id, item_ids)?;
        let pending: Vec<ChecklistItemId> = updated
            .items
            .iter()
            .filter(|item| !item.is_done)
            .map(|item| item.id.clone())
            .collect();

        let outcome = if !pending.is_empty() {
            CompletionOutcome::Incomplete
        } else if updated.is_closed {
            CompletionOutcome::AlreadyClosed
        } else if self.store.close_if_open(order_id)? {
            info!(order = %order_id, "work order closed");
            CompletionOutcome::Closed
        } else {
            CompletionOutcome::AlreadyClosed
        };

        Ok(CompletionReport { outcome, pending })
    }

    /// Items still awaiting approval, for the inspector's room view.
    pub fn pending_items(&self, order_id: &WorkOrderId) -> CoreResult<Vec<ChecklistItem>> {
        let order = self.store.get(order_id)?;
        Ok(order
            .pending_items()
            .into_iter()
            .cloned()
            .collect())
    }
}
