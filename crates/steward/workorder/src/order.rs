//! Work order aggregate.

use serde::{Deserialize, Serialize};
use steward_types::{ChecklistItemId, LocationId, RoomId, UserId, WorkOrderId};

/// One inspectable sub-task of a work order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: ChecklistItemId,
    pub name: String,
    pub is_done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl ChecklistItem {
    /// A fresh, not-yet-done item. Ids are minted here, independent of the
    /// template entry the item was cloned from.
    pub fn new(name: impl Into<String>, image_ref: Option<String>) -> Self {
        Self {
            id: ChecklistItemId::generate(),
            name: name.into(),
            is_done: false,
            image_ref,
        }
    }
}

/// A cleaning work order for one room/location pair.
///
/// The items vector is ordered and exclusively owned by the order; nothing
/// outside the store holds references into it. `is_closed` transitions
/// false to true exactly once and never back.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: WorkOrderId,
    pub manager: UserId,
    pub cleaner: UserId,
    pub inspector: UserId,
    pub location: LocationId,
    pub room: RoomId,
    pub items: Vec<ChecklistItem>,
    pub is_closed: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl WorkOrder {
    pub fn all_items_done(&self) -> bool {
        self.items.iter().all(|item| item.is_done)
    }

    /// Items still waiting on the inspector.
    pub fn pending_items(&self) -> Vec<&ChecklistItem> {
        self.items.iter().filter(|item| !item.is_done).collect()
    }
}
