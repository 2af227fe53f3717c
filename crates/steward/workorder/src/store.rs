//! Work order persistence seam.
//!
//! The store owns every `WorkOrder` and is the only place order state
//! changes. `close_if_open` is the barrier write of the completion engine:
//! it must be a single atomic compare-and-set on the closed flag, never a
//! read followed by a separate write, so that N concurrent completions of
//! the last item close the order exactly once.

use crate::order::WorkOrder;
use std::collections::HashMap;
use std::sync::RwLock;
use steward_types::{ChecklistItemId, CoreError, CoreResult, LocationId, RoomId, UserId, WorkOrderId};

pub trait WorkOrderStore: Send + Sync {
    /// Persist a new order. Fails `Conflict` if any order - open or closed -
    /// already occupies the same room/location pair.
    fn insert(&self, order: WorkOrder) -> CoreResult<()>;

    fn get(&self, id: &WorkOrderId) -> CoreResult<WorkOrder>;

    /// Set `is_done = true` on every listed item that exists; ids matching
    /// nothing are silently ignored. Returns the updated order.
    fn mark_items(&self, id: &WorkOrderId, items: &[ChecklistItemId]) -> CoreResult<WorkOrder>;

    /// Atomically flip `is_closed` false to true. Returns `true` only for
    /// the caller that performed the transition; `false` means the order
    /// was already closed at write time.
    fn close_if_open(&self, id: &WorkOrderId) -> CoreResult<bool>;

    fn find_by_room(&self, room: &RoomId) -> CoreResult<Option<WorkOrder>>;

    fn find_by_pair(&self, room: &RoomId, location: &LocationId) -> CoreResult<Option<WorkOrder>>;

    fn open_orders_for_inspector(&self, inspector: &UserId) -> CoreResult<Vec<WorkOrder>>;

    fn open_orders_for_cleaner(&self, cleaner: &UserId) -> CoreResult<Vec<WorkOrder>>;

    fn orders_for_cleaner(&self, cleaner: &UserId) -> CoreResult<Vec<WorkOrder>>;

    fn all(&self) -> CoreResult<Vec<WorkOrder>>;
}

struct OrderTable {
    orders: HashMap<WorkOrderId, WorkOrder>,
    /// Uniqueness index: one order per (room, location), closure state
    /// notwithstanding.
    by_pair: HashMap<(RoomId, LocationId), WorkOrderId>,
}

/// In-memory store. All mutation happens under one write lock, which is
/// what makes `close_if_open` a true compare-and-set.
pub struct InMemoryWorkOrderStore {
    table: RwLock<OrderTable>,
}

impl InMemoryWorkOrderStore {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(OrderTable {
                orders: HashMap::new(),
                by_pair: HashMap::new(),
            }),
        }
    }

    fn read(&self) -> CoreResult<std::sync::RwLockReadGuard<'_, OrderTable>> {
        self.table
            .read()
            .map_err(|_| CoreError::internal("work order table lock poisoned"))
    }

    fn write(&self) -> CoreResult<std::sync::RwLockWriteGuard<'_, OrderTable>> {
        self.table
            .write()
            .map_err(|_| CoreError::internal("work order table lock poisoned"))
    }
}

impl Default for InMemoryWorkOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkOrderStore for InMemoryWorkOrderStore {
    fn insert(&self, order: WorkOrder) -> CoreResult<()> {
        let mut table = self.write()?;
        let pair = (order.room.clone(), order.location.clone());
        if table.by_pair.contains_key(&pair) {
            return Err(CoreError::Conflict(format!(
                "a work order for room {} at location {} already exists",
                order.room, order.location
            )));
        }
        table.by_pair.insert(pair, order.id.clone());
        table.orders.insert(order.id.clone(), order);
        Ok(())
    }

    fn get(&self, id: &WorkOrderId) -> CoreResult<WorkOrder> {
        let table = self.read()?;
        table
            .orders
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("work order {}", id)))
    }

    fn mark_items(&self, id: &WorkOrderId, items: &[ChecklistItemId]) -> CoreResult<WorkOrder> {
        let mut table = self.write()?;
        let order = table
            .orders
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound(format!("work order {}", id)))?;
        for item in order.items.iter_mut() {
            if items.contains(&item.id) {
                item.is_done = true;
            }
        }
        Ok(order.clone())
    }

    fn close_if_open(&self, id: &WorkOrderId) -> CoreResult<bool> {
        let mut table = self.write()?;
        let order = table
            .orders
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound(format!("work order {}", id)))?;
        if order.is_closed {
            Ok(false)
        } else {
            order.is_closed = true;
            Ok(true)
        }
    }

    fn find_by_room(&self, room: &RoomId) -> CoreResult<Option<WorkOrder>> {
        let table = self.read()?;
        Ok(table
            .orders
            .values()
            .find(|order| &order.room == room)
            .cloned())
    }

    fn find_by_pair(&self, room: &RoomId, location: &LocationId) -> CoreResult<Option<WorkOrder>> {
        let table = self.read()?;
        Ok(table
            .by_pair
            .get(&(room.clone(), location.clone()))
            .and_then(|id| table.orders.get(id))
            .cloned())
    }

    fn open_orders_for_inspector(&self, inspector: &UserId) -> CoreResult<Vec<WorkOrder>> {
        let table = self.read()?;
        Ok(table
            .orders
            .values()
            .filter(|order| &order.inspector == inspector && !order.is_closed)
            .cloned()
            .collect())
    }

    fn open_orders_for_cleaner(&self, cleaner: &UserId) -> CoreResult<Vec<WorkOrder>> {
        let table = self.read()?;
        Ok(table
            .orders
            .values()
            .filter(|order| &order.cleaner == cleaner && !order.is_closed)
            .cloned()
            .collect())
    }

    fn orders_for_cleaner(&self, cleaner: &UserId) -> CoreResult<Vec<WorkOrder>> {
        let table = self.read()?;
        Ok(table
            .orders
            .values()
            .filter(|order| &order.cleaner == cleaner)
            .cloned()
            .collect())
    }

    fn all(&self) -> CoreResult<Vec<WorkOrder>> {
        let table = self.read()?;
        Ok(table.orders.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::ChecklistItem;

    fn order(room: &str, location: &str) -> WorkOrder {
        WorkOrder {
            id: WorkOrderId::generate(),
            manager: UserId::new("mgr"),
            cleaner: UserId::new("cln"),
            inspector: UserId::new("ins"),
            location: LocationId::new(location),
            room: RoomId::new(room),
            items: vec![ChecklistItem::new("mop floor", None)],
            is_closed: false,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn pair_uniqueness_holds_even_after_closure() {
        let store = InMemoryWorkOrderStore::new();
        let first = order("r1", "l1");
        let id = first.id.clone();
        store.insert(first).unwrap();

        assert!(store.close_if_open(&id).unwrap());

        let err = store.insert(order("r1", "l1")).unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));

        // a different pair is fine
        store.insert(order("r1", "l2")).unwrap();
        store.insert(order("r2", "l1")).unwrap();
    }

    #[test]
    fn close_if_open_transitions_exactly_once() {
        let store = InMemoryWorkOrderStore::new();
        let wo = order("r1", "l1");
        let id = wo.id.clone();
        store.insert(wo).unwrap();

        assert!(store.close_if_open(&id).unwrap());
        assert!(!store.close_if_open(&id).unwrap());
        assert!(store.get(&id).unwrap().is_closed);
    }

    #[test]
    fn mark_items_ignores_unknown_ids() {
        let store = InMemoryWorkOrderStore::new();
        let wo = order("r1", "l1");
        let id = wo.id.clone();
        let real_item = wo.items[0].id.clone();
        store.insert(wo).unwrap();

        let updated = store
            .mark_items(&id, &[ChecklistItemId::new("ghost"), real_item])
            .unwrap();
        assert!(updated.all_items_done());
    }

    #[test]
    fn unknown_order_is_not_found() {
        let store = InMemoryWorkOrderStore::new();
        let err = store.get(&WorkOrderId::new("missing")).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        let err = store.close_if_open(&WorkOrderId::new("missing")).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
