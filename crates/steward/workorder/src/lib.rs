//! Steward Work Orders - the checklist completion core
//!
//! A work order is a unit of cleaning-plus-inspection work tied to exactly
//! one room/location pair. Its checklist items are cloned from the room's
//! template at creation and owned by the order from then on. Completion is
//! a barrier: many independently updatable items must all be done before
//! the order irreversibly closes, and the closing write is a compare-and-set
//! so concurrent completions of the last item produce exactly one closure.

#![deny(unsafe_code)]

pub mod directory;
pub mod engine;
pub mod order;
pub mod store;

pub use directory::{InMemoryRoomDirectory, RoomDirectory, TemplateEntry, UserDirectory};
pub use engine::{CompletionOutcome, CompletionReport, CreateWorkOrder, WorkOrderEngine};
pub use order::{ChecklistItem, WorkOrder};
pub use store::{InMemoryWorkOrderStore, WorkOrderStore};
