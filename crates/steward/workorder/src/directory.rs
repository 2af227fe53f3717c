//! Collaborator seams.
//!
//! Rooms, locations, and the user directory live outside this crate; the
//! engine only needs these two read-only views. The in-memory room
//! directory exists for wiring and tests - room CRUD itself is out of
//! scope here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use steward_types::{CoreError, CoreResult, LocationId, RoomId, UserId};

/// One entry of a room's checklist template.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TemplateEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

/// Read-only view of the room/location catalogue.
pub trait RoomDirectory: Send + Sync {
    /// Does this room belong to this location?
    fn room_in_location(&self, room: &RoomId, location: &LocationId) -> CoreResult<bool>;

    /// The room's checklist template. May be empty; creation rejects that.
    fn checklist_template(&self, room: &RoomId) -> CoreResult<Vec<TemplateEntry>>;
}

/// Read-only view of the user directory.
pub trait UserDirectory: Send + Sync {
    fn is_active(&self, user: &UserId) -> CoreResult<bool>;
}

struct RoomRecord {
    location: LocationId,
    template: Vec<TemplateEntry>,
}

/// In-memory room catalogue for wiring and tests.
pub struct InMemoryRoomDirectory {
    rooms: RwLock<HashMap<RoomId, RoomRecord>>,
}

impl InMemoryRoomDirectory {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    pub fn add_room(
        &self,
        room: RoomId,
        location: LocationId,
        template: Vec<TemplateEntry>,
    ) -> CoreResult<()> {
        let mut rooms = self
            .rooms
            .write()
            .map_err(|_| CoreError::internal("room directory lock poisoned"))?;
        rooms.insert(room, RoomRecord { location, template });
        Ok(())
    }
}

impl Default for InMemoryRoomDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomDirectory for InMemoryRoomDirectory {
    fn room_in_location(&self, room: &RoomId, location: &LocationId) -> CoreResult<bool> {
        let rooms = self
            .rooms
            .read()
            .map_err(|_| CoreError::internal("room directory lock poisoned"))?;
        Ok(rooms
            .get(room)
            .map(|record| &record.location == location)
            .unwrap_or(false))
    }

    fn checklist_template(&self, room: &RoomId) -> CoreResult<Vec<TemplateEntry>> {
        let rooms = self
            .rooms
            .read()
            .map_err(|_| CoreError::internal("room directory lock poisoned"))?;
        rooms
            .get(room)
            .map(|record| record.template.clone())
            .ok_or_else(|| CoreError::NotFound(format!("room {}", room)))
    }
}
