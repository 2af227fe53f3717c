//! Read models for the reporting surface.

use serde::{Deserialize, Serialize};
use steward_timelog::TimeLog;
use steward_types::UserId;
use steward_workorder::WorkOrder;

/// History of one room: its work order (if any) and the cleaning sessions
/// recorded against it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoomHistory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_order: Option<WorkOrder>,
    pub sessions: Vec<TimeLog>,
}

/// History of one cleaner: every order they were assigned and the sessions
/// logged against those orders' rooms.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CleanerHistory {
    pub cleaner: UserId,
    pub work_orders: Vec<WorkOrder>,
    pub sessions: Vec<TimeLog>,
}

/// One row of a staff listing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StaffMember {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub role_name: String,
}
