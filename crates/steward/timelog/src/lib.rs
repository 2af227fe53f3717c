//! Steward Time Logs - cleaning session audit trail
//!
//! Cleaners record the interval they spent in a room. The recorder is
//! append-only and deliberately decoupled from work-order state: a log
//! entry never completes an item or closes an order, and nothing reads it
//! back except reporting.

#![deny(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use steward_types::{CoreError, CoreResult, RoomId, WorkOrderId};
use tracing::info;

/// One cleaning session interval.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLog {
    pub work_order: WorkOrderId,
    pub room: RoomId,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub stop_time: chrono::DateTime<chrono::Utc>,
}

/// Append-only recorder of cleaning sessions.
pub struct TimeLogRecorder {
    entries: RwLock<Vec<TimeLog>>,
}

impl TimeLogRecorder {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Append an interval. Fire-and-forget from the caller's point of
    /// view; the only failure is a malformed interval.
    pub fn record(&self, entry: TimeLog) -> CoreResult<()> {
        if entry.stop_time < entry.start_time {
            return Err(CoreError::Validation(
                "stop_time precedes start_time".into(),
            ));
        }
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CoreError::internal("time log lock poisoned"))?;
        info!(order = %entry.work_order, room = %entry.room, "cleaning session recorded");
        entries.push(entry);
        Ok(())
    }

    /// Intervals recorded against a room, in append order.
    pub fn for_room(&self, room: &RoomId) -> CoreResult<Vec<TimeLog>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| CoreError::internal("time log lock poisoned"))?;
        Ok(entries
            .iter()
            .filter(|e| &e.room == room)
            .cloned()
            .collect())
    }

    /// Intervals recorded against a work order, in append order.
    pub fn for_work_order(&self, order: &WorkOrderId) -> CoreResult<Vec<TimeLog>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| CoreError::internal("time log lock poisoned"))?;
        Ok(entries
            .iter()
            .filter(|e| &e.work_order == order)
            .cloned()
            .collect())
    }
}

impl Default for TimeLogRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn entry(order: &str, room: &str, minutes: i64) -> TimeLog {
        let start = Utc::now();
        TimeLog {
            work_order: WorkOrderId::new(order),
            room: RoomId::new(room),
            start_time: start,
            stop_time: start + Duration::minutes(minutes),
        }
    }

    #[test]
    fn records_append_in_order() {
        let recorder = TimeLogRecorder::new();
        recorder.record(entry("wo-1", "r1", 30)).unwrap();
        recorder.record(entry("wo-1", "r1", 45)).unwrap();
        recorder.record(entry("wo-2", "r2", 10)).unwrap();

        let r1 = recorder.for_room(&RoomId::new("r1")).unwrap();
        assert_eq!(r1.len(), 2);
        assert!(r1[0].stop_time < r1[1].stop_time);

        let wo2 = recorder.for_work_order(&WorkOrderId::new("wo-2")).unwrap();
        assert_eq!(wo2.len(), 1);
    }

    #[test]
    fn rejects_inverted_intervals() {
        let recorder = TimeLogRecorder::new();
        let mut bad = entry("wo-1", "r1", 0);
        bad.stop_time = bad.start_time - Duration::minutes(5);
        let err = recorder.record(bad).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(recorder.for_room(&RoomId::new("r1")).unwrap().is_empty());
    }

    #[test]
    fn empty_queries_return_empty_lists() {
        let recorder = TimeLogRecorder::new();
        assert!(recorder.for_room(&RoomId::new("none")).unwrap().is_empty());
    }
}
