use serde::{Deserialize, Serialize};

use crate::tasks::data::Timestamp;

/// `last_completed_date` value meaning the streak was never credited.
pub const NEVER_COMPLETED: Timestamp = 0;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakCounter {
    pub current_streak: u32,
    pub longest_streak: u32,
    /// Local midnight of the last credited day, or `NEVER_COMPLETED`.
    pub last_completed_date: Timestamp,
    pub created_at: Timestamp,
}

/// Midnight of the current and previous calendar day, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDay {
    pub today: Timestamp,
    pub yesterday: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakDecision {
    /// There are no dailies; nothing can be earned or lost.
    NoDailies,
    /// All dailies done and yesterday was credited.
    Extend,
    /// All dailies done after a gap (or for the first time).
    Restart,
    AlreadyCredited,
    /// Dailies outstanding and at least one whole day was missed.
    Break,
    /// Dailies outstanding, but still inside yesterday's grace window.
    Hold,
}

impl StreakDecision {
    pub fn changes_counter(self) -> bool {
        matches!(
            self,
            StreakDecision::Extend | StreakDecision::Restart | StreakDecision::Break
        )
    }
}

#[derive(Deserialize, Debug)]
pub struct StreakActionRequest {
    pub action: String,
}
