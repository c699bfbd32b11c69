use serde::Serialize;

use crate::tasks::data::Timestamp;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RolloverReport {
    /// Tasks moved from tomorrow to today.
    pub promoted: usize,
    /// Tasks moved from today to week, promoted ones included.
    pub swept: usize,
    pub dailies_reset: usize,
    pub ran_at: Timestamp,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DailyResetResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
    #[serde(flatten)]
    pub report: RolloverReport,
}

#[derive(Serialize, Debug)]
pub struct DailyResetInfo {
    pub message: String,
    pub schedule: String,
}
