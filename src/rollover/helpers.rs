use rusqlite::{Connection, TransactionBehavior};

use crate::internal_error::InternalResult;
use crate::tasks::data::{Category, TaskPatch, Timestamp};
use crate::tasks::helpers::{move_tasks_between_categories, update_tasks_in_category};

use super::data::RolloverReport;

/// Clears completion on every daily.
pub fn reset_dailies(db_connection: &Connection) -> InternalResult<usize> {
    let reset = update_tasks_in_category(
        Category::Dailies,
        &TaskPatch::completed(false),
        db_connection,
    )?;
    log::info!("reset {} dailies", reset);
    Ok(reset)
}

/// Advances the board by one day: tomorrow becomes today, everything in today
/// (including what was just promoted) moves to week, and dailies are cleared.
///
/// Each step sees the previous step's result, and all three commit together.
/// No task is filtered by age, so a second run on the same day still sweeps
/// anything placed in today since the first run.
///
/// Clearing the dailies discards the completion state that streak evaluation
/// reads, so this must not run before the day's evaluation has had its chance.
/// The rollover never evaluates the streak itself: dailies
/// completed yesterday would otherwise be credited to the new day.
pub fn perform_daily_reset(
    db_connection: &mut Connection,
    now: Timestamp,
) -> InternalResult<RolloverReport> {
    let transaction = db_connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let promoted =
        move_tasks_between_categories(Category::Tomorrow, Category::Today, Some(now), &transaction)?;
    let swept = move_tasks_between_categories(Category::Today, Category::Week, None, &transaction)?;
    let dailies_reset = update_tasks_in_category(
        Category::Dailies,
        &TaskPatch::completed(false),
        &transaction,
    )?;

    transaction.commit()?;

    log::info!(
        "daily reset: {} promoted from tomorrow, {} swept to week, {} dailies cleared",
        promoted,
        swept,
        dailies_reset
    );

    Ok(RolloverReport {
        promoted,
        swept,
        dailies_reset,
        ran_at: now,
    })
}
