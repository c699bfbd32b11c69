use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use rusqlite::{params, Connection, TransactionBehavior};

use crate::internal_error::{InternalError, InternalResult};
use crate::tasks::data::{DailiesTally, Timestamp};
use crate::tasks::helpers::count_dailies;

use super::data::*;

fn midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Timestamp {
    let naive = date.and_time(NaiveTime::MIN);

    // Some zones skip midnight on DST changes; the day then starts an hour later.
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + TimeDelta::hours(1))).earliest())
        .map(|start| start.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

pub fn calendar_day<Tz: TimeZone>(now: &DateTime<Tz>) -> CalendarDay {
    let tz = now.timezone();
    let date = now.date_naive();
    let previous = date.pred_opt().unwrap_or(NaiveDate::MIN);

    CalendarDay {
        today: midnight(&tz, date),
        yesterday: midnight(&tz, previous),
    }
}

pub fn decide(counter: &StreakCounter, day: CalendarDay, tally: DailiesTally) -> StreakDecision {
    let last = counter.last_completed_date;

    if tally.total == 0 {
        StreakDecision::NoDailies
    } else if tally.incomplete == 0 {
        if last == day.yesterday {
            StreakDecision::Extend
        } else if last < day.today {
            StreakDecision::Restart
        } else {
            StreakDecision::AlreadyCredited
        }
    } else if last < day.today && last != day.yesterday {
        StreakDecision::Break
    } else {
        StreakDecision::Hold
    }
}

pub fn apply(counter: StreakCounter, decision: StreakDecision, day: CalendarDay) -> StreakCounter {
    match decision {
        StreakDecision::Extend => {
            let current_streak = counter.current_streak + 1;
            StreakCounter {
                current_streak,
                longest_streak: counter.longest_streak.max(current_streak),
                last_completed_date: day.today,
                ..counter
            }
        }
        StreakDecision::Restart => StreakCounter {
            current_streak: 1,
            longest_streak: counter.longest_streak.max(1),
            last_completed_date: day.today,
            ..counter
        },
        StreakDecision::Break => StreakCounter {
            current_streak: 0,
            ..counter
        },
        StreakDecision::NoDailies | StreakDecision::AlreadyCredited | StreakDecision::Hold => {
            counter
        }
    }
}

fn ensure_streak_row(db_connection: &Connection) -> InternalResult<()> {
    db_connection.execute(
        "INSERT OR IGNORE INTO streak_counter
            (id, current_streak, longest_streak, last_completed_date, created_at)
         VALUES (1, 0, 0, ?1, ?2)",
        params![NEVER_COMPLETED, Utc::now().timestamp_millis()],
    )?;
    Ok(())
}

fn write_streak(counter: &StreakCounter, db_connection: &Connection) -> InternalResult<()> {
    db_connection.execute(
        "UPDATE streak_counter
         SET current_streak = ?1, longest_streak = ?2, last_completed_date = ?3
         WHERE id = 1",
        params![
            counter.current_streak,
            counter.longest_streak,
            counter.last_completed_date
        ],
    )?;
    Ok(())
}

/// Reads the singleton counter, creating it on first access. A stored
/// `longest_streak` below `current_streak` is raised and written back.
pub fn get_streak_from_db(db_connection: &Connection) -> InternalResult<StreakCounter> {
    ensure_streak_row(db_connection)?;

    let mut counter = db_connection.query_row(
        "SELECT current_streak, longest_streak, last_completed_date, created_at
         FROM streak_counter WHERE id = 1",
        params![],
        |row| {
            Ok(StreakCounter {
                current_streak: row.get(0)?,
                longest_streak: row.get(1)?,
                last_completed_date: row.get(2)?,
                created_at: row.get(3)?,
            })
        },
    )?;

    if counter.longest_streak < counter.current_streak {
        log::warn!(
            "{}; correcting",
            InternalError::InvariantViolation(format!(
                "longest streak {} below current streak {}",
                counter.longest_streak, counter.current_streak
            ))
        );
        counter.longest_streak = counter.current_streak;
        write_streak(&counter, db_connection)?;
    }

    Ok(counter)
}

/// Evaluates the streak against the counts `tally` reads inside the same
/// transaction as the counter itself.
pub fn evaluate_streak_with<Tz, F>(
    db_connection: &mut Connection,
    now: &DateTime<Tz>,
    tally: F,
) -> InternalResult<StreakCounter>
where
    Tz: TimeZone,
    F: FnOnce(&Connection) -> InternalResult<DailiesTally>,
{
    let transaction = db_connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let counter = get_streak_from_db(&transaction)?;
    let tally = tally(&*transaction)?;
    let day = calendar_day(now);
    let decision = decide(&counter, day, tally);
    let updated = apply(counter, decision, day);

    if decision.changes_counter() {
        write_streak(&updated, &transaction)?;
        log::info!(
            "streak {:?}: {} -> {} (longest {})",
            decision,
            counter.current_streak,
            updated.current_streak,
            updated.longest_streak
        );
    } else {
        log::debug!("streak unchanged ({:?})", decision);
    }

    transaction.commit()?;

    Ok(updated)
}

/// Credits, breaks or keeps the streak according to the dailies' current
/// completion, as one atomic read-modify-write.
pub fn evaluate_streak<Tz: TimeZone>(
    db_connection: &mut Connection,
    now: &DateTime<Tz>,
) -> InternalResult<StreakCounter> {
    evaluate_streak_with(db_connection, now, count_dailies)
}

/// Clears the current streak; `longest_streak` is kept.
pub fn reset_streak_in_db(db_connection: &Connection) -> InternalResult<StreakCounter> {
    ensure_streak_row(db_connection)?;
    db_connection.execute(
        "UPDATE streak_counter SET current_streak = 0, last_completed_date = ?1 WHERE id = 1",
        params![NEVER_COMPLETED],
    )?;
    log::info!("streak reset");

    get_streak_from_db(db_connection)
}
