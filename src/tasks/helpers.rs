use rusqlite::types::ToSql;
use rusqlite::{ffi, params, Connection, ErrorCode, Row, TransactionBehavior};

use crate::internal_error::{InternalError, InternalResult};

use super::data::*;

const TASK_COLUMNS: &str =
    "id, title, description, priority, category, completed, createdAt, lastReset";

pub fn get_task_from_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get::<usize, Option<String>>(2)?.unwrap_or_default(),
        priority: row.get(3)?,
        category: row.get(4)?,
        completed: row.get::<usize, i64>(5)? != 0,
        created_at: row.get(6)?,
        last_reset: row.get(7)?,
    })
}

pub fn get_all_tasks_from_db(db_connection: &Connection) -> InternalResult<Vec<Task>> {
    let mut statement = db_connection.prepare(&format!(
        "SELECT {} FROM tasks ORDER BY createdAt ASC, rowid ASC",
        TASK_COLUMNS
    ))?;

    let tasks = statement
        .query_map(params![], |row| get_task_from_row(row))?
        .collect::<Result<Vec<Task>, _>>()?;

    Ok(tasks)
}

pub fn get_task_from_db(task_id: &str, db_connection: &Connection) -> InternalResult<Task> {
    let mut statement =
        db_connection.prepare(&format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS))?;
    let mut rows = statement.query(params![task_id])?;

    match rows.next()? {
        Some(row) => Ok(get_task_from_row(row)?),
        None => Err(InternalError::NotFound {
            id: task_id.to_string(),
        }),
    }
}

pub fn get_tasks_in_category(
    category: Category,
    db_connection: &Connection,
) -> InternalResult<Vec<Task>> {
    let mut statement = db_connection.prepare(&format!(
        "SELECT {} FROM tasks WHERE category = ?1 ORDER BY createdAt ASC, rowid ASC",
        TASK_COLUMNS
    ))?;

    let tasks = statement
        .query_map(params![category], |row| get_task_from_row(row))?
        .collect::<Result<Vec<Task>, _>>()?;

    Ok(tasks)
}

fn validate_title(title: &str) -> InternalResult<()> {
    if title.trim().is_empty() {
        return Err(InternalError::from("task title must not be empty"));
    }
    Ok(())
}

fn is_primary_key_violation(e: &rusqlite::Error) -> bool {
    match e {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && (failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE)
        }
        _ => false,
    }
}

fn insert_row(task: &Task, db_connection: &Connection) -> InternalResult<()> {
    validate_title(&task.title)?;

    db_connection
        .execute(
            "INSERT INTO tasks (id, title, description, priority, category, completed, createdAt, lastReset)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                task.id,
                task.title,
                task.description,
                task.priority,
                task.category,
                task.completed as i64,
                task.created_at,
                task.last_reset
            ],
        )
        .map_err(|e| {
            if is_primary_key_violation(&e) {
                InternalError::DuplicateKey {
                    id: task.id.clone(),
                }
            } else {
                InternalError::from(e)
            }
        })?;

    Ok(())
}

pub fn insert_task_into_db(task: &Task, db_connection: &Connection) -> InternalResult<()> {
    insert_row(task, db_connection)?;
    log::debug!("inserted task {} into {}", task.id, task.category);
    Ok(())
}

/// Inserts every task or none of them.
pub fn bulk_insert_tasks_into_db(
    tasks: &[Task],
    db_connection: &mut Connection,
) -> InternalResult<usize> {
    let transaction = db_connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    for task in tasks {
        insert_row(task, &transaction)?;
    }

    transaction.commit()?;
    log::info!("bulk inserted {} tasks", tasks.len());

    Ok(tasks.len())
}

/// Builds the `SET` list and bound values for the slots present in `patch`.
fn patch_assignments(patch: &TaskPatch) -> InternalResult<(Vec<&'static str>, Vec<&dyn ToSql>)> {
    let mut sets: Vec<&'static str> = Vec::new();
    let mut values: Vec<&dyn ToSql> = Vec::new();

    if let Some(title) = &patch.title {
        validate_title(title)?;
        sets.push("title");
        values.push(title);
    }
    if let Some(description) = &patch.description {
        sets.push("description");
        values.push(description);
    }
    if let Some(priority) = &patch.priority {
        sets.push("priority");
        values.push(priority);
    }
    if let Some(category) = &patch.category {
        sets.push("category");
        values.push(category);
    }
    if let Some(completed) = &patch.completed {
        sets.push("completed");
        values.push(completed);
    }
    if let Some(last_reset) = &patch.last_reset {
        sets.push("lastReset");
        values.push(last_reset);
    }

    Ok((sets, values))
}

fn set_clause(columns: &[&str], first_placeholder: usize) -> String {
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{} = ?{}", column, first_placeholder + i))
        .collect::<Vec<String>>()
        .join(", ")
}

/// Applies the present fields of `patch` to one task. An empty patch is a no-op
/// even for unknown ids; a non-empty patch against an unknown id is `NotFound`.
pub fn update_task_in_db(
    task_id: &str,
    patch: &TaskPatch,
    db_connection: &Connection,
) -> InternalResult<()> {
    if patch.is_empty() {
        return Ok(());
    }

    let (columns, mut values) = patch_assignments(patch)?;
    let sql = format!(
        "UPDATE tasks SET {} WHERE id = ?{}",
        set_clause(&columns, 1),
        columns.len() + 1
    );
    values.push(&task_id);

    let changed = db_connection.execute(&sql, values.as_slice())?;
    if changed == 0 {
        return Err(InternalError::NotFound {
            id: task_id.to_string(),
        });
    }

    Ok(())
}

/// Removing an absent task is not an error.
pub fn delete_task_from_db(task_id: &str, db_connection: &Connection) -> InternalResult<()> {
    let removed = db_connection.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
    if removed == 0 {
        log::debug!("delete of unknown task {} ignored", task_id);
    }
    Ok(())
}

/// Bulk field update over every task in `category`, as one statement.
pub fn update_tasks_in_category(
    category: Category,
    patch: &TaskPatch,
    db_connection: &Connection,
) -> InternalResult<usize> {
    if patch.is_empty() {
        return Ok(0);
    }

    let (columns, mut values) = patch_assignments(patch)?;
    let sql = format!(
        "UPDATE tasks SET {} WHERE category = ?{}",
        set_clause(&columns, 1),
        columns.len() + 1
    );
    values.push(&category);

    Ok(db_connection.execute(&sql, values.as_slice())?)
}

/// Moves every task in `from` to `to` in one statement, optionally stamping
/// `lastReset`.
pub fn move_tasks_between_categories(
    from: Category,
    to: Category,
    last_reset: Option<Timestamp>,
    db_connection: &Connection,
) -> InternalResult<usize> {
    let patch = TaskPatch {
        category: Some(to),
        last_reset,
        ..TaskPatch::default()
    };
    update_tasks_in_category(from, &patch, db_connection)
}

pub fn count_dailies(db_connection: &Connection) -> InternalResult<DailiesTally> {
    let (total, incomplete): (i64, i64) = db_connection.query_row(
        "SELECT COUNT(*), COALESCE(SUM(CASE WHEN completed = 0 THEN 1 ELSE 0 END), 0)
         FROM tasks WHERE category = ?1",
        params![Category::Dailies],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(DailiesTally {
        total: total as u32,
        incomplete: incomplete as u32,
    })
}

pub fn get_incomplete_titles_in_category(
    category: Category,
    db_connection: &Connection,
) -> InternalResult<Vec<String>> {
    Ok(get_tasks_in_category(category, db_connection)?
        .into_iter()
        .filter(|task| !task.completed)
        .map(|task| task.title)
        .collect())
}

#[cfg(test)]
pub fn task(id: &str, category: Category, created_at: Timestamp) -> Task {
    Task {
        id: id.to_string(),
        title: format!("task {}", id),
        description: String::new(),
        priority: Priority::Medium,
        category,
        completed: false,
        created_at,
        last_reset: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::open_test_connection;

    #[test]
    fn lists_tasks_by_creation_time() {
        let connection = open_test_connection();
        insert_task_into_db(&task("b", Category::Week, 20), &connection).unwrap();
        insert_task_into_db(&task("a", Category::Today, 10), &connection).unwrap();
        insert_task_into_db(&task("c", Category::Dailies, 20), &connection).unwrap();

        let ids: Vec<String> = get_all_tasks_from_db(&connection)
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();

        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn round_trips_completed_as_boolean() {
        let connection = open_test_connection();
        let mut done = task("d", Category::Dailies, 1);
        done.completed = true;
        done.description = "water the plants".into();
        insert_task_into_db(&done, &connection).unwrap();

        let stored: i64 = connection
            .query_row("SELECT completed FROM tasks WHERE id = 'd'", params![], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(stored, 1);
        assert_eq!(get_task_from_db("d", &connection).unwrap(), done);
    }

    #[test]
    fn duplicate_insert_is_reported() {
        let connection = open_test_connection();
        insert_task_into_db(&task("a", Category::Today, 1), &connection).unwrap();

        let err = insert_task_into_db(&task("a", Category::Week, 2), &connection).unwrap_err();

        assert!(matches!(err, InternalError::DuplicateKey { ref id } if id == "a"));
    }

    #[test]
    fn empty_title_is_rejected() {
        let connection = open_test_connection();
        let mut blank = task("a", Category::Today, 1);
        blank.title = "   ".into();

        assert!(matches!(
            insert_task_into_db(&blank, &connection),
            Err(InternalError::InvalidInput(_))
        ));
        assert!(get_all_tasks_from_db(&connection).unwrap().is_empty());
    }

    #[test]
    fn bulk_insert_is_all_or_nothing() {
        let mut connection = open_test_connection();
        insert_task_into_db(&task("existing", Category::Week, 1), &connection).unwrap();

        let batch = vec![
            task("new-1", Category::Today, 2),
            task("existing", Category::Today, 3),
            task("new-2", Category::Today, 4),
        ];
        let err = bulk_insert_tasks_into_db(&batch, &mut connection).unwrap_err();

        assert!(matches!(err, InternalError::DuplicateKey { .. }));
        let ids: Vec<String> = get_all_tasks_from_db(&connection)
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["existing"]);
    }

    #[test]
    fn bulk_insert_persists_whole_batch() {
        let mut connection = open_test_connection();
        let batch = vec![task("a", Category::Today, 1), task("b", Category::Tomorrow, 2)];

        assert_eq!(bulk_insert_tasks_into_db(&batch, &mut connection).unwrap(), 2);
        assert_eq!(get_all_tasks_from_db(&connection).unwrap().len(), 2);
    }

    #[test]
    fn update_applies_only_present_fields() {
        let connection = open_test_connection();
        insert_task_into_db(&task("a", Category::Today, 1), &connection).unwrap();

        let patch = TaskPatch {
            priority: Some(Priority::High),
            completed: Some(true),
            ..TaskPatch::default()
        };
        update_task_in_db("a", &patch, &connection).unwrap();

        let updated = get_task_from_db("a", &connection).unwrap();
        assert_eq!(updated.priority, Priority::High);
        assert!(updated.completed);
        assert_eq!(updated.title, "task a");
        assert_eq!(updated.category, Category::Today);
    }

    #[test]
    fn update_of_missing_task() {
        let connection = open_test_connection();

        assert!(update_task_in_db("ghost", &TaskPatch::default(), &connection).is_ok());
        assert!(matches!(
            update_task_in_db("ghost", &TaskPatch::completed(true), &connection),
            Err(InternalError::NotFound { .. })
        ));
    }

    #[test]
    fn update_rejects_empty_title() {
        let connection = open_test_connection();
        insert_task_into_db(&task("a", Category::Today, 1), &connection).unwrap();

        let patch = TaskPatch {
            title: Some(String::new()),
            ..TaskPatch::default()
        };

        assert!(update_task_in_db("a", &patch, &connection).is_err());
        assert_eq!(get_task_from_db("a", &connection).unwrap().title, "task a");
    }

    #[test]
    fn delete_is_idempotent() {
        let connection = open_test_connection();
        insert_task_into_db(&task("a", Category::Today, 1), &connection).unwrap();

        delete_task_from_db("a", &connection).unwrap();
        delete_task_from_db("a", &connection).unwrap();

        assert!(get_all_tasks_from_db(&connection).unwrap().is_empty());
    }

    #[test]
    fn category_update_touches_only_that_category() {
        let connection = open_test_connection();
        for (id, category) in [("d1", Category::Dailies), ("d2", Category::Dailies), ("t", Category::Today)] {
            let mut t = task(id, category, 1);
            t.completed = true;
            insert_task_into_db(&t, &connection).unwrap();
        }

        let changed =
            update_tasks_in_category(Category::Dailies, &TaskPatch::completed(false), &connection)
                .unwrap();

        assert_eq!(changed, 2);
        assert!(!get_task_from_db("d1", &connection).unwrap().completed);
        assert!(!get_task_from_db("d2", &connection).unwrap().completed);
        assert!(get_task_from_db("t", &connection).unwrap().completed);
    }

    #[test]
    fn move_stamps_last_reset() {
        let connection = open_test_connection();
        insert_task_into_db(&task("a", Category::Tomorrow, 1), &connection).unwrap();
        insert_task_into_db(&task("b", Category::Week, 1), &connection).unwrap();

        let moved =
            move_tasks_between_categories(Category::Tomorrow, Category::Today, Some(77), &connection)
                .unwrap();

        assert_eq!(moved, 1);
        let a = get_task_from_db("a", &connection).unwrap();
        assert_eq!(a.category, Category::Today);
        assert_eq!(a.last_reset, Some(77));
        assert_eq!(get_task_from_db("b", &connection).unwrap().last_reset, None);
    }

    #[test]
    fn counts_dailies() {
        let connection = open_test_connection();
        assert_eq!(count_dailies(&connection).unwrap(), DailiesTally::default());

        let mut done = task("d1", Category::Dailies, 1);
        done.completed = true;
        insert_task_into_db(&done, &connection).unwrap();
        insert_task_into_db(&task("d2", Category::Dailies, 2), &connection).unwrap();
        insert_task_into_db(&task("w", Category::Week, 3), &connection).unwrap();

        assert_eq!(
            count_dailies(&connection).unwrap(),
            DailiesTally {
                total: 2,
                incomplete: 1
            }
        );
    }

    #[test]
    fn collects_incomplete_week_titles() {
        let connection = open_test_connection();
        insert_task_into_db(&task("w1", Category::Week, 1), &connection).unwrap();
        let mut done = task("w2", Category::Week, 2);
        done.completed = true;
        insert_task_into_db(&done, &connection).unwrap();
        insert_task_into_db(&task("t", Category::Today, 3), &connection).unwrap();

        assert_eq!(
            get_incomplete_titles_in_category(Category::Week, &connection).unwrap(),
            vec!["task w1"]
        );
    }
}
