use rusqlite::{params, Connection};

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::config::AppConfig;
use crate::internal_error::InternalResult;

pub type DBConnection = Arc<Mutex<Connection>>;

pub fn open_database(config: &AppConfig) -> InternalResult<Connection> {
    let connection = if config.is_in_memory() {
        Connection::open_in_memory()?
    } else {
        let db_path = Path::new(&config.db_path);
        if let Some(dir) = db_path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let connection = Connection::open(db_path)?;
        let mode: String =
            connection.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        log::debug!("opened {} in {} mode", config.db_path, mode);
        connection
    };

    create_tables(&connection)?;

    Ok(connection)
}

pub fn create_tables(connection: &Connection) -> InternalResult<()> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT DEFAULT '',
            priority TEXT NOT NULL CHECK (priority IN ('low', 'medium', 'high')),
            category TEXT NOT NULL CHECK (category IN ('today', 'tomorrow', 'week', 'dailies')),
            completed INTEGER NOT NULL DEFAULT 0 CHECK (completed IN (0, 1)),
            createdAt INTEGER NOT NULL,
            lastReset INTEGER DEFAULT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_category ON tasks(category);

        CREATE TABLE IF NOT EXISTS streak_counter (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            current_streak INTEGER NOT NULL DEFAULT 0,
            longest_streak INTEGER NOT NULL DEFAULT 0,
            last_completed_date INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );",
    )?;

    if !has_column(connection, "tasks", "lastReset")? {
        log::info!("adding lastReset column to tasks");
        connection.execute(
            "ALTER TABLE tasks ADD COLUMN lastReset INTEGER DEFAULT NULL",
            params![],
        )?;
    }

    connection.execute(
        "INSERT OR IGNORE INTO streak_counter
            (id, current_streak, longest_streak, last_completed_date, created_at)
         VALUES (1, 0, 0, 0, ?1)",
        params![chrono::Utc::now().timestamp_millis()],
    )?;

    Ok(())
}

fn has_column(connection: &Connection, table: &str, column: &str) -> InternalResult<bool> {
    let mut statement = connection.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = statement
        .query_map(params![], |row| row.get::<usize, String>(1))?
        .collect::<Result<Vec<String>, _>>()?;

    Ok(names.iter().any(|name| name == column))
}

#[cfg(test)]
pub fn open_test_connection() -> Connection {
    let connection = Connection::open_in_memory().unwrap();
    create_tables(&connection).unwrap();
    connection
}
