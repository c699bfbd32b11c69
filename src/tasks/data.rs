use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

pub type TaskID = String;
/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Today,
    Tomorrow,
    Week,
    Dailies,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Today,
        Category::Tomorrow,
        Category::Week,
        Category::Dailies,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Today => "today",
            Category::Tomorrow => "tomorrow",
            Category::Week => "week",
            Category::Dailies => "dailies",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown value: {}", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Priority, UnknownVariant> {
        Priority::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Category, UnknownVariant> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for Priority {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Priority {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Priority> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Category> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskID,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: Category,
    pub completed: bool,
    pub created_at: Timestamp,
    pub last_reset: Option<Timestamp>,
}

/// A task as submitted by a client. Missing ids and creation times are filled
/// in on insert.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub id: Option<TaskID>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub priority: Priority,
    pub category: Category,
    #[serde(default)]
    pub completed: bool,
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub last_reset: Option<Timestamp>,
}

impl NewTask {
    pub fn into_task(self, now: Timestamp) -> Task {
        Task {
            id: self
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            title: self.title,
            description: self.description.unwrap_or_default(),
            priority: self.priority,
            category: self.category,
            completed: self.completed,
            created_at: self.created_at.unwrap_or(now),
            last_reset: self.last_reset,
        }
    }
}

/// One optional slot per mutable task field; absent slots are left untouched.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub completed: Option<bool>,
    #[serde(skip)]
    pub last_reset: Option<Timestamp>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.category.is_none()
            && self.completed.is_none()
            && self.last_reset.is_none()
    }

    pub fn completed(completed: bool) -> TaskPatch {
        TaskPatch {
            completed: Some(completed),
            ..TaskPatch::default()
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BulkAction {
    ResetDailies,
    DailyReset,
}

#[derive(Deserialize, Debug)]
pub struct BulkActionRequest {
    pub action: BulkAction,
}

/// Body of `POST /api/tasks`: an array for bulk import, an action, or a single
/// task.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum CreateTasksRequest {
    Bulk(Vec<NewTask>),
    Action(BulkActionRequest),
    Single(NewTask),
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> OkResponse {
        OkResponse { ok: true }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DailiesTally {
    pub total: u32,
    pub incomplete: u32,
}
