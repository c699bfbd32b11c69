use rocket::serde::json::Json;
use rocket::{post, State};

use crate::internal_error::{InternalError, InternalResult};
use crate::tasks::data::Category;
use crate::tasks::helpers::get_incomplete_titles_in_category;

use super::client::OllamaClient;
use super::data::*;
use crate::data::DBConnection;

fn get_weekly_titles(db_connection: &DBConnection) -> InternalResult<Vec<String>> {
    let db_connection = db_connection.lock()?;
    get_incomplete_titles_in_category(Category::Week, &db_connection)
}

#[post("/ai/breakdown")]
pub async fn break_down_week(
    db_connection: &State<DBConnection>,
    client: &State<OllamaClient>,
) -> InternalResult<Json<BreakdownResponse>> {
    let weekly_tasks = get_weekly_titles(db_connection)?;

    if weekly_tasks.is_empty() {
        return Err(InternalError::from("No weekly tasks found to break down"));
    }

    let tasks = client.break_down(&weekly_tasks).await?;

    Ok(Json(BreakdownResponse {
        success: true,
        tasks,
        original_weekly_tasks: weekly_tasks,
    }))
}
