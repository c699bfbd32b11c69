use rocket::serde::json::Json;
use rocket::{delete, get, patch, post, State};

use chrono::Utc;

use crate::internal_error::InternalResult;
use crate::rollover::helpers::{perform_daily_reset, reset_dailies};

use super::data::*;
use super::helpers::*;
use crate::data::DBConnection;

#[get("/tasks")]
pub fn get_tasks(db_connection: &State<DBConnection>) -> InternalResult<Json<Vec<Task>>> {
    let db_connection = db_connection.lock()?;

    let tasks = get_all_tasks_from_db(&db_connection)?;

    Ok(Json(tasks))
}

#[get("/tasks/<task_id>")]
pub fn get_task(task_id: &str, db_connection: &State<DBConnection>) -> InternalResult<Json<Task>> {
    let db_connection = db_connection.lock()?;

    Ok(Json(get_task_from_db(task_id, &db_connection)?))
}

#[post("/tasks", format = "json", data = "<request>")]
pub fn create_tasks(
    request: Json<CreateTasksRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<OkResponse>> {
    let mut db_connection = db_connection.lock()?;
    let now = Utc::now().timestamp_millis();

    match request.into_inner() {
        CreateTasksRequest::Bulk(new_tasks) => {
            let tasks: Vec<Task> = new_tasks.into_iter().map(|t| t.into_task(now)).collect();
            bulk_insert_tasks_into_db(&tasks, &mut db_connection)?;
        }
        CreateTasksRequest::Action(BulkActionRequest { action }) => match action {
            BulkAction::ResetDailies => {
                reset_dailies(&db_connection)?;
            }
            BulkAction::DailyReset => {
                perform_daily_reset(&mut db_connection, now)?;
            }
        },
        CreateTasksRequest::Single(new_task) => {
            insert_task_into_db(&new_task.into_task(now), &db_connection)?;
        }
    }

    Ok(Json(OkResponse::ok()))
}

#[patch("/tasks/<task_id>", format = "json", data = "<patch>")]
pub fn update_task(
    task_id: &str,
    patch: Json<TaskPatch>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<OkResponse>> {
    let db_connection = db_connection.lock()?;

    update_task_in_db(task_id, &patch, &db_connection)?;

    Ok(Json(OkResponse::ok()))
}

#[delete("/tasks/<task_id>")]
pub fn delete_task(
    task_id: &str,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<OkResponse>> {
    let db_connection = db_connection.lock()?;

    delete_task_from_db(task_id, &db_connection)?;

    Ok(Json(OkResponse::ok()))
}
