use rocket::serde::json::Json;
use rocket::{get, post, State};

use chrono::Local;

use crate::internal_error::{InternalError, InternalResult};

use super::data::*;
use super::helpers::*;
use crate::data::DBConnection;

#[get("/streak")]
pub fn get_streak(db_connection: &State<DBConnection>) -> InternalResult<Json<StreakCounter>> {
    let db_connection = db_connection.lock()?;

    Ok(Json(get_streak_from_db(&db_connection)?))
}

#[post("/streak", format = "json", data = "<request>")]
pub fn update_streak(
    request: Json<StreakActionRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<StreakCounter>> {
    let mut db_connection = db_connection.lock()?;

    let counter = match request.action.as_str() {
        "update" => evaluate_streak(&mut db_connection, &Local::now())?,
        "reset" => reset_streak_in_db(&db_connection)?,
        other => {
            return Err(InternalError::InvalidInput(format!(
                "invalid streak action: {}",
                other
            )))
        }
    };

    Ok(Json(counter))
}
