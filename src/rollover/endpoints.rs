use rocket::serde::json::Json;
use rocket::{get, post, State};

use chrono::{SecondsFormat, Utc};

use crate::config::AppConfig;
use crate::internal_error::InternalResult;

use super::data::*;
use super::helpers::*;
use crate::data::DBConnection;

#[post("/reset")]
pub fn daily_reset(db_connection: &State<DBConnection>) -> InternalResult<Json<DailyResetResponse>> {
    let mut db_connection = db_connection.lock()?;
    let now = Utc::now();

    let report = perform_daily_reset(&mut db_connection, now.timestamp_millis())?;

    Ok(Json(DailyResetResponse {
        success: true,
        message: "Daily reset completed successfully".to_string(),
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        report,
    }))
}

#[get("/reset")]
pub fn daily_reset_info(config: &State<AppConfig>) -> Json<DailyResetInfo> {
    Json(DailyResetInfo {
        message: "Daily reset endpoint. Use POST to trigger reset.".to_string(),
        schedule: config.reset_schedule.clone(),
    })
}
