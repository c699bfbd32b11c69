use chrono::Utc;
use clap::{Parser, Subcommand};
use rocket::figment::Figment;
use rocket::fs::FileServer;
use rocket::{Build, Rocket};
use rusqlite::Connection;

use std::error::Error;
use std::sync::{Arc, Mutex};

mod breakdown;
mod config;
mod data;
mod internal_error;
mod rollover;
mod streak;
mod tasks;

use breakdown::client::OllamaClient;
use breakdown::BreakdownError;
use config::AppConfig;
use data::DBConnection;
use internal_error::{any_status, not_found, unprocessable_body};

#[macro_use]
extern crate rocket;

#[derive(Parser, Debug)]
#[command(name = "taskboard", about = "Personal task board with daily rollover and streaks")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Serve the JSON API (default)
    Serve,
    /// Run the daily rollover once and exit; meant for cron
    Rollover,
    /// Clear completion on all dailies and exit
    ResetDailies,
}

fn build_rocket(
    figment: Figment,
    config: AppConfig,
    connection: Connection,
) -> Result<Rocket<Build>, BreakdownError> {
    let client = OllamaClient::new(&config)?;
    let static_dir = config.static_dir.clone();
    let connection: DBConnection = Arc::new(Mutex::new(connection));

    let rocket = rocket::custom(figment)
        .manage(connection)
        .manage(client)
        .manage(config)
        .mount(
            "/api",
            routes![
                tasks::endpoints::get_tasks,
                tasks::endpoints::get_task,
                tasks::endpoints::create_tasks,
                tasks::endpoints::update_task,
                tasks::endpoints::delete_task,
                streak::endpoints::get_streak,
                streak::endpoints::update_streak,
                rollover::endpoints::daily_reset,
                rollover::endpoints::daily_reset_info,
                breakdown::endpoints::break_down_week,
            ],
        )
        .register("/api", catchers![not_found, unprocessable_body, any_status]);

    Ok(match static_dir.filter(|dir| dir.is_dir()) {
        Some(dir) => rocket.mount("/", FileServer::from(dir).rank(15)),
        None => rocket,
    })
}

fn init_cli_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

#[rocket::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve);
    if command != Command::Serve {
        init_cli_logging();
    }
    config::load_dotenv();

    let figment = config::figment();
    let config = AppConfig::from_figment(&figment)?;

    match command {
        Command::Serve => {
            let connection = data::open_database(&config)?;
            build_rocket(figment, config, connection)?.launch().await?;
        }
        Command::Rollover => {
            let mut connection = data::open_database(&config)?;
            rollover::helpers::perform_daily_reset(&mut connection, Utc::now().timestamp_millis())?;
        }
        Command::ResetDailies => {
            let connection = data::open_database(&config)?;
            rollover::helpers::reset_dailies(&connection)?;
        }
    }

    Ok(())
}
