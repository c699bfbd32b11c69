use rocket::figment::providers::{Env, Serialized};
use rocket::figment::Figment;
use serde::{Deserialize, Serialize};

use std::path::PathBuf;

pub const IN_MEMORY_DB: &str = ":memory:";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: String,
    pub ollama_base_url: String,
    pub preferred_models: Vec<String>,
    pub reset_schedule: String,
    pub static_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> AppConfig {
        AppConfig {
            db_path: "data/tasks.db".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            preferred_models: vec!["qwen3".to_string(), "gemma3".to_string()],
            reset_schedule: "Runs daily at 6:00 AM".to_string(),
            static_dir: None,
        }
    }
}

fn dotenv_problem<T>(result: dotenvy::Result<T>) -> Option<dotenvy::Error> {
    result.err().filter(|e| !e.not_found())
}

/// Loads `.env` if present. A missing file is normal; anything else is logged.
pub fn load_dotenv() {
    if let Some(e) = dotenv_problem(dotenvy::dotenv()) {
        log::debug!("ignoring .env: {}", e);
    }
}

/// Rocket's own figment (`Rocket.toml`, `ROCKET_*`) layered over our defaults,
/// with the bare `DB_PATH` / `OLLAMA_BASE_URL` variables taking precedence.
pub fn figment() -> Figment {
    rocket::Config::figment()
        .join(Serialized::defaults(AppConfig::default()))
        .merge(Env::raw().only(&["DB_PATH", "OLLAMA_BASE_URL"]))
}

impl AppConfig {
    pub fn from_figment(figment: &Figment) -> Result<AppConfig, rocket::figment::Error> {
        figment.extract()
    }

    pub fn is_in_memory(&self) -> bool {
        self.db_path == IN_MEMORY_DB
    }
}
