use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tasks::data::{Category, Priority};

#[derive(Debug, Error)]
pub enum BreakdownError {
    #[error("unable to connect to the model server: {0}")]
    Connect(String),

    #[error("no models available; pull a model on the model server first")]
    NoModelAvailable,

    #[error("model server responded with status {0}")]
    Upstream(u16),

    #[error("model response could not be used: {0}")]
    MalformedResponse(String),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl BreakdownError {
    /// The model server is unreachable or has nothing to run.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            BreakdownError::Connect(_) | BreakdownError::NoModelAvailable
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BreakdownTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    /// Always `Today` or `Tomorrow`.
    pub category: Category,
}

/// An entry as the model wrote it, before validation.
#[derive(Deserialize, Debug, Default)]
pub struct RawBreakdownTask {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl RawBreakdownTask {
    pub fn validate(self) -> Option<BreakdownTask> {
        let title = self.title.filter(|t| !t.trim().is_empty())?;
        let description = self.description.filter(|d| !d.trim().is_empty())?;
        let priority = self.priority?.parse::<Priority>().ok()?;
        let category = match self.category?.parse::<Category>().ok()? {
            c @ (Category::Today | Category::Tomorrow) => c,
            _ => return None,
        };

        Some(BreakdownTask {
            title,
            description,
            priority,
            category,
        })
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct OllamaModel {
    pub name: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct OllamaTagsResponse {
    #[serde(default)]
    pub models: Vec<OllamaModel>,
}

#[derive(Serialize, Debug)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

#[derive(Serialize, Debug)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    pub options: GenerateOptions,
}

#[derive(Deserialize, Debug)]
pub struct GenerateResponse {
    pub model: String,
    pub response: String,
    #[serde(default)]
    pub done: bool,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownResponse {
    pub success: bool,
    pub tasks: Vec<BreakdownTask>,
    pub original_weekly_tasks: Vec<String>,
}
