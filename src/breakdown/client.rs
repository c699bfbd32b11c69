use reqwest::Client;

use std::time::Duration;

use crate::config::AppConfig;

use super::data::*;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Thin client for an Ollama-compatible inference server.
pub struct OllamaClient {
    http: Client,
    base_url: String,
    preferred_models: Vec<String>,
}

impl OllamaClient {
    pub fn new(config: &AppConfig) -> Result<OllamaClient, BreakdownError> {
        Ok(OllamaClient {
            http: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            base_url: config.ollama_base_url.trim_end_matches('/').to_string(),
            preferred_models: config.preferred_models.clone(),
        })
    }

    pub async fn available_models(&self) -> Result<Vec<OllamaModel>, BreakdownError> {
        let response = self
            .http
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| BreakdownError::Connect(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BreakdownError::Upstream(response.status().as_u16()));
        }

        let tags: OllamaTagsResponse = response
            .json()
            .await
            .map_err(|e| BreakdownError::MalformedResponse(e.to_string()))?;

        Ok(tags.models)
    }

    pub async fn best_model(&self) -> Result<String, BreakdownError> {
        let models = self.available_models().await?;
        pick_model(&models, &self.preferred_models).ok_or(BreakdownError::NoModelAvailable)
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, BreakdownError> {
        let model = self.best_model().await?;
        log::debug!("generating with model {}", model);

        let request = GenerateRequest {
            model: &model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: 0.7,
                top_p: 0.9,
                max_tokens: 2000,
            },
        };

        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| BreakdownError::Connect(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BreakdownError::Upstream(response.status().as_u16()));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| BreakdownError::MalformedResponse(e.to_string()))?;
        log::debug!("{} answered (done: {})", generated.model, generated.done);

        Ok(generated.response)
    }

    /// Splits week-level plans into smaller tasks for today and tomorrow.
    pub async fn break_down(&self, weekly_tasks: &[String]) -> Result<Vec<BreakdownTask>, BreakdownError> {
        let response = self.generate(&build_prompt(weekly_tasks)).await?;
        let tasks = extract_tasks(&response)?;
        log::info!(
            "model broke {} weekly tasks into {} tasks",
            weekly_tasks.len(),
            tasks.len()
        );
        Ok(tasks)
    }
}

/// First model matching a preferred name (in preference order), else the first
/// model listed.
pub fn pick_model(models: &[OllamaModel], preferred: &[String]) -> Option<String> {
    preferred
        .iter()
        .find_map(|wanted| {
            let wanted = wanted.to_lowercase();
            models
                .iter()
                .find(|model| model.name.to_lowercase().contains(&wanted))
        })
        .or_else(|| models.first())
        .map(|model| model.name.clone())
}

pub fn build_prompt(weekly_tasks: &[String]) -> String {
    let tasks_text = weekly_tasks
        .iter()
        .enumerate()
        .map(|(i, task)| format!("{}. {}", i + 1, task))
        .collect::<Vec<String>>()
        .join("\n");

    format!(
        r#"You are a task management assistant. I have these weekly plans/tasks:

{}

Please break these down into smaller, actionable tasks and distribute them across today and tomorrow. Follow these guidelines:

1. Break large tasks into smaller, specific actions (max 2-3 hours each)
2. Consider urgency and importance when assigning to today vs tomorrow
3. Assign priority levels (high, medium, low) based on importance and urgency
4. Provide clear, actionable descriptions
5. Balance the load between today and tomorrow when possible

Respond with a JSON array in this exact format:
[
  {{
    "title": "Specific task title",
    "description": "Clear description of what needs to be done",
    "priority": "high|medium|low",
    "category": "today|tomorrow"
  }}
]

Only respond with the JSON array, no other text."#,
        tasks_text
    )
}

/// Parses the outermost `[...]` span of a model response, keeping only entries
/// that validate.
pub fn extract_tasks(response: &str) -> Result<Vec<BreakdownTask>, BreakdownError> {
    let start = response.find('[');
    let end = response.rfind(']');

    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &response[start..=end],
        _ => {
            return Err(BreakdownError::MalformedResponse(
                "response did not contain a JSON array".to_string(),
            ))
        }
    };

    let entries: Vec<serde_json::Value> = serde_json::from_str(json)
        .map_err(|e| BreakdownError::MalformedResponse(e.to_string()))?;

    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<RawBreakdownTask>(entry).ok())
        .filter_map(RawBreakdownTask::validate)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::data::{Category, Priority};

    fn model(name: &str) -> OllamaModel {
        OllamaModel {
            name: name.to_string(),
        }
    }

    fn preferred() -> Vec<String> {
        vec!["qwen3".to_string(), "gemma3".to_string()]
    }

    #[test]
    fn prefers_models_in_order() {
        let models = vec![model("llama3:8b"), model("Gemma3:4b"), model("qwen3:14b")];
        assert_eq!(pick_model(&models, &preferred()), Some("qwen3:14b".to_string()));

        let models = vec![model("llama3:8b"), model("gemma3:4b")];
        assert_eq!(pick_model(&models, &preferred()), Some("gemma3:4b".to_string()));
    }

    #[test]
    fn falls_back_to_first_model() {
        let models = vec![model("mistral"), model("llama3")];
        assert_eq!(pick_model(&models, &preferred()), Some("mistral".to_string()));
        assert_eq!(pick_model(&[], &preferred()), None);
    }

    #[test]
    fn prompt_numbers_weekly_tasks() {
        let prompt = build_prompt(&["Write report".to_string(), "Plan trip".to_string()]);
        assert!(prompt.contains("1. Write report\n2. Plan trip"));
        assert!(prompt.contains(r#""category": "today|tomorrow""#));
    }

    #[test]
    fn extracts_array_surrounded_by_chatter() {
        let response = r#"Sure! Here you go:
[
  {"title": "Outline report", "description": "Draft section headings", "priority": "high", "category": "today"},
  {"title": "Book hotel", "description": "Compare two options", "priority": "low", "category": "tomorrow"}
]
Let me know if you need more."#;

        let tasks = extract_tasks(response).unwrap();

        assert_eq!(
            tasks,
            vec![
                BreakdownTask {
                    title: "Outline report".into(),
                    description: "Draft section headings".into(),
                    priority: Priority::High,
                    category: Category::Today,
                },
                BreakdownTask {
                    title: "Book hotel".into(),
                    description: "Compare two options".into(),
                    priority: Priority::Low,
                    category: Category::Tomorrow,
                },
            ]
        );
    }

    #[test]
    fn drops_invalid_entries() {
        let response = r#"[
  {"title": "", "description": "d", "priority": "high", "category": "today"},
  {"title": "t", "description": "d", "priority": "urgent", "category": "today"},
  {"title": "t", "description": "d", "priority": "low", "category": "week"},
  {"title": "t", "priority": "low", "category": "today"},
  "not an object",
  {"title": "keep", "description": "d", "priority": "medium", "category": "tomorrow"}
]"#;

        let tasks = extract_tasks(response).unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "keep");
    }

    #[test]
    fn rejects_responses_without_array() {
        assert!(matches!(
            extract_tasks("I cannot help with that."),
            Err(BreakdownError::MalformedResponse(_))
        ));
        assert!(matches!(
            extract_tasks("] backwards ["),
            Err(BreakdownError::MalformedResponse(_))
        ));
        assert!(matches!(
            extract_tasks("[not json]"),
            Err(BreakdownError::MalformedResponse(_))
        ));
    }
}
