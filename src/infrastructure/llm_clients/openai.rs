use super::AgentClient;
use crate::domain::agent_config::AgentConfig;
use crate::domain::error::{AppError, Result};
use crate::domain::table::DataTable;
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

/// Rows of the table shown to the agent as context
const PREVIEW_ROWS: usize = 5;

/// Marker the agent must emit in front of its answer
const FINAL_MARKER: &str = "FINAL:";

/// Agent client for OpenAI-compatible chat completion endpoints
/// (Groq, OpenAI, local gateways).
///
/// The agent reasons in bounded steps: each reply either carries a
/// `FINAL:` answer or is treated as an intermediate step and the
/// conversation continues, up to `max_iterations` round trips.
pub struct OpenAiAgentClient {
    client: reqwest::Client,
}

impl OpenAiAgentClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn api_key(config: &AgentConfig) -> Result<String> {
        config
            .api_key
            .clone()
            .ok_or_else(|| AppError::AgentError("Missing API key".to_string()))
    }

    fn completions_url(config: &AgentConfig) -> String {
        if config.base_url.ends_with('/') {
            format!("{}chat/completions", config.base_url)
        } else {
            format!("{}/chat/completions", config.base_url)
        }
    }

    async fn chat(
        &self,
        config: &AgentConfig,
        messages: &[serde_json::Value],
    ) -> Result<String> {
        let api_key = Self::api_key(config)?;
        let url = Self::completions_url(config);

        let body = json!({
            "model": config.model,
            "messages": messages,
            "temperature": 0,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    AppError::Unreachable(format!("Request failed: {}", e))
                } else {
                    AppError::AgentError(format!("Request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::AgentError(format!(
                "API error ({}): {}",
                status, text
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::ParseError(format!("Failed to parse JSON: {}", e)))?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::ParseError("Invalid response format".to_string()))
    }
}

impl Default for OpenAiAgentClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentClient for OpenAiAgentClient {
    async fn run(&self, config: &AgentConfig, query: &str, table: &DataTable) -> Result<String> {
        let system_prompt = build_system_prompt(table, config.max_iterations);
        let mut messages = vec![
            json!({ "role": "system", "content": system_prompt }),
            json!({ "role": "user", "content": query }),
        ];

        for iteration in 1..=config.max_iterations {
            let content = self.chat(config, &messages).await?;

            if let Some(answer) = extract_final_answer(&content) {
                if answer.trim().is_empty() {
                    return Err(AppError::ParseError(
                        "Agent produced an empty final answer".to_string(),
                    ));
                }
                debug!(iteration, "agent reached final answer");
                return Ok(answer);
            }

            debug!(iteration, "agent emitted intermediate step");
            messages.push(json!({ "role": "assistant", "content": content }));
            messages.push(json!({
                "role": "user",
                "content": "Continue. Remember to end with FINAL: followed by the answer.",
            }));
        }

        Err(AppError::IterationLimit(format!(
            "no final answer within {} iterations",
            config.max_iterations
        )))
    }
}

/// Everything after the `FINAL:` marker, or None when the agent is still
/// mid-reasoning.
fn extract_final_answer(content: &str) -> Option<String> {
    content
        .find(FINAL_MARKER)
        .map(|idx| content[idx + FINAL_MARKER.len()..].trim().to_string())
}

/// System prompt carrying the table schema and a data preview.
fn build_system_prompt(table: &DataTable, max_iterations: u32) -> String {
    let preview = format_preview(table);
    format!(
        r#"You are a data analysis agent working with one table.

TABLE SCHEMA:
columns: {columns}
rows: {num_rows}

DATA PREVIEW (first rows):
{preview}

INSTRUCTIONS:
1. Answer the user's instruction using ONLY this table.
2. You may think in at most {max_iterations} steps. Prefix intermediate reasoning with "STEP:".
3. When you have the answer, reply with "FINAL:" followed by the answer and nothing after it.
4. Format tabular answers as a markdown table with a header row.
5. Format single values as the bare value (number or short text), no sentence around it.
6. Never invent columns or rows that are not in the table."#,
        columns = table.columns.join(", "),
        num_rows = table.num_rows(),
        preview = preview,
        max_iterations = max_iterations,
    )
}

fn format_preview(table: &DataTable) -> String {
    let mut out = String::new();
    out.push_str(&table.columns.join(" | "));
    out.push('\n');
    for row in table.preview(PREVIEW_ROWS) {
        out.push_str(&row.join(" | "));
        out.push('\n');
    }
    out
}
