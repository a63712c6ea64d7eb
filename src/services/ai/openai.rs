use std::time::Instant;

use async_trait::async_trait;
use serde_json::json;

use super::{StructuredOutputClient, StructuredOutputRequest};
use crate::errors::AppError;

const DEFAULT_TEMPERATURE: f32 = 0.7;

pub struct OpenAiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl StructuredOutputClient for OpenAiClient {
    async fn generate(
        &self,
        request: &StructuredOutputRequest,
    ) -> Result<serde_json::Value, AppError> {
        let started = Instant::now();
        let model = request.model.as_deref().unwrap_or(&self.model);

        let body = json!({
            "model": model,
            "temperature": request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_prompt },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "response",
                    "strict": true,
                    "schema": request.schema,
                },
            },
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    latency_ms = started.elapsed().as_millis() as u64,
                    error = %e,
                    "OpenAI request failed"
                );
                AppError::ai_validation(format!("failed to call OpenAI API: {e}"), None)
            })?;

        let status = resp.status();
        let data: serde_json::Value = resp.json().await.map_err(|e| {
            AppError::ai_validation(format!("failed to read OpenAI response: {e}"), None)
        })?;

        let latency_ms = started.elapsed().as_millis() as u64;

        if !status.is_success() {
            tracing::error!(latency_ms, %status, "OpenAI request failed");
            return Err(AppError::ai_validation(
                format!("OpenAI API error ({status})"),
                Some(data.to_string()),
            ));
        }

        let content = extract_content(&data).ok_or_else(|| {
            AppError::ai_validation("OpenAI returned empty response", Some(data.to_string()))
        })?;

        let parsed: serde_json::Value = serde_json::from_str(content).map_err(|e| {
            AppError::ai_validation(
                format!("OpenAI returned invalid JSON: {e}"),
                Some(content.to_string()),
            )
        })?;

        tracing::info!(
            model,
            latency_ms,
            prompt_tokens = data["usage"]["prompt_tokens"].as_i64().unwrap_or(0),
            completion_tokens = data["usage"]["completion_tokens"].as_i64().unwrap_or(0),
            total_tokens = data["usage"]["total_tokens"].as_i64().unwrap_or(0),
            "OpenAI request completed"
        );

        Ok(parsed)
    }
}

fn extract_content(data: &serde_json::Value) -> Option<&str> {
    data["choices"][0]["message"]["content"]
        .as_str()
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_content() {
        let data = json!({
            "choices": [{ "message": { "content": "{\"origin\":\"JFK\"}" } }],
            "usage": { "prompt_tokens": 120, "completion_tokens": 30, "total_tokens": 150 }
        });
        assert_eq!(extract_content(&data), Some("{\"origin\":\"JFK\"}"));
    }

    #[test]
    fn test_extract_content_missing_or_empty() {
        assert_eq!(extract_content(&json!({ "choices": [] })), None);
        assert_eq!(
            extract_content(&json!({ "choices": [{ "message": { "content": "" } }] })),
            None
        );
        assert_eq!(extract_content(&json!({ "error": "rate limited" })), None);
    }
}
