pub mod openai;
pub mod parser;

use async_trait::async_trait;

use crate::errors::AppError;

/// One schema-constrained completion request against a remote model.
#[derive(Debug, Clone)]
pub struct StructuredOutputRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// Closed JSON Schema object the provider must conform to.
    pub schema: serde_json::Value,
    pub model: Option<String>,
    pub temperature: Option<f32>,
}

/// A provider that turns a prompt pair plus a JSON schema into one JSON
/// value. Implementations make exactly one attempt; any failure — transport,
/// empty content, non-JSON content — surfaces as `AppError::AiValidation`.
/// Typing the value is the caller's job.
#[async_trait]
pub trait StructuredOutputClient: Send + Sync {
    async fn generate(&self, request: &StructuredOutputRequest)
        -> Result<serde_json::Value, AppError>;
}
