use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The model call failed outright, returned empty content, or returned
    /// content that does not validate against the requested schema.
    #[error("AI validation error: {message}")]
    AiValidation {
        message: String,
        raw_output: Option<String>,
    },

    /// The extracted query is well-formed but semantically rejected.
    #[error("invalid flight search: {message}")]
    InvalidSearch {
        message: String,
        field: Option<&'static str>,
    },

    #[error("{provider} API error: {message}")]
    ExternalApi {
        provider: &'static str,
        message: String,
    },

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    pub fn ai_validation(message: impl Into<String>, raw_output: Option<String>) -> Self {
        AppError::AiValidation {
            message: message.into(),
            raw_output,
        }
    }

    pub fn invalid_search(message: impl Into<String>, field: Option<&'static str>) -> Self {
        AppError::InvalidSearch {
            message: message.into(),
            field,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Database(_) => "InternalServerError",
            AppError::AiValidation { .. } => "AiValidationError",
            AppError::InvalidSearch { .. } => "InvalidFlightSearch",
            AppError::ExternalApi { .. } => "ExternalApiError",
            AppError::BadRequest(_) => "BadRequest",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::AiValidation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidSearch { .. } => StatusCode::BAD_REQUEST,
            AppError::ExternalApi { .. } => StatusCode::BAD_GATEWAY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Raw model output stays in the logs, never in the response body.
        if let AppError::AiValidation {
            message,
            raw_output: Some(raw),
        } = &self
        {
            tracing::error!(error = %message, raw_output = %raw, "AI validation failure");
        }

        let mut body = serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        match &self {
            AppError::InvalidSearch {
                field: Some(field), ..
            } => {
                body["field"] = serde_json::Value::String(field.to_string());
            }
            AppError::ExternalApi { provider, .. } => {
                body["provider"] = serde_json::Value::String(provider.to_string());
            }
            _ => {}
        }

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                AppError::ai_validation("empty response", None),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::invalid_search("past date", Some("departureDate")),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::ExternalApi {
                    provider: "Duffel",
                    message: "timeout".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                AppError::BadRequest("query must not be empty".into()),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
