use chrono::{Local, NaiveDate};
use serde_json::json;

use super::{StructuredOutputClient, StructuredOutputRequest};
use crate::errors::AppError;
use crate::models::ParsedFlightQuery;

// Low temperature: extraction should be deterministic, not creative.
const PARSE_TEMPERATURE: f32 = 0.3;

/// Parse a natural language flight query into structured parameters.
///
/// Exactly one model round-trip per call. Failures keep their
/// classification: `AiValidation` for anything the model side got wrong,
/// `InvalidSearch` for well-formed output that fails date validation.
/// Anything else normalizes to a generic `InvalidSearch` so callers never
/// see an unclassified error.
pub async fn parse_flight_query(
    ai: &dyn StructuredOutputClient,
    query: &str,
) -> Result<ParsedFlightQuery, AppError> {
    tracing::info!(query_length = query.len(), "parsing flight query");

    let today = Local::now().date_naive();
    let request = StructuredOutputRequest {
        system_prompt: system_prompt(today),
        user_prompt: query.to_string(),
        schema: flight_query_schema(),
        model: None,
        temperature: Some(PARSE_TEMPERATURE),
    };

    match extract_and_validate(ai, &request, today).await {
        Ok(parsed) => {
            tracing::info!(
                origin = %parsed.origin,
                destination = %parsed.destination,
                departure_date = %parsed.departure_date,
                "flight query parsed"
            );
            Ok(parsed)
        }
        Err(err @ (AppError::InvalidSearch { .. } | AppError::AiValidation { .. })) => Err(err),
        Err(other) => {
            tracing::error!(error = %other, "failed to parse flight query");
            Err(AppError::invalid_search("Failed to parse flight query", None))
        }
    }
}

async fn extract_and_validate(
    ai: &dyn StructuredOutputClient,
    request: &StructuredOutputRequest,
    today: NaiveDate,
) -> Result<ParsedFlightQuery, AppError> {
    let raw = ai.generate(request).await?;

    let parsed: ParsedFlightQuery = serde_json::from_value(raw.clone()).map_err(|e| {
        AppError::ai_validation(
            format!("model output did not match the flight query schema: {e}"),
            Some(raw.to_string()),
        )
    })?;

    validate_dates(&parsed, today)?;
    Ok(parsed)
}

fn validate_dates(parsed: &ParsedFlightQuery, today: NaiveDate) -> Result<(), AppError> {
    if parsed.departure_date < today {
        return Err(AppError::invalid_search(
            "Departure date must be in the future",
            Some("departureDate"),
        ));
    }

    if let Some(return_date) = parsed.return_date {
        if return_date <= parsed.departure_date {
            return Err(AppError::invalid_search(
                "Return date must be after departure date",
                Some("returnDate"),
            ));
        }
    }

    Ok(())
}

fn system_prompt(today: NaiveDate) -> String {
    format!(
        r#"Extract flight search parameters from natural language queries.

Rules:
- Use 3-letter IATA airport codes
- Dates in YYYY-MM-DD format
- Default: 1 adult, economy class
- Dates relative to: {today}

Examples:
- "NYC to London" means origin JFK, destination LHR
- "tomorrow" means 1 day after today
- "next week" means 7 days after today"#
    )
}

/// Closed schema for the model's response. Every property is required;
/// optionals are typed nullable so the model must emit an explicit null
/// instead of omitting the key (strict mode rejects schemas where required
/// and optional disagree).
pub fn flight_query_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "origin": {
                "type": "string",
                "description": "Origin airport IATA code (3 letters)",
            },
            "destination": {
                "type": "string",
                "description": "Destination airport IATA code (3 letters)",
            },
            "departureDate": {
                "type": "string",
                "description": "Departure date in ISO 8601 format (YYYY-MM-DD)",
            },
            "returnDate": {
                "type": ["string", "null"],
                "description": "Return date in ISO 8601 format (YYYY-MM-DD), null for one-way",
            },
            "passengers": {
                "type": "object",
                "properties": {
                    "adults": { "type": "integer", "minimum": 1, "maximum": 9 },
                    "children": { "type": "integer", "minimum": 0, "maximum": 9, "default": 0 },
                    "infants": { "type": "integer", "minimum": 0, "maximum": 9, "default": 0 },
                },
                "required": ["adults", "children", "infants"],
                "additionalProperties": false,
            },
            "cabinClass": {
                "type": "string",
                "enum": ["economy", "premium_economy", "business", "first"],
            },
            "maxStops": {
                "type": ["integer", "null"],
                "description": "Maximum number of stops (0 for direct)",
            },
        },
        "required": ["origin", "destination", "departureDate", "returnDate", "passengers", "cabinClass", "maxStops"],
        "additionalProperties": false,
    })
}
