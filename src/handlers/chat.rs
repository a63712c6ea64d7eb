use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{FlightOffer, ParsedFlightQuery, SearchRecord};
use crate::services::ai::parser::parse_flight_query;
use crate::state::AppState;

const MAX_QUERY_LENGTH: usize = 500;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub query: String,
    pub user_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub parsed_query: ParsedFlightQuery,
    pub results: Vec<FlightOffer>,
    pub metadata: SearchMetadata,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMetadata {
    pub search_id: String,
    pub results_count: usize,
    pub search_time: i64,
    pub timestamp: String,
}

// POST /chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let query = request.query.trim();

    // 1. Boundary validation, before any remote call
    if query.is_empty() {
        return Err(AppError::BadRequest("query must not be empty".to_string()));
    }
    if query.chars().count() > MAX_QUERY_LENGTH {
        return Err(AppError::BadRequest(format!(
            "query must be at most {MAX_QUERY_LENGTH} characters"
        )));
    }
    if let Some(user_id) = request.user_id.as_deref() {
        if Uuid::parse_str(user_id).is_err() {
            return Err(AppError::BadRequest("userId must be a valid UUID".to_string()));
        }
    }

    let search_id = Uuid::new_v4().to_string();
    let started = Instant::now();

    tracing::info!(
        search_id = %search_id,
        user_id = request.user_id.as_deref().unwrap_or(""),
        query_length = query.len(),
        "processing flight search query"
    );

    // 2. Parse the natural language query
    let parsed_query = parse_flight_query(state.ai.as_ref(), query)
        .await
        .map_err(|e| log_failure(&search_id, e))?;

    // 3. Search offers
    let results = state
        .flights
        .search_offers(&parsed_query)
        .await
        .map_err(|e| log_failure(&search_id, e))?;

    let search_time = started.elapsed().as_millis() as i64;

    // 4. Append to search history
    let record = SearchRecord {
        id: search_id.clone(),
        user_id: request.user_id.clone(),
        query: query.to_string(),
        origin: parsed_query.origin.clone(),
        destination: parsed_query.destination.clone(),
        departure_date: parsed_query.departure_date,
        return_date: parsed_query.return_date,
        results_count: results.len() as i64,
        search_time_ms: search_time,
        cabin_class: parsed_query.cabin_class.as_str().to_string(),
        passengers: parsed_query.passengers.total() as i64,
        created_at: Utc::now().naive_utc(),
    };
    {
        let db = state.db.lock().unwrap();
        queries::insert_search(&db, &record)?;
    }

    tracing::info!(
        search_id = %search_id,
        results_count = results.len(),
        search_time,
        "flight search completed"
    );

    Ok(Json(ChatResponse {
        parsed_query,
        metadata: SearchMetadata {
            search_id,
            results_count: results.len(),
            search_time,
            timestamp: Utc::now().to_rfc3339(),
        },
        results,
    }))
}

fn log_failure(search_id: &str, err: AppError) -> AppError {
    tracing::error!(search_id, error = %err, "flight search failed");
    err
}
