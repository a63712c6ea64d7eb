use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{PopularRoute, SearchRecord};
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 10;

// GET /searches/history?userId=xxx&limit=10
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub user_id: String,
    pub limit: Option<i64>,
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<SearchRecord>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

    let records = {
        let db = state.db.lock().unwrap();
        queries::searches_for_user(&db, &query.user_id, limit)?
    };

    Ok(Json(records))
}

// GET /searches/popular?limit=10
#[derive(Deserialize)]
pub struct PopularQuery {
    pub limit: Option<i64>,
}

pub async fn get_popular(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PopularQuery>,
) -> Result<Json<Vec<PopularRoute>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

    let routes = {
        let db = state.db.lock().unwrap();
        queries::popular_routes(&db, limit)?
    };

    Ok(Json(routes))
}
