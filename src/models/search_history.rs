use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One row of the append-only search history table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRecord {
    pub id: String,
    pub user_id: Option<String>,
    pub query: String,
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub results_count: i64,
    pub search_time_ms: i64,
    pub cabin_class: String,
    pub passengers: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct PopularRoute {
    pub origin: String,
    pub destination: String,
    pub count: i64,
}
