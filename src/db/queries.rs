use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::models::{PopularRoute, SearchRecord};

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ── Search history ──

pub fn insert_search(conn: &Connection, record: &SearchRecord) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO search_history (id, user_id, query, origin, destination, departure_date, return_date, results_count, search_time_ms, cabin_class, passengers, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            record.id,
            record.user_id,
            record.query,
            record.origin,
            record.destination,
            record.departure_date.format(DATE_FMT).to_string(),
            record.return_date.map(|d| d.format(DATE_FMT).to_string()),
            record.results_count,
            record.search_time_ms,
            record.cabin_class,
            record.passengers,
            record.created_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn searches_for_user(
    conn: &Connection,
    user_id: &str,
    limit: i64,
) -> rusqlite::Result<Vec<SearchRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, query, origin, destination, departure_date, return_date, results_count, search_time_ms, cabin_class, passengers, created_at
         FROM search_history WHERE user_id = ?1 ORDER BY created_at DESC, id LIMIT ?2",
    )?;

    let rows = stmt.query_map(params![user_id, limit], |row| Ok(parse_search_row(row)))?;

    let mut records = vec![];
    for row in rows {
        records.push(row??);
    }
    Ok(records)
}

pub fn popular_routes(conn: &Connection, limit: i64) -> rusqlite::Result<Vec<PopularRoute>> {
    let mut stmt = conn.prepare(
        "SELECT origin, destination, COUNT(*) AS count
         FROM search_history
         GROUP BY origin, destination
         ORDER BY count DESC, origin, destination
         LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], |row| {
        Ok(PopularRoute {
            origin: row.get(0)?,
            destination: row.get(1)?,
            count: row.get(2)?,
        })
    })?;

    let mut routes = vec![];
    for row in rows {
        routes.push(row?);
    }
    Ok(routes)
}

fn parse_search_row(row: &Row) -> rusqlite::Result<SearchRecord> {
    let departure_date_str: String = row.get(5)?;
    let return_date_str: Option<String> = row.get(6)?;
    let created_at_str: String = row.get(11)?;

    Ok(SearchRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        query: row.get(2)?,
        origin: row.get(3)?,
        destination: row.get(4)?,
        departure_date: NaiveDate::parse_from_str(&departure_date_str, DATE_FMT)
            .unwrap_or_else(|_| Utc::now().date_naive()),
        return_date: return_date_str.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FMT).ok()),
        results_count: row.get(7)?,
        search_time_ms: row.get(8)?,
        cabin_class: row.get(9)?,
        passengers: row.get(10)?,
        created_at: NaiveDateTime::parse_from_str(&created_at_str, DATETIME_FMT)
            .unwrap_or_else(|_| Utc::now().naive_utc()),
    })
}
