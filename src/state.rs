use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::ai::StructuredOutputClient;
use crate::services::flights::FlightOffersProvider;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub ai: Box<dyn StructuredOutputClient>,
    pub flights: Box<dyn FlightOffersProvider>,
}
