pub mod duffel;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{FlightOffer, ParsedFlightQuery};

#[async_trait]
pub trait FlightOffersProvider: Send + Sync {
    async fn search_offers(&self, query: &ParsedFlightQuery)
        -> Result<Vec<FlightOffer>, AppError>;
}
