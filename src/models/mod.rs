pub mod offer;
pub mod query;
pub mod search_history;

pub use offer::{FlightOffer, FlightSegment, Price};
pub use query::{CabinClass, ParsedFlightQuery, Passengers};
pub use search_history::{PopularRoute, SearchRecord};
