use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Structured flight search parameters extracted from a natural language
/// query. This is exactly the shape the model is constrained to emit:
/// optional fields are present-but-null rather than omitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ParsedFlightQuery {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub passengers: Passengers,
    pub cabin_class: CabinClass,
    pub max_stops: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Passengers {
    pub adults: u8,
    #[serde(default)]
    pub children: u8,
    #[serde(default)]
    pub infants: u8,
}

impl Passengers {
    pub fn total(&self) -> u32 {
        self.adults as u32 + self.children as u32 + self.infants as u32
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CabinClass {
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CabinClass::Economy => "economy",
            CabinClass::PremiumEconomy => "premium_economy",
            CabinClass::Business => "business",
            CabinClass::First => "first",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_nulls() {
        let json = r#"{
            "origin": "JFK",
            "destination": "LHR",
            "departureDate": "2025-06-08",
            "returnDate": null,
            "passengers": {"adults": 1, "children": 0, "infants": 0},
            "cabinClass": "economy",
            "maxStops": null
        }"#;
        let query: ParsedFlightQuery = serde_json::from_str(json).unwrap();
        assert_eq!(query.origin, "JFK");
        assert_eq!(query.return_date, None);
        assert_eq!(query.max_stops, None);
        assert_eq!(query.cabin_class, CabinClass::Economy);
    }

    #[test]
    fn test_passenger_counts_default_to_zero() {
        let json = r#"{"adults": 2}"#;
        let passengers: Passengers = serde_json::from_str(json).unwrap();
        assert_eq!(passengers.children, 0);
        assert_eq!(passengers.infants, 0);
        assert_eq!(passengers.total(), 2);
    }

    #[test]
    fn test_cabin_class_wire_names() {
        let premium: CabinClass = serde_json::from_str(r#""premium_economy""#).unwrap();
        assert_eq!(premium, CabinClass::PremiumEconomy);
        assert_eq!(premium.as_str(), "premium_economy");
    }
}
