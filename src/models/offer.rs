use serde::{Deserialize, Serialize};

/// A single bookable flight offer returned by the offers provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightOffer {
    pub id: String,
    pub price: Price,
    pub segments: Vec<FlightSegment>,
    pub total_duration_minutes: u32,
    pub stops: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Price {
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSegment {
    pub origin: String,
    pub destination: String,
    pub departure: String,
    pub arrival: String,
    pub duration_minutes: u32,
    pub carrier: String,
    pub flight_number: String,
    pub aircraft: String,
}
