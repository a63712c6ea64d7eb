use std::time::Instant;

use async_trait::async_trait;
use serde_json::json;

use super::FlightOffersProvider;
use crate::errors::AppError;
use crate::models::{FlightOffer, FlightSegment, ParsedFlightQuery, Price};

const DUFFEL_VERSION: &str = "v2";
const MAX_OFFERS: usize = 20;

pub struct DuffelClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl DuffelClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

fn duffel_error(message: impl Into<String>) -> AppError {
    AppError::ExternalApi {
        provider: "Duffel",
        message: message.into(),
    }
}

#[async_trait]
impl FlightOffersProvider for DuffelClient {
    async fn search_offers(
        &self,
        query: &ParsedFlightQuery,
    ) -> Result<Vec<FlightOffer>, AppError> {
        let started = Instant::now();

        tracing::info!(
            origin = %query.origin,
            destination = %query.destination,
            departure_date = %query.departure_date,
            "searching flights via Duffel"
        );

        let body = json!({ "data": build_offer_request(query) });

        let resp = self
            .client
            .post(format!("{}/air/offer_requests", self.base_url))
            .bearer_auth(&self.api_key)
            .header("Duffel-Version", DUFFEL_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| duffel_error(format!("offer request failed: {e}")))?;

        let status = resp.status();
        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| duffel_error(format!("failed to read offer request response: {e}")))?;

        if !status.is_success() {
            tracing::error!(%status, latency_ms = started.elapsed().as_millis() as u64, "Duffel offer request failed");
            return Err(duffel_error(format!("offer request returned {status}")));
        }

        let request_id = data["data"]["id"]
            .as_str()
            .ok_or_else(|| duffel_error("offer request response missing id"))?;

        let resp = self
            .client
            .get(format!("{}/air/offers", self.base_url))
            .bearer_auth(&self.api_key)
            .header("Duffel-Version", DUFFEL_VERSION)
            .query(&[("offer_request_id", request_id), ("sort", "total_amount")])
            .send()
            .await
            .map_err(|e| duffel_error(format!("offer listing failed: {e}")))?;

        let status = resp.status();
        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| duffel_error(format!("failed to read offers response: {e}")))?;

        if !status.is_success() {
            tracing::error!(%status, latency_ms = started.elapsed().as_millis() as u64, "Duffel offer listing failed");
            return Err(duffel_error(format!("offer listing returned {status}")));
        }

        let offers = data["data"]
            .as_array()
            .ok_or_else(|| duffel_error("offers response missing data array"))?;

        let results: Vec<FlightOffer> = offers.iter().take(MAX_OFFERS).filter_map(map_offer).collect();

        tracing::info!(
            results_count = results.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "Duffel search completed"
        );

        Ok(results)
    }
}

fn build_offer_request(query: &ParsedFlightQuery) -> serde_json::Value {
    let mut passengers = Vec::new();
    for _ in 0..query.passengers.adults {
        passengers.push(json!({ "type": "adult" }));
    }
    // Duffel identifies minors by age, not type.
    for _ in 0..query.passengers.children {
        passengers.push(json!({ "age": 10 }));
    }
    for _ in 0..query.passengers.infants {
        passengers.push(json!({ "age": 1 }));
    }

    let mut slices = vec![json!({
        "origin": query.origin,
        "destination": query.destination,
        "departure_date": query.departure_date.to_string(),
    })];
    if let Some(return_date) = query.return_date {
        slices.push(json!({
            "origin": query.destination,
            "destination": query.origin,
            "departure_date": return_date.to_string(),
        }));
    }

    let mut request = json!({
        "slices": slices,
        "passengers": passengers,
        "cabin_class": query.cabin_class.as_str(),
    });
    // Duffel only accepts 0, 1 or 2 connections.
    if let Some(max_stops) = query.max_stops {
        request["max_connections"] = json!(max_stops.min(2));
    }

    request
}

fn map_offer(offer: &serde_json::Value) -> Option<FlightOffer> {
    let id = offer["id"].as_str()?.to_string();
    let amount: f64 = offer["total_amount"].as_str()?.parse().ok()?;
    let currency = offer["total_currency"].as_str()?.to_string();

    let slices = offer["slices"].as_array()?;

    let mut segments = Vec::new();
    let mut total_duration_minutes = 0;
    let mut stops = 0;
    for slice in slices {
        let slice_segments = slice["segments"].as_array()?;
        stops += slice_segments.len().saturating_sub(1) as u32;
        total_duration_minutes += slice["duration"]
            .as_str()
            .map(duration_minutes)
            .unwrap_or(0);
        for segment in slice_segments {
            segments.push(map_segment(segment));
        }
    }

    Some(FlightOffer {
        id,
        price: Price { amount, currency },
        segments,
        total_duration_minutes,
        stops,
    })
}

fn map_segment(segment: &serde_json::Value) -> FlightSegment {
    let str_at = |value: &serde_json::Value| value.as_str().unwrap_or_default().to_string();

    FlightSegment {
        origin: str_at(&segment["origin"]["iata_code"]),
        destination: str_at(&segment["destination"]["iata_code"]),
        departure: str_at(&segment["departing_at"]),
        arrival: str_at(&segment["arriving_at"]),
        duration_minutes: segment["duration"].as_str().map(duration_minutes).unwrap_or(0),
        carrier: str_at(&segment["marketing_carrier"]["name"]),
        flight_number: str_at(&segment["marketing_carrier_flight_number"]),
        aircraft: str_at(&segment["aircraft"]["name"]),
    }
}

/// Decode an ISO 8601 duration like `PT7H30M` or `P1DT2H` into minutes.
fn duration_minutes(duration: &str) -> u32 {
    let mut minutes = 0;
    let mut number = 0u32;
    let mut in_time = false;
    for c in duration.chars() {
        match c {
            '0'..='9' => number = number * 10 + (c as u32 - '0' as u32),
            'T' => {
                in_time = true;
                number = 0;
            }
            'D' => {
                minutes += number * 24 * 60;
                number = 0;
            }
            'H' => {
                minutes += number * 60;
                number = 0;
            }
            'M' if in_time => {
                minutes += number;
                number = 0;
            }
            _ => number = 0,
        }
    }
    minutes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CabinClass, Passengers};
    use chrono::NaiveDate;

    fn query(return_date: Option<NaiveDate>, max_stops: Option<u32>) -> ParsedFlightQuery {
        ParsedFlightQuery {
            origin: "JFK".to_string(),
            destination: "LHR".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2025, 6, 8).unwrap(),
            return_date,
            passengers: Passengers {
                adults: 2,
                children: 1,
                infants: 1,
            },
            cabin_class: CabinClass::Business,
            max_stops,
        }
    }

    #[test]
    fn test_build_offer_request_one_way() {
        let request = build_offer_request(&query(None, None));

        let slices = request["slices"].as_array().unwrap();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0]["origin"], "JFK");
        assert_eq!(slices[0]["departure_date"], "2025-06-08");

        // 2 adults by type, child age 10, infant age 1
        let passengers = request["passengers"].as_array().unwrap();
        assert_eq!(passengers.len(), 4);
        assert_eq!(passengers[0]["type"], "adult");
        assert_eq!(passengers[1]["type"], "adult");
        assert_eq!(passengers[2]["age"], 10);
        assert_eq!(passengers[3]["age"], 1);

        assert_eq!(request["cabin_class"], "business");
        assert!(request.get("max_connections").is_none());
    }

    #[test]
    fn test_build_offer_request_round_trip() {
        let return_date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let request = build_offer_request(&query(Some(return_date), None));

        let slices = request["slices"].as_array().unwrap();
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[1]["origin"], "LHR");
        assert_eq!(slices[1]["destination"], "JFK");
        assert_eq!(slices[1]["departure_date"], "2025-06-15");
    }

    #[test]
    fn test_max_connections_clamped() {
        assert_eq!(build_offer_request(&query(None, Some(0)))["max_connections"], 0);
        assert_eq!(build_offer_request(&query(None, Some(1)))["max_connections"], 1);
        assert_eq!(build_offer_request(&query(None, Some(5)))["max_connections"], 2);
    }

    #[test]
    fn test_duration_minutes() {
        assert_eq!(duration_minutes("PT2H30M"), 150);
        assert_eq!(duration_minutes("PT45M"), 45);
        assert_eq!(duration_minutes("PT11H"), 660);
        assert_eq!(duration_minutes("P1DT2H"), 1560);
        assert_eq!(duration_minutes(""), 0);
    }

    #[test]
    fn test_map_offer() {
        let offer = json!({
            "id": "off_123",
            "total_amount": "421.30",
            "total_currency": "USD",
            "slices": [{
                "duration": "PT9H15M",
                "segments": [
                    {
                        "origin": { "iata_code": "JFK" },
                        "destination": { "iata_code": "KEF" },
                        "departing_at": "2025-06-08T18:30:00",
                        "arriving_at": "2025-06-09T04:25:00",
                        "duration": "PT5H55M",
                        "marketing_carrier": { "name": "Icelandair" },
                        "marketing_carrier_flight_number": "614",
                        "aircraft": { "name": "Boeing 757-200" }
                    },
                    {
                        "origin": { "iata_code": "KEF" },
                        "destination": { "iata_code": "LHR" },
                        "departing_at": "2025-06-09T07:40:00",
                        "arriving_at": "2025-06-09T11:00:00",
                        "duration": "PT3H20M",
                        "marketing_carrier": { "name": "Icelandair" },
                        "marketing_carrier_flight_number": "450",
                        "aircraft": { "name": "Boeing 737 MAX 8" }
                    }
                ]
            }]
        });

        let mapped = map_offer(&offer).unwrap();
        assert_eq!(mapped.id, "off_123");
        assert_eq!(mapped.price.amount, 421.30);
        assert_eq!(mapped.price.currency, "USD");
        assert_eq!(mapped.segments.len(), 2);
        assert_eq!(mapped.segments[0].origin, "JFK");
        assert_eq!(mapped.segments[1].flight_number, "450");
        assert_eq!(mapped.total_duration_minutes, 555);
        assert_eq!(mapped.stops, 1);
    }

    #[test]
    fn test_map_offer_missing_price_skipped() {
        let offer = json!({ "id": "off_456", "slices": [] });
        assert!(map_offer(&offer).is_none());
    }
}
