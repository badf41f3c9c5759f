//! Reqwest-backed Google Maps source.
//!
//! Owns transport details only: query construction, timeouts, HTTP and API
//! status mapping, and JSON decoding into domain records.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::warn;

use super::dto::{DirectionsResponseDto, GeocodeResponseDto};
use crate::domain::ports::{MapsSource, MapsSourceError};
use crate::domain::{DirectionsPlan, DirectionsRequest, GeocodeResult};

const GEOCODE_PATH: &str = "maps/api/geocode/json";
const DIRECTIONS_PATH: &str = "maps/api/directions/json";

/// Maps source calling Google's web service APIs with a server key.
pub struct GoogleMapsSource {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl GoogleMapsSource {
    /// Build the adapter.
    ///
    /// `base_url` is normally `https://maps.googleapis.com`; tests point it
    /// elsewhere.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: Url,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, MapsSourceError> {
        self.base_url
            .join(path)
            .map_err(|err| MapsSourceError::invalid_request(err.to_string()))
    }

    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<u8>, MapsSourceError> {
        let response = self
            .client
            .get(self.endpoint(path)?)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(MapsSourceError::status(status.as_u16()));
        }
        response
            .bytes()
            .await
            .map(|body| body.to_vec())
            .map_err(transport_error)
    }
}

/// Request URLs carry the API key, so reqwest errors are reported without them.
fn transport_error(err: reqwest::Error) -> MapsSourceError {
    MapsSourceError::transport(err.without_url().to_string())
}

/// Map the API-level `status` field onto port errors.
fn check_api_status(status: &str, message: Option<String>) -> Result<(), MapsSourceError> {
    let message = message.unwrap_or_else(|| status.to_owned());
    match status {
        "OK" => Ok(()),
        "ZERO_RESULTS" | "NOT_FOUND" => Err(MapsSourceError::no_results()),
        "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => Err(MapsSourceError::quota()),
        "REQUEST_DENIED" => Err(MapsSourceError::denied(message)),
        "INVALID_REQUEST" | "MAX_WAYPOINTS_EXCEEDED" | "MAX_ROUTE_LENGTH_EXCEEDED" => {
            Err(MapsSourceError::invalid_request(message))
        }
        other => {
            warn!(status = other, "unexpected maps API status");
            Err(MapsSourceError::transport(message))
        }
    }
}

fn parse_geocode(body: &[u8]) -> Result<GeocodeResult, MapsSourceError> {
    let decoded: GeocodeResponseDto = serde_json::from_slice(body)
        .map_err(|err| MapsSourceError::decode(format!("invalid geocode payload: {err}")))?;
    check_api_status(&decoded.status, decoded.error_message.clone())?;
    decoded
        .into_best_match()
        .map_err(MapsSourceError::decode)?
        .ok_or_else(MapsSourceError::no_results)
}

fn parse_directions(body: &[u8]) -> Result<DirectionsPlan, MapsSourceError> {
    let decoded: DirectionsResponseDto = serde_json::from_slice(body)
        .map_err(|err| MapsSourceError::decode(format!("invalid directions payload: {err}")))?;
    check_api_status(&decoded.status, decoded.error_message.clone())?;
    decoded.into_plan().ok_or_else(MapsSourceError::no_results)
}

fn directions_query(request: &DirectionsRequest) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("origin", request.origin().to_query_value()),
        ("destination", request.destination().to_query_value()),
        ("mode", "driving".to_owned()),
    ];
    if !request.waypoints().is_empty() {
        let waypoints = request
            .waypoints()
            .iter()
            .map(|stop| stop.to_query_value())
            .collect::<Vec<_>>()
            .join("|");
        query.push(("waypoints", waypoints));
    }
    query
}

#[async_trait]
impl MapsSource for GoogleMapsSource {
    async fn geocode(&self, address: &str) -> Result<GeocodeResult, MapsSourceError> {
        let body = self
            .get_json(GEOCODE_PATH, &[("address", address.to_owned())])
            .await?;
        parse_geocode(&body)
    }

    async fn directions(
        &self,
        request: &DirectionsRequest,
    ) -> Result<DirectionsPlan, MapsSourceError> {
        let body = self
            .get_json(DIRECTIONS_PATH, &directions_query(request))
            .await?;
        parse_directions(&body)
    }
}

#[cfg(test)]
mod tests {
    //! Coverage for the non-network mapping helpers.

    use rstest::rstest;

    use super::*;
    use crate::domain::{Coordinates, DirectionsStop};

    #[rstest]
    #[case("ZERO_RESULTS", MapsSourceError::no_results())]
    #[case("OVER_QUERY_LIMIT", MapsSourceError::quota())]
    #[case("REQUEST_DENIED", MapsSourceError::denied("key rejected"))]
    #[case("INVALID_REQUEST", MapsSourceError::invalid_request("key rejected"))]
    #[case("UNKNOWN_ERROR", MapsSourceError::transport("key rejected"))]
    fn api_statuses_map_to_port_errors(#[case] status: &str, #[case] expected: MapsSourceError) {
        let err = check_api_status(status, Some("key rejected".into())).expect_err("error status");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn geocode_takes_first_result() {
        let body = r#"{
            "status": "OK",
            "results": [
                {
                    "formatted_address": "1 Market St, San Francisco, CA 94105, USA",
                    "geometry": { "location": { "lat": 37.7946, "lng": -122.395 } }
                },
                {
                    "formatted_address": "Market St, Oakland, CA, USA",
                    "geometry": { "location": { "lat": 37.81, "lng": -122.27 } }
                }
            ]
        }"#;
        let result = parse_geocode(body.as_bytes()).expect("decoded");
        assert_eq!(
            result.formatted_address,
            "1 Market St, San Francisco, CA 94105, USA"
        );
        assert_eq!(result.coordinates.lat(), 37.7946);
    }

    #[rstest]
    fn geocode_with_ok_status_but_no_results_is_no_results() {
        let err = parse_geocode(br#"{"status":"OK","results":[]}"#).expect_err("empty");
        assert_eq!(err, MapsSourceError::no_results());
    }

    #[rstest]
    fn directions_sum_leg_totals() {
        let body = r#"{
            "status": "OK",
            "routes": [{
                "overview_polyline": { "points": "a~l~Fjk~uOwHJy@P" },
                "legs": [
                    {
                        "start_address": "Oakland",
                        "end_address": "Emeryville",
                        "distance": { "text": "3 km", "value": 3000 },
                        "duration": { "text": "6 mins", "value": 360 }
                    },
                    {
                        "start_address": "Emeryville",
                        "end_address": "Berkeley",
                        "distance": { "text": "4 km", "value": 4200 },
                        "duration": { "text": "8 mins", "value": 480 }
                    }
                ]
            }]
        }"#;
        let plan = parse_directions(body.as_bytes()).expect("decoded");
        assert_eq!(plan.distance_meters, 7200);
        assert_eq!(plan.duration_seconds, 840);
        assert_eq!(plan.legs.len(), 2);
        assert_eq!(plan.polyline, "a~l~Fjk~uOwHJy@P");
    }

    #[rstest]
    fn malformed_payload_is_a_decode_error() {
        let err = parse_directions(b"<html>").expect_err("not json");
        assert!(matches!(err, MapsSourceError::Decode { .. }));
    }

    #[tokio::test]
    async fn transport_errors_do_not_leak_the_api_key() {
        let base = Url::parse("http://127.0.0.1:1/").expect("url");
        let source =
            GoogleMapsSource::new(base, "SECRET-KEY-123", Duration::from_secs(2)).expect("client");
        let err = source.geocode("Market St").await.expect_err("nothing listens");
        assert!(matches!(err, MapsSourceError::Transport { .. }));
        assert!(!err.to_string().contains("SECRET-KEY-123"), "{err}");
    }

    #[rstest]
    fn waypoints_are_pipe_separated() {
        let request = DirectionsRequest::new(
            DirectionsStop::Address("Oakland".into()),
            DirectionsStop::Coordinates(Coordinates::new(37.87, -122.27).expect("coords")),
            vec![
                DirectionsStop::Address("Emeryville".into()),
                DirectionsStop::Address("Albany".into()),
            ],
        )
        .expect("request");
        let query = directions_query(&request);
        assert!(query.contains(&("destination", "37.87,-122.27".to_owned())));
        assert!(query.contains(&("waypoints", "Emeryville|Albany".to_owned())));
    }
}
