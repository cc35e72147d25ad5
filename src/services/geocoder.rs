use crate::core::retry::{RetryError, RetryPolicy};
use crate::models::{Coordinate, CoordinateError};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when resolving an address
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Geocoder returned error: {0}")]
    ApiError(String),

    #[error("No coordinate found for {0}")]
    NoMatch(String),

    #[error("Geocoder returned an invalid coordinate: {0}")]
    InvalidCoordinate(#[from] CoordinateError),

    #[error("Gave up resolving coordinates after {attempts} attempts over {waited:?}")]
    Exhausted { attempts: u32, waited: Duration },
}

impl From<RetryError<GeocodeError>> for GeocodeError {
    fn from(err: RetryError<GeocodeError>) -> Self {
        match err {
            RetryError::Aborted(e) => e,
            RetryError::Exhausted { attempts, waited } => GeocodeError::Exhausted { attempts, waited },
        }
    }
}

/// LocationIQ search client for new stakeholder addresses
///
/// Rate-limit responses are retried under the configured policy; running out
/// of attempts is a terminal error for the caller.
pub struct GeocodingClient {
    base_url: String,
    api_key: String,
    country: String,
    client: Client,
    retry: RetryPolicy,
}

impl GeocodingClient {
    pub fn new(
        base_url: String,
        api_key: String,
        country: String,
        retry: RetryPolicy,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            base_url,
            api_key,
            country,
            client,
            retry,
        })
    }

    /// Resolve a street address to a coordinate
    pub async fn resolve(&self, address: &str, zip_code: &str, city: &str) -> Result<Coordinate, GeocodeError> {
        let query = [address, zip_code, city, self.country.as_str()].join(",");

        let coordinate = self
            .retry
            .run(
                |_| self.search(&query),
                |e| matches!(e, GeocodeError::RateLimited),
            )
            .await?;

        tracing::info!("Resolved {} to ({}, {})", query, coordinate.latitude, coordinate.longitude);
        Ok(coordinate)
    }

    async fn search(&self, query: &str) -> Result<Coordinate, GeocodeError> {
        tracing::debug!("Requesting coordinates for: {}", query);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("key", self.api_key.as_str()), ("format", "json"), ("q", query)])
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::TOO_MANY_REQUESTS => return Err(GeocodeError::RateLimited),
            status => {
                return Err(GeocodeError::ApiError(format!(
                    "Failed to resolve coordinates: {}",
                    status
                )))
            }
        }

        let hits: Value = response.json().await?;
        let first = hits
            .as_array()
            .and_then(|h| h.first())
            .ok_or_else(|| GeocodeError::NoMatch(query.to_string()))?;

        let (Some(lat), Some(lon)) = (parse_degrees(first.get("lat")), parse_degrees(first.get("lon"))) else {
            return Err(GeocodeError::NoMatch(query.to_string()));
        };

        Ok(Coordinate::new(lat, lon)?)
    }
}

/// LocationIQ encodes degrees as strings, accept numbers too
fn parse_degrees(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}
