use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::models::domain::{Coordinate, Recipient};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub coordinates: usize,
    pub regions: usize,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Origin zip -> tier label -> facility ids
pub type DistancesResponse = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Region lookup response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionResponse {
    pub zip: String,
    pub code: String,
    pub state: Option<String>,
    pub district: Option<String>,
}

/// One facility line in a digest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestFacility {
    pub id: String,
    pub title: Option<String>,
    pub address: Option<String>,
}

/// Digest payload for one recipient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestEntry {
    pub recipient: Recipient,
    #[serde(rename = "distanceKm")]
    pub distance_km: u32,
    pub facilities: Vec<DigestFacility>,
}

/// Response for the digest planning endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestResponse {
    #[serde(rename = "runId")]
    pub run_id: uuid::Uuid,
    #[serde(rename = "generatedAt")]
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub candidates: usize,
    pub skipped: usize,
    pub cancelled: usize,
    pub digests: Vec<DigestEntry>,
}

/// Geocoding response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeResponse {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Coordinate> for GeocodeResponse {
    fn from(c: Coordinate) -> Self {
        Self {
            latitude: c.latitude,
            longitude: c.longitude,
        }
    }
}

/// Opted-in heroes aggregated into one region
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionSummary {
    pub region: String,
    pub level: crate::reference::RegionLevel,
    pub heroes: usize,
    pub strength: f64,
}
