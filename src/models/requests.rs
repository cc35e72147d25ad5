use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query for the distance debugging endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DistancesQuery {
    /// Comma-separated origin postal codes
    #[validate(length(min = 1))]
    pub zips: String,
    /// Comma-separated category names, defaults from settings when absent
    #[serde(default)]
    pub categories: Option<String>,
    /// Comma-separated ascending kilometer thresholds
    #[serde(default)]
    pub tiers: Option<String>,
}

/// Request to plan digests for all opted-in heroes
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DigestRequest {
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[validate(range(min = 1))]
    #[serde(alias = "near_km", rename = "nearKm", default)]
    pub near_km: Option<u32>,
    #[validate(range(min = 1))]
    #[serde(alias = "far_km", rename = "farKm", default)]
    pub far_km: Option<u32>,
}

/// Request to resolve a new stakeholder address
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GeocodeRequest {
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(length(min = 1))]
    #[serde(alias = "zip_code", rename = "zipCode")]
    pub zip_code: String,
    #[validate(length(min = 1))]
    pub city: String,
}
