use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when constructing a coordinate from raw degrees
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("latitude {0} is not a finite value in [-90, 90]")]
    InvalidLatitude(f64),

    #[error("longitude {0} is not a finite value in [-180, 180]")]
    InvalidLongitude(f64),
}

/// Geographic point in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting non-finite or out-of-range degrees
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::InvalidLongitude(longitude));
        }
        Ok(Self { latitude, longitude })
    }

    /// Build a coordinate from optional parts, as stored on facility documents
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::new(lat, lon).ok(),
            _ => None,
        }
    }
}

/// Closed set of facility types a hero can be matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityCategory {
    Plasma,
    BloodDonation,
    Stadtmission,
    Tafel,
    Ads,
}

impl FacilityCategory {
    pub const ALL: [FacilityCategory; 5] = [
        FacilityCategory::Plasma,
        FacilityCategory::BloodDonation,
        FacilityCategory::Stadtmission,
        FacilityCategory::Tafel,
        FacilityCategory::Ads,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FacilityCategory::Plasma => "plasma",
            FacilityCategory::BloodDonation => "blood_donation",
            FacilityCategory::Stadtmission => "stadtmission",
            FacilityCategory::Tafel => "tafel",
            FacilityCategory::Ads => "ads",
        }
    }
}

impl fmt::Display for FacilityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown facility category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for FacilityCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        FacilityCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Location record eligible for proximity matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: String,
    pub category: FacilityCategory,
    /// `None` when the stored record lacks a usable latitude/longitude pair
    pub coordinate: Option<Coordinate>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Opted-in volunteer who may receive a digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub key: String,
    pub email: String,
    #[serde(rename = "zipCode")]
    pub zip_code: String,
}
