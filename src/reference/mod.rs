// Static reference data loaded once per process
pub mod coordinates;
pub mod regions;

pub use coordinates::CoordinateTable;
pub use regions::{RegionBucket, RegionCode, RegionId, RegionIndex, RegionLevel, RegionRollup};

use crate::models::CoordinateError;
use thiserror::Error;

/// Errors that can occur while loading a reference snapshot
#[derive(Debug, Error)]
pub enum ReferenceDataError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid coordinate for {key}: {source}")]
    InvalidCoordinate {
        key: String,
        #[source]
        source: CoordinateError,
    },
}
