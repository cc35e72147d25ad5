// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Coordinate, CoordinateError, Facility, FacilityCategory, Recipient, UnknownCategory};
pub use requests::{DistancesQuery, DigestRequest, GeocodeRequest};
pub use responses::{
    DigestEntry, DigestFacility, DigestResponse, DistancesResponse, ErrorResponse, GeocodeResponse,
    HealthResponse, RegionResponse, RegionSummary,
};
