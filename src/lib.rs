//! Hero Match - proximity matching for volunteer heroes
//!
//! This library pairs a hero's postal code with nearby facilities, bucketed
//! into caller-supplied distance tiers, and rolls the matches up into digest
//! selections and regional aggregates.

pub mod config;
pub mod core;
pub mod models;
pub mod reference;
pub mod routes;
pub mod services;
pub mod shutdown;

// Re-export commonly used types
pub use core::{aggregate, distance_km, haversine_distance, DigestPlanner, DistanceTiers, MatchResult, ProximityMatcher, Tier};
pub use models::{Coordinate, Facility, FacilityCategory, Recipient};
pub use reference::{CoordinateTable, RegionIndex, RegionRollup};
pub use services::{FacilityStore, InMemoryStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        let leipzig = Coordinate::new(51.3318815, 12.3953362).unwrap();
        assert_eq!(distance_km(leipzig, leipzig), 0);
        assert_eq!(DistanceTiers::new(&[5, 15]).unwrap().classify(4), Some(Tier::new(5)));
    }
}
