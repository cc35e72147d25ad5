// Core algorithm exports
pub mod aggregator;
pub mod digest;
pub mod distance;
pub mod matcher;
pub mod retry;
pub mod tiers;

pub use aggregator::{aggregate, DigestSelection, NEARBY_MATCH_THRESHOLD};
pub use digest::{DigestPlanner, DigestReport, RecipientDigest};
pub use distance::{distance_km, haversine_distance};
pub use matcher::{FacilityMatch, MatchError, MatchResult, ProximityMatcher};
pub use retry::{RetryError, RetryPolicy, Sleeper, TokioSleeper};
pub use tiers::{DistanceTiers, Tier, TierError};
