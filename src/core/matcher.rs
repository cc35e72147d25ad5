use crate::core::{distance::distance_km, tiers::{DistanceTiers, Tier}};
use crate::models::{Coordinate, Facility, FacilityCategory};
use crate::reference::CoordinateTable;
use crate::services::store::{FacilityStore, StoreError};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// Errors that abort a single match invocation
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Failed to list {category} facilities for origin {origin}: {source}")]
    Store {
        origin: String,
        category: FacilityCategory,
        #[source]
        source: StoreError,
    },
}

/// Category and per-tier occurrence counts for one facility
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilityMatch {
    pub category: FacilityCategory,
    pub tier_counts: BTreeMap<Tier, u32>,
}

impl FacilityMatch {
    pub fn count(&self, tier: Tier) -> u32 {
        self.tier_counts.get(&tier).copied().unwrap_or(0)
    }

    pub fn has_tier(&self, tier: Tier) -> bool {
        self.count(tier) > 0
    }
}

/// Facilities near an origin, keyed by facility id
///
/// Every entry carries at least one non-zero tier count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    entries: BTreeMap<String, FacilityMatch>,
}

impl MatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `facility_id` in `tier`
    ///
    /// The category is fixed the first time a facility is seen.
    pub fn increment(&mut self, facility_id: &str, category: FacilityCategory, tier: Tier) {
        let entry = self
            .entries
            .entry(facility_id.to_string())
            .or_insert_with(|| FacilityMatch {
                category,
                tier_counts: BTreeMap::new(),
            });
        *entry.tier_counts.entry(tier).or_insert(0) += 1;
    }

    pub fn get(&self, facility_id: &str) -> Option<&FacilityMatch> {
        self.entries.get(facility_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FacilityMatch)> {
        self.entries.iter().map(|(id, m)| (id.as_str(), m))
    }

    /// All matched facility ids, in id order
    pub fn facility_ids(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Facility ids with a non-zero count in `tier`
    pub fn ids_in_tier(&self, tier: Tier) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, m)| m.has_tier(tier))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Tier label -> facility ids, ordered by tier distance
    pub fn by_tier(&self) -> BTreeMap<Tier, Vec<String>> {
        let mut grouped: BTreeMap<Tier, Vec<String>> = BTreeMap::new();
        for (id, m) in &self.entries {
            for (tier, count) in &m.tier_counts {
                if *count > 0 {
                    grouped.entry(*tier).or_default().push(id.clone());
                }
            }
        }
        grouped
    }
}

/// Pairs an origin postal code with facilities inside the given distance tiers
///
/// # Pipeline Stages
/// 1. Resolve the origin through the coordinate table
/// 2. List facilities per category from the store
/// 3. Classify each located facility into its tightest tier
#[derive(Debug, Clone)]
pub struct ProximityMatcher {
    coordinates: Arc<CoordinateTable>,
}

impl ProximityMatcher {
    pub fn new(coordinates: Arc<CoordinateTable>) -> Self {
        Self { coordinates }
    }

    pub fn coordinates(&self) -> &CoordinateTable {
        &self.coordinates
    }

    /// Find facilities of the given categories around `origin`
    ///
    /// An origin missing from the coordinate table yields an empty result.
    /// Any store failure aborts the whole match.
    pub async fn find_nearby<S>(
        &self,
        origin: &str,
        categories: &[FacilityCategory],
        tiers: &DistanceTiers,
        store: &S,
    ) -> Result<MatchResult, MatchError>
    where
        S: FacilityStore + ?Sized,
    {
        let mut result = MatchResult::new();

        let Some(origin_coord) = self.coordinates.lookup(origin) else {
            tracing::warn!("Cannot find coordinate for origin {}", origin);
            return Ok(result);
        };

        // Request order decides which category claims a shared facility id
        let mut seen = HashSet::with_capacity(categories.len());
        for category in categories.iter().copied().filter(|c| seen.insert(*c)) {
            let facilities = store.list_by_category(category).await.map_err(|source| {
                tracing::error!(
                    "Error calculating distances from {}: listing {} failed: {}",
                    origin,
                    category,
                    source
                );
                MatchError::Store {
                    origin: origin.to_string(),
                    category,
                    source,
                }
            })?;

            tracing::debug!("Scanning {} {} facilities for {}", facilities.len(), category, origin);
            self.scan(origin_coord, &facilities, tiers, &mut result);
        }

        Ok(result)
    }

    /// Classify already listed facilities against `origin` into `result`
    pub fn scan(
        &self,
        origin: Coordinate,
        facilities: &[Facility],
        tiers: &DistanceTiers,
        result: &mut MatchResult,
    ) {
        for facility in facilities {
            let Some(coordinate) = facility.coordinate else {
                tracing::debug!("Skipping facility {} without coordinate", facility.id);
                continue;
            };

            if let Some(tier) = tiers.classify(distance_km(origin, coordinate)) {
                result.increment(&facility.id, facility.category, tier);
            }
        }
    }
}
