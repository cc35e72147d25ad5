use crate::core::{
    aggregator::aggregate,
    matcher::{MatchError, ProximityMatcher},
    tiers::{DistanceTiers, Tier, TierError},
};
use crate::models::{Facility, FacilityCategory, Recipient};
use crate::services::{cache::CachedStore, store::FacilityStore};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// Facilities selected for one recipient
#[derive(Debug, Clone)]
pub struct RecipientDigest {
    pub recipient: Recipient,
    pub selected_tier: Tier,
    pub facilities: Vec<Facility>,
}

/// Outcome of one digest batch
#[derive(Debug, Clone)]
pub struct DigestReport {
    pub run_id: uuid::Uuid,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    /// Recipients handed to the planner
    pub candidates: usize,
    /// Recipients whose match failed
    pub skipped: usize,
    /// Recipients never started because the batch was cancelled
    pub cancelled: usize,
    /// Recipients with at least one facility, sorted by key
    pub digests: Vec<RecipientDigest>,
}

/// Runs match + aggregate for every recipient of a digest round
#[derive(Debug, Clone)]
pub struct DigestPlanner {
    matcher: ProximityMatcher,
    categories: Vec<FacilityCategory>,
    tiers: DistanceTiers,
    concurrency: usize,
    cache_ttl_secs: u64,
}

impl DigestPlanner {
    /// Plan digests with a near and a far tier, `near_km < far_km`
    pub fn new(
        matcher: ProximityMatcher,
        categories: Vec<FacilityCategory>,
        near_km: u32,
        far_km: u32,
    ) -> Result<Self, TierError> {
        Ok(Self {
            matcher,
            categories,
            tiers: DistanceTiers::new(&[near_km, far_km])?,
            concurrency: 8,
            cache_ttl_secs: 300,
        })
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_cache_ttl(mut self, ttl_secs: u64) -> Self {
        self.cache_ttl_secs = ttl_secs;
        self
    }

    pub fn near(&self) -> Tier {
        self.tiers.tightest()
    }

    pub fn far(&self) -> Tier {
        self.tiers.widest()
    }

    /// Build digests for `recipients`
    ///
    /// Per-recipient failures are logged and counted, never fatal. Once
    /// `cancel` fires no further recipients are started.
    pub async fn plan<S: FacilityStore>(
        &self,
        recipients: Vec<Recipient>,
        store: S,
        cancel: &CancellationToken,
    ) -> DigestReport {
        let candidates = recipients.len();
        let store = CachedStore::new(store, self.cache_ttl_secs);

        let outcomes: Vec<Result<Option<RecipientDigest>, MatchError>> = stream::iter(recipients)
            .take_while(|_| futures::future::ready(!cancel.is_cancelled()))
            .map(|recipient| self.plan_one(recipient, &store))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let processed = outcomes.len();
        let mut skipped = 0;
        let mut digests = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(Some(digest)) => digests.push(digest),
                Ok(None) => {}
                Err(_) => skipped += 1,
            }
        }
        digests.sort_by(|a, b| a.recipient.key.cmp(&b.recipient.key));

        let report = DigestReport {
            run_id: uuid::Uuid::new_v4(),
            generated_at: chrono::Utc::now(),
            candidates,
            skipped,
            cancelled: candidates - processed,
            digests,
        };

        tracing::info!(
            "Digest run {}: {} recipients out of {} candidates ({} skipped, {} cancelled, {} listings cached)",
            report.run_id,
            report.digests.len(),
            report.candidates,
            report.skipped,
            report.cancelled,
            store.stats().entries
        );

        report
    }

    async fn plan_one<S: FacilityStore>(
        &self,
        recipient: Recipient,
        store: &CachedStore<S>,
    ) -> Result<Option<RecipientDigest>, MatchError> {
        let result = self
            .matcher
            .find_nearby(&recipient.zip_code, &self.categories, &self.tiers, store)
            .await
            .inspect_err(|e| tracing::warn!("No digest for recipient {}: {}", recipient.key, e))?;

        let Some(selection) = aggregate(&result, self.near(), self.far()) else {
            return Ok(None);
        };

        let mut by_id: HashMap<&str, FacilityCategory> = selection
            .facility_ids
            .iter()
            .filter_map(|id| result.get(id).map(|m| (id.as_str(), m.category)))
            .collect();

        let mut facilities = Vec::with_capacity(by_id.len());
        for category in &self.categories {
            if by_id.is_empty() {
                break;
            }
            let listing = store.listing(*category).await.map_err(|source| MatchError::Store {
                origin: recipient.zip_code.clone(),
                category: *category,
                source,
            })?;
            for facility in listing.iter() {
                if by_id.get(facility.id.as_str()) == Some(&facility.category) {
                    by_id.remove(facility.id.as_str());
                    facilities.push(facility.clone());
                }
            }
        }
        facilities.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(Some(RecipientDigest {
            recipient,
            selected_tier: selection.selected_tier,
            facilities,
        }))
    }
}
