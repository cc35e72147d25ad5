use crate::core::{matcher::MatchResult, tiers::Tier};

/// The near tier is selected only when it holds more facilities than this
pub const NEARBY_MATCH_THRESHOLD: usize = 1;

/// Facilities chosen for one recipient's digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestSelection {
    pub selected_tier: Tier,
    pub facility_ids: Vec<String>,
}

/// Pick the facilities a recipient should hear about
///
/// Returns the `preferred` tier subset when it has more than
/// [`NEARBY_MATCH_THRESHOLD`] members, otherwise every matched facility
/// labelled with `fallback`. `None` when nothing matched at all.
pub fn aggregate(result: &MatchResult, preferred: Tier, fallback: Tier) -> Option<DigestSelection> {
    if result.is_empty() {
        return None;
    }

    let nearby = result.ids_in_tier(preferred);
    if nearby.len() > NEARBY_MATCH_THRESHOLD {
        return Some(DigestSelection {
            selected_tier: preferred,
            facility_ids: nearby,
        });
    }

    Some(DigestSelection {
        selected_tier: fallback,
        facility_ids: result.facility_ids(),
    })
}
