use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when building a tier list
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TierError {
    #[error("at least one distance tier is required")]
    Empty,

    #[error("distance tiers must be positive")]
    Zero,

    #[error("distance tiers must be strictly ascending, {previous} is followed by {next}")]
    NotAscending { previous: u32, next: u32 },

    #[error("invalid distance tier: {0}")]
    Invalid(String),
}

/// Distance bucket bounded above by `km`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tier {
    pub km: u32,
}

impl Tier {
    pub fn new(km: u32) -> Self {
        Self { km }
    }

    /// Label used as the key in match results, e.g. `"5km"`
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}km", self.km)
    }
}

/// Non-empty, strictly ascending list of tier thresholds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceTiers {
    tiers: Vec<Tier>,
}

impl DistanceTiers {
    pub fn new(thresholds: &[u32]) -> Result<Self, TierError> {
        if thresholds.is_empty() {
            return Err(TierError::Empty);
        }
        if thresholds.contains(&0) {
            return Err(TierError::Zero);
        }
        for pair in thresholds.windows(2) {
            if pair[1] <= pair[0] {
                return Err(TierError::NotAscending {
                    previous: pair[0],
                    next: pair[1],
                });
            }
        }

        Ok(Self {
            tiers: thresholds.iter().copied().map(Tier::new).collect(),
        })
    }

    /// Return the tightest tier whose threshold is >= `distance_km`
    ///
    /// `None` means the distance exceeds every tier and the facility is
    /// excluded.
    #[inline]
    pub fn classify(&self, distance_km: u32) -> Option<Tier> {
        self.tiers.iter().copied().find(|t| distance_km <= t.km)
    }

    pub fn widest(&self) -> Tier {
        // Construction guarantees at least one tier
        self.tiers[self.tiers.len() - 1]
    }

    pub fn tightest(&self) -> Tier {
        self.tiers[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = Tier> + '_ {
        self.tiers.iter().copied()
    }
}

impl FromStr for DistanceTiers {
    type Err = TierError;

    /// Parse a comma-separated list such as `"5,15"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let thresholds = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.trim_end_matches("km")
                    .parse::<u32>()
                    .map_err(|_| TierError::Invalid(part.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(&thresholds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_into_tightest_tier() {
        let tiers = DistanceTiers::new(&[5, 15]).unwrap();

        assert_eq!(tiers.classify(0), Some(Tier::new(5)));
        assert_eq!(tiers.classify(4), Some(Tier::new(5)));
        assert_eq!(tiers.classify(5), Some(Tier::new(5)));
        assert_eq!(tiers.classify(10), Some(Tier::new(15)));
        assert_eq!(tiers.classify(15), Some(Tier::new(15)));
        assert_eq!(tiers.classify(16), None);
        assert_eq!(tiers.classify(20), None);
    }

    #[test]
    fn test_tier_label() {
        assert_eq!(Tier::new(5).label(), "5km");
        assert_eq!(Tier::new(15).to_string(), "15km");
    }

    #[test]
    fn test_rejects_invalid_lists() {
        assert_eq!(DistanceTiers::new(&[]), Err(TierError::Empty));
        assert_eq!(DistanceTiers::new(&[0, 5]), Err(TierError::Zero));
        assert_eq!(
            DistanceTiers::new(&[15, 5]),
            Err(TierError::NotAscending { previous: 15, next: 5 })
        );
        assert!(DistanceTiers::new(&[5, 5]).is_err());
    }

    #[test]
    fn test_parse_from_query_string() {
        let tiers: DistanceTiers = "5, 15km".parse().unwrap();
        assert_eq!(tiers.tightest(), Tier::new(5));
        assert_eq!(tiers.widest(), Tier::new(15));

        assert!(matches!("5,abc".parse::<DistanceTiers>(), Err(TierError::Invalid(_))));
        assert_eq!("".parse::<DistanceTiers>(), Err(TierError::Empty));
    }
}
