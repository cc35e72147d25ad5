use crate::reference::ReferenceDataError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

/// Nesting level of an administrative region, encoded as a prefix length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionLevel {
    /// Country subdivision (federal state)
    State,
    /// District within a state
    District,
}

impl RegionLevel {
    pub const ALL: [RegionLevel; 2] = [RegionLevel::State, RegionLevel::District];

    pub fn prefix_len(&self) -> usize {
        match self {
            RegionLevel::State => 2,
            RegionLevel::District => 5,
        }
    }

    fn slot(&self) -> usize {
        match self {
            RegionLevel::State => 0,
            RegionLevel::District => 1,
        }
    }
}

/// Full hierarchical region code for a postal code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionCode(String);

impl RegionCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Region id at the given level, `None` if the code is too short
    pub fn prefix(&self, level: RegionLevel) -> Option<RegionId> {
        self.0.get(..level.prefix_len()).map(|p| RegionId(p.to_string()))
    }

    /// Whether the code carries detail beyond the finest known level
    pub fn has_finer_detail(&self) -> bool {
        self.0.len() > RegionLevel::District.prefix_len()
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Region identifier at a single level (a prefix of a [`RegionCode`])
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn level(&self) -> Option<RegionLevel> {
        RegionLevel::ALL
            .into_iter()
            .find(|l| l.prefix_len() == self.0.len())
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot value: either `{ "ags": "14713000" }` or a bare code string
#[derive(Deserialize)]
#[serde(untagged)]
enum RawRegionEntry {
    Record { ags: String },
    Code(String),
}

/// Postal code -> region hierarchy code snapshot
#[derive(Debug, Clone, Default)]
pub struct RegionIndex {
    entries: HashMap<String, RegionCode>,
}

impl RegionIndex {
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), RegionCode::new(v)))
                .collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ReferenceDataError> {
        let raw: HashMap<String, RawRegionEntry> = serde_json::from_str(json)?;
        let entries = raw
            .into_iter()
            .map(|(zip, entry)| {
                let code = match entry {
                    RawRegionEntry::Record { ags } => ags,
                    RawRegionEntry::Code(code) => code,
                };
                (zip, RegionCode::new(code))
            })
            .collect();

        Ok(Self { entries })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReferenceDataError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ReferenceDataError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let index = Self::from_json(&json)?;
        tracing::info!("Loaded {} postal code regions from {}", index.len(), path.display());
        Ok(index)
    }

    #[inline]
    pub fn lookup(&self, postal_code: &str) -> Option<&RegionCode> {
        self.entries.get(postal_code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn postal_codes(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Ids and postal codes collected for one region
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionBucket {
    pub ids: Vec<String>,
    pub zips: Vec<String>,
}

/// Rolls ids registered per postal code up into state and district regions
///
/// Unknown postal codes are logged and dropped. The densest region of each
/// level defines `strength == 1.0` for that level.
#[derive(Debug)]
pub struct RegionRollup<'a> {
    index: &'a RegionIndex,
    regions: BTreeMap<RegionId, RegionBucket>,
    max_ids: [usize; 2],
}

impl<'a> RegionRollup<'a> {
    pub fn new(index: &'a RegionIndex) -> Self {
        Self {
            index,
            regions: BTreeMap::new(),
            max_ids: [1, 1],
        }
    }

    /// Attribute `ids` found at `postal_code` to every region level
    ///
    /// Returns `false` when the postal code is not in the index.
    pub fn register_ids<I, S>(&mut self, postal_code: &str, ids: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let Some(code) = self.index.lookup(postal_code) else {
            tracing::warn!("Unknown postal code {}, dropping its ids", postal_code);
            return false;
        };
        let code = code.clone();
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();

        for level in RegionLevel::ALL {
            let Some(region) = code.prefix(level) else {
                tracing::warn!("Region code {} has no {:?} prefix, skipping level", code, level);
                continue;
            };
            let bucket = self.regions.entry(region).or_default();
            bucket.ids.extend(ids.iter().cloned());
            let slot = &mut self.max_ids[level.slot()];
            *slot = (*slot).max(bucket.ids.len());
        }

        if code.has_finer_detail() {
            tracing::debug!("Region code {} provides further encoding", code);
        }
        true
    }

    /// Record that `postal_code` lies within its regions
    pub fn register_zip(&mut self, postal_code: &str) -> bool {
        let Some(code) = self.index.lookup(postal_code) else {
            tracing::warn!("Unknown postal code {}", postal_code);
            return false;
        };

        for level in RegionLevel::ALL {
            if let Some(region) = code.prefix(level) {
                self.regions
                    .entry(region)
                    .or_default()
                    .zips
                    .push(postal_code.to_string());
            }
        }
        true
    }

    /// Register every postal code known to the index
    pub fn register_all_zips(&mut self) {
        let index = self.index;
        let mut zips: Vec<&str> = index.postal_codes().collect();
        zips.sort_unstable();
        for zip in zips {
            self.register_zip(zip);
        }
    }

    pub fn get(&self, region: &RegionId) -> Option<&RegionBucket> {
        self.regions.get(region)
    }

    pub fn count(&self, region: &RegionId) -> usize {
        self.regions.get(region).map_or(0, |b| b.ids.len())
    }

    /// Relative density of a region within its level, in [0, 1]
    pub fn strength(&self, region: &RegionId) -> f64 {
        let Some(level) = region.level() else {
            return 0.0;
        };
        self.count(region) as f64 / self.max_ids[level.slot()] as f64
    }

    /// All regions at the given level, in id order
    pub fn regions(&self, level: RegionLevel) -> impl Iterator<Item = (&RegionId, &RegionBucket)> {
        self.regions
            .iter()
            .filter(move |(id, _)| id.level() == Some(level))
    }
}
