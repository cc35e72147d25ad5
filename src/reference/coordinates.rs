use crate::models::Coordinate;
use crate::reference::ReferenceDataError;
use std::collections::HashMap;
use std::path::Path;

/// Postal code -> coordinate snapshot
///
/// Loaded once at startup from a JSON object of the form
/// `{ "04103": [51.3318815, 12.3953362], ... }` and never mutated afterwards.
/// Keys are matched exactly; no case folding or zero padding is applied.
#[derive(Debug, Clone, Default)]
pub struct CoordinateTable {
    entries: HashMap<String, Coordinate>,
}

impl CoordinateTable {
    /// Build a table from already validated entries
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Coordinate)>,
        K: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Parse a JSON snapshot
    pub fn from_json(json: &str) -> Result<Self, ReferenceDataError> {
        let raw: HashMap<String, [f64; 2]> = serde_json::from_str(json)?;

        let mut entries = HashMap::with_capacity(raw.len());
        for (zip, [lat, lon]) in raw {
            let coordinate = Coordinate::new(lat, lon).map_err(|source| {
                ReferenceDataError::InvalidCoordinate {
                    key: zip.clone(),
                    source,
                }
            })?;
            entries.insert(zip, coordinate);
        }

        Ok(Self { entries })
    }

    /// Load a JSON snapshot from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReferenceDataError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ReferenceDataError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let table = Self::from_json(&json)?;
        tracing::info!("Loaded {} postal code coordinates from {}", table.len(), path.display());
        Ok(table)
    }

    /// Look up the coordinate for an exact postal code
    #[inline]
    pub fn lookup(&self, postal_code: &str) -> Option<Coordinate> {
        self.entries.get(postal_code).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_exact() {
        let table = CoordinateTable::from_json(r#"{"04103": [51.3318815, 12.3953362]}"#).unwrap();

        let coord = table.lookup("04103").unwrap();
        assert_eq!(coord.latitude, 51.3318815);
        assert_eq!(coord.longitude, 12.3953362);

        // No normalization of leading zeros or whitespace
        assert!(table.lookup("4103").is_none());
        assert!(table.lookup(" 04103").is_none());
    }

    #[test]
    fn test_rejects_out_of_range_entry() {
        let err = CoordinateTable::from_json(r#"{"99999": [123.0, 12.0]}"#).unwrap_err();
        match err {
            ReferenceDataError::InvalidCoordinate { key, .. } => assert_eq!(key, "99999"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            CoordinateTable::from_json(r#"{"04103": "nope"}"#),
            Err(ReferenceDataError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = CoordinateTable::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ReferenceDataError::Io { .. }));
    }
}
