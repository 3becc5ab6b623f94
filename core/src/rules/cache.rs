//! Persistent cache of rule matches
//!
//! Enumeration depends only on the rule and the numeric model, so its
//! result can be reused across runs of the same construction. Entries are
//! keyed by rule signature and store point names; the whole file is keyed by
//! the construction fingerprint.

use super::Binding;
use crate::ir::GeoState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rule signature → assignments by point name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCache {
    pub fingerprint: u64,

    pub rules: BTreeMap<String, Vec<Vec<String>>>,

    #[serde(skip)]
    dirty: bool,
}

impl MatchCache {
    pub fn new(fingerprint: u64) -> Self {
        Self {
            fingerprint,
            ..Self::default()
        }
    }

    /// Read a cache file
    ///
    /// A missing file is an empty cache. An unreadable, malformed or
    /// foreign cache is logged and replaced by an empty one.
    pub fn load<P: AsRef<Path>>(path: P, fingerprint: u64) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::new(fingerprint);
        }
        match Self::read(path) {
            Ok(cache) if cache.fingerprint == fingerprint => {
                debug!(path = %path.display(), rules = cache.rules.len(), "match cache loaded");
                cache
            }
            Ok(cache) => {
                warn!(
                    path = %path.display(),
                    expected = fingerprint,
                    found = cache.fingerprint,
                    "match cache belongs to another construction, ignoring"
                );
                Self::new(fingerprint)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable match cache, ignoring");
                Self::new(fingerprint)
            }
        }
    }

    fn read(path: &Path) -> Result<Self, CacheError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, signature: &str) -> Option<&[Vec<String>]> {
        self.rules.get(signature).map(|v| v.as_slice())
    }

    pub fn insert(&mut self, signature: String, assignments: Vec<Vec<String>>) {
        self.rules.insert(signature, assignments);
        self.dirty = true;
    }

    /// Cached bindings resolved against the state's points
    ///
    /// An entry naming an unknown point counts as a miss.
    pub fn bindings(&self, state: &GeoState, signature: &str) -> Option<Vec<Binding>> {
        self.get(signature)?
            .iter()
            .map(|names| names.iter().map(|n| state.point(n)).collect())
            .collect()
    }

    /// Store bindings by point name
    pub fn insert_bindings(&mut self, state: &GeoState, signature: String, bindings: &[Binding]) {
        let assignments = bindings
            .iter()
            .map(|b| b.iter().map(|p| state.registry.name(*p).to_string()).collect())
            .collect();
        self.insert(signature, assignments);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Point2D;
    use tempfile::TempDir;

    fn state() -> GeoState {
        let mut state = GeoState::new();
        for (name, x) in [("A", 0.0), ("B", 1.0), ("C", 2.0)] {
            state.declare_point(name, Some(Point2D::new(x, 0.0))).unwrap();
        }
        state
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("matches.json");
        let state = state();
        let binding: Binding = ["C", "A", "B"].iter().map(|n| state.point(n).unwrap()).collect();

        let mut cache = MatchCache::new(state.fingerprint());
        cache.insert_bindings(&state, "para_coll".to_string(), &[binding.clone()]);
        assert!(cache.is_dirty());
        cache.save(&path).unwrap();

        let loaded = MatchCache::load(&path, state.fingerprint());
        assert!(!loaded.is_dirty());
        assert_eq!(loaded.bindings(&state, "para_coll"), Some(vec![binding]));
        assert_eq!(loaded.bindings(&state, "perp_perp"), None);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let cache = MatchCache::load(dir.path().join("absent.json"), 7);
        assert!(cache.is_empty());
        assert_eq!(cache.fingerprint, 7);
    }

    #[test]
    fn test_malformed_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(MatchCache::load(&path, 1).is_empty());
    }

    #[test]
    fn test_foreign_fingerprint_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("matches.json");
        let mut cache = MatchCache::new(1);
        cache.insert("r".to_string(), vec![vec!["A".to_string()]]);
        cache.save(&path).unwrap();

        let loaded = MatchCache::load(&path, 2);
        assert!(loaded.is_empty());
        assert_eq!(loaded.fingerprint, 2);
    }

    #[test]
    fn test_unknown_point_is_a_miss() {
        let state = state();
        let mut cache = MatchCache::new(0);
        cache.insert("r".to_string(), vec![vec!["A".to_string(), "Z".to_string()]]);
        assert_eq!(cache.bindings(&state, "r"), None);
    }
}
