//! Durable A/B test variant storage.
//!
//! Assignments are keyed by test name and must survive the process so a
//! returning user keeps the same variant across sessions. The engine owns the
//! assignment rule (stored value wins while it remains a member of the
//! supplied variant list); stores only get and set.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Variant storage errors.
#[derive(Debug)]
pub enum VariantStoreError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for VariantStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariantStoreError::IoError(e) => write!(f, "IO error: {e}"),
            VariantStoreError::ParseError(e) => write!(f, "Parse error: {e}"),
            VariantStoreError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for VariantStoreError {}

/// Durable per-test variant storage.
pub trait VariantStore: Send {
    /// Look up the stored variant for a test.
    fn get(&self, test: &str) -> Result<Option<String>, VariantStoreError>;

    /// Persist the variant for a test, replacing any previous value.
    fn set(&mut self, test: &str, variant: &str) -> Result<(), VariantStoreError>;
}

/// Persisted assignment file format.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedAssignments {
    assignments: HashMap<String, String>,
}

/// File-backed variant store.
///
/// Assignments live in a single JSON file; every set rewrites it. Volumes are
/// tiny (one entry per running experiment), so no incremental writes.
#[derive(Debug)]
pub struct FileVariantStore {
    path: PathBuf,
    assignments: HashMap<String, String>,
}

impl FileVariantStore {
    /// Open a store at the given path, loading existing assignments.
    pub fn open(path: PathBuf) -> Result<Self, VariantStoreError> {
        let assignments = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| VariantStoreError::IoError(e.to_string()))?;
            let persisted: PersistedAssignments = serde_json::from_str(&content)
                .map_err(|e| VariantStoreError::ParseError(e.to_string()))?;
            persisted.assignments
        } else {
            HashMap::new()
        };

        Ok(Self { path, assignments })
    }

    /// Default store location under the given data directory.
    pub fn default_path(data_path: &std::path::Path) -> PathBuf {
        data_path.join("ab_variants.json")
    }

    fn persist(&self) -> Result<(), VariantStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| VariantStoreError::IoError(e.to_string()))?;
        }

        let persisted = PersistedAssignments {
            assignments: self.assignments.clone(),
        };
        let json = serde_json::to_string_pretty(&persisted)
            .map_err(|e| VariantStoreError::SerializeError(e.to_string()))?;

        std::fs::write(&self.path, json).map_err(|e| VariantStoreError::IoError(e.to_string()))
    }
}

impl VariantStore for FileVariantStore {
    fn get(&self, test: &str) -> Result<Option<String>, VariantStoreError> {
        Ok(self.assignments.get(test).cloned())
    }

    fn set(&mut self, test: &str, variant: &str) -> Result<(), VariantStoreError> {
        self.assignments
            .insert(test.to_string(), variant.to_string());
        self.persist()
    }
}

/// In-memory variant store for tests and ephemeral hosts.
#[derive(Debug, Default)]
pub struct MemoryVariantStore {
    assignments: HashMap<String, String>,
}

impl MemoryVariantStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl VariantStore for MemoryVariantStore {
    fn get(&self, test: &str) -> Result<Option<String>, VariantStoreError> {
        Ok(self.assignments.get(test).cloned())
    }

    fn set(&mut self, test: &str, variant: &str) -> Result<(), VariantStoreError> {
        self.assignments
            .insert(test.to_string(), variant.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryVariantStore::new();
        assert_eq!(store.get("hero_copy").unwrap(), None);

        store.set("hero_copy", "b").unwrap();
        assert_eq!(store.get("hero_copy").unwrap(), Some("b".to_string()));

        store.set("hero_copy", "a").unwrap();
        assert_eq!(store.get("hero_copy").unwrap(), Some("a".to_string()));
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("variants.json");

        {
            let mut store = FileVariantStore::open(path.clone()).unwrap();
            store.set("cta_color", "green").unwrap();
        }

        let store = FileVariantStore::open(path).unwrap();
        assert_eq!(store.get("cta_color").unwrap(), Some("green".to_string()));
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("variants.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            FileVariantStore::open(path),
            Err(VariantStoreError::ParseError(_))
        ));
    }
}
