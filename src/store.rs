use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::TARGET_STORE;

/// One persisted result of a full generation cycle. Immutable after creation;
/// appended to the store and never updated or deleted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InsightRecord {
    pub timestamp: String,
    pub article: String,
    pub insight: String,
    pub research: String,
    pub why_matters: String,
    pub tags: Vec<String>,
    pub sentiment: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access the insight store")]
    Io(#[from] std::io::Error),
    #[error("insight store is not a valid JSON array of records")]
    Parse(#[from] serde_json::Error),
}

/// Append-only persistence of insight records as one pretty-printed JSON array
/// in a single file. The whole array is rewritten on every append; not safe
/// for concurrent writers.
pub struct InsightStore {
    path: PathBuf,
}

impl InsightStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns every stored record, oldest first. A missing file is an empty
    /// store, not an error.
    pub fn load_all(&self) -> Result<Vec<InsightRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn append(&self, record: &InsightRecord) -> Result<(), StoreError> {
        let mut records = self.load_all()?;
        records.push(record.clone());
        fs::write(&self.path, serde_json::to_vec_pretty(&records)?)?;
        debug!(
            target: TARGET_STORE,
            path = %self.path.display(),
            total = records.len(),
            "appended insight record"
        );
        Ok(())
    }
}
