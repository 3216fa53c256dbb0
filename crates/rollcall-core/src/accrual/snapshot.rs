//! Explicit key-value snapshot of an [`AccrualStore`].
//!
//! An alternative to rebuilding state from report text. The report is still
//! published as the human-readable view when this backend is in use.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::store::{AccrualRecord, AccrualStore};
use crate::error::Result;

/// Serializable form of the store, keyed by participant id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualSnapshot {
    /// `YYYY-MM-DD` of the run that wrote this snapshot
    #[serde(default)]
    pub run_date: Option<String>,

    #[serde(default)]
    pub records: BTreeMap<String, AccrualRecord>,
}

impl AccrualStore {
    pub fn snapshot(&self) -> AccrualSnapshot {
        AccrualSnapshot {
            run_date: None,
            records: self
                .records()
                .iter()
                .map(|(id, r)| (id.clone(), *r))
                .collect(),
        }
    }

    pub fn from_snapshot(snapshot: &AccrualSnapshot) -> Self {
        let mut store = Self::new();
        for (id, record) in &snapshot.records {
            store.insert(id.clone(), *record);
        }
        store
    }
}

impl AccrualSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a snapshot file. A missing file is an empty snapshot.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_json(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write atomically: temp file in the same directory, then rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, self.to_json()?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}
