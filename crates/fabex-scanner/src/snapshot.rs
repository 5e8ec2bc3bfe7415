//! Persisted selection handed to the downstream compile stage.

use crate::Selection;
use chrono::{DateTime, Utc};
use fabex_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Final file list with the root it was resolved under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    pub root: PathBuf,
    pub files: Vec<PathBuf>,
    pub created_at: DateTime<Utc>,
}

impl SelectionSnapshot {
    pub fn new(root: impl Into<PathBuf>, selection: &Selection) -> Self {
        Self {
            root: root.into(),
            files: selection.files.clone(),
            created_at: Utc::now(),
        }
    }

    /// Save the snapshot to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))?;

        std::fs::write(path, data)?;
        info!(
            "Selection snapshot ({} files) saved to {}",
            self.files.len(),
            path.display()
        );
        Ok(())
    }

    /// Load a snapshot from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| Error::missing_input(path, e))?;
        let snapshot: Self =
            bincode::deserialize(&data).map_err(|e| Error::Serialization(e.to_string()))?;

        info!("Selection snapshot loaded from {}", path.display());
        Ok(snapshot)
    }
}
