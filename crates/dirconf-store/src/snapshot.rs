use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::entry::Entry;
use crate::error::{StoreError, StoreResult};
use crate::memory::{InMemoryDirectory, MemoryDirectoryConfig};

/// Current on-disk snapshot format.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// A point-in-time image of an [`InMemoryDirectory`], stored as pretty JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub format_version: u32,
    pub saved_at: DateTime<Utc>,
    pub config: MemoryDirectoryConfig,
    /// Entries in DN order, so parents precede children.
    pub entries: Vec<Entry>,
}

impl InMemoryDirectory {
    /// Capture the current contents.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            saved_at: Utc::now(),
            config: self.config(),
            entries: self.entries(),
        }
    }

    /// Rebuild a directory from a snapshot.
    ///
    /// Every non-suffix entry must have its parent in the snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> StoreResult<Self> {
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(StoreError::Serialization(format!(
                "unsupported snapshot format version {}",
                snapshot.format_version
            )));
        }
        let mut map = BTreeMap::new();
        for entry in snapshot.entries {
            if map.insert(entry.dn.clone(), entry.clone()).is_some() {
                return Err(StoreError::AlreadyExists(entry.dn));
            }
        }
        for dn in map.keys() {
            if snapshot.config.suffixes.contains(dn) {
                continue;
            }
            match dn.parent() {
                Some(parent) if map.contains_key(&parent) => {}
                Some(parent) => return Err(StoreError::NoSuchObject(parent)),
                None => return Err(StoreError::NoSuchObject(dn.clone())),
            }
        }
        Ok(Self::from_parts(snapshot.config, map))
    }

    /// Write a snapshot to `path`, replacing any existing file.
    ///
    /// The data is written to a sibling temporary file first and then
    /// renamed into place.
    pub fn save_to(&self, path: &Path) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let snapshot = self.snapshot();
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        info!(
            path = %path.display(),
            entries = snapshot.entries.len(),
            "directory snapshot saved"
        );
        Ok(())
    }

    /// Load a directory previously written by [`save_to`](Self::save_to).
    pub fn load_from(path: &Path) -> StoreResult<Self> {
        let data = fs::read_to_string(path)?;
        let snapshot: Snapshot =
            serde_json::from_str(&data).map_err(|e| StoreError::Serialization(e.to_string()))?;
        debug!(
            path = %path.display(),
            saved_at = %snapshot.saved_at,
            entries = snapshot.entries.len(),
            "loading directory snapshot"
        );
        Self::from_snapshot(snapshot)
    }
}
