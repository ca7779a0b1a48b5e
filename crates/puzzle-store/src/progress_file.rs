//! Attempt history kept in a single JSON document: `{"entries": [...]}`.

use std::fs;
use std::path::{Path, PathBuf};

use chess_puzzler::{AttemptOutcome, ProgressStore, StoreError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProgressFile {
    #[serde(default)]
    entries: Vec<AttemptOutcome>,
}

pub struct JsonProgressStore {
    path: PathBuf,
    file: ProgressFile,
}

impl JsonProgressStore {
    /// Load the history at `path`, creating an empty file when missing.
    /// An unreadable or malformed file is an error, never silently reset.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let store = Self {
                path,
                file: ProgressFile::default(),
            };
            store.write_atomic()?;
            info!("Created progress file at {}", store.path.display());
            return Ok(store);
        }

        let raw = fs::read_to_string(&path)?;
        let file: ProgressFile = if raw.trim().is_empty() {
            ProgressFile::default()
        } else {
            serde_json::from_str(&raw)?
        };
        info!(
            entries = file.entries.len(),
            "Loaded progress from {}",
            path.display()
        );
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.file.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file.entries.is_empty()
    }

    /// Write to a sibling temp file and rename over the target, so readers
    /// see either the old document or the new one.
    fn write_atomic(&self) -> Result<(), StoreError> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let json = serde_json::to_string_pretty(&self.file)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ProgressStore for JsonProgressStore {
    fn append_outcome(&mut self, outcome: &AttemptOutcome) -> Result<(), StoreError> {
        self.file.entries.push(outcome.clone());
        if let Err(e) = self.write_atomic() {
            self.file.entries.pop();
            return Err(e);
        }
        debug!(entries = self.file.entries.len(), "Progress saved");
        Ok(())
    }

    fn all_outcomes(&self) -> Result<Vec<AttemptOutcome>, StoreError> {
        Ok(self.file.entries.clone())
    }
}
