use crate::{domain::Card, error::Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Mirrored copy of the card list on disk.
///
/// Best effort only: it is consulted when the initial list fetch fails and
/// is never treated as authoritative.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_parent_exists(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Overwrites the snapshot with `cards`
    pub async fn save(&self, cards: &[Card]) -> Result<()> {
        self.ensure_parent_exists().await?;
        let json = serde_json::to_string_pretty(cards)?;
        fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Loads the snapshot; a missing file is an empty list
    pub async fn load(&self) -> Result<Vec<Card>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Removes the snapshot file, if any
    pub async fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).await?;
        }
        Ok(())
    }
}
