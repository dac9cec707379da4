use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use compio::BufResult;
use compio::fs;
use derive_more::IsVariant;
use snafu::ResultExt;
use tracing::{debug, info, warn};

use crate::filesystem::Tree;
use crate::snapshot::Snapshot;
use crate::snapshot::snapshot::{CreateDirSnafu, ReadSnafu, SnapshotError, WriteSnafu};

/// Result of [`SnapshotStore::load`].
#[derive(Debug, IsVariant)]
pub enum LoadOutcome {
    /// The tree was rebuilt from an existing snapshot.
    Restored(Tree),
    /// No usable snapshot; the tree is a fresh empty root.
    Fresh(Tree),
}

impl LoadOutcome {
    pub fn into_tree(self) -> Tree {
        match self {
            LoadOutcome::Restored(tree) | LoadOutcome::Fresh(tree) => tree,
        }
    }
}

/// Reads and writes the snapshot file of a single tree.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
    compression_level: i32,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>, compression_level: i32) -> Self {
        Self {
            path: path.into(),
            compression_level,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Restores the saved tree, or starts fresh if there is nothing usable.
    pub async fn load(&self) -> LoadOutcome {
        debug!("Reading snapshot from {}", self.path.display());
        match self.read().await {
            Ok(tree) => {
                info!("Restored {} nodes from {}", tree.len(), self.path.display());
                LoadOutcome::Restored(tree)
            }
            Err(SnapshotError::ReadError { source, .. }) if source.kind() == ErrorKind::NotFound => {
                info!("No existing snapshot found, starting fresh");
                LoadOutcome::Fresh(Tree::new())
            }
            Err(e) => {
                warn!("Ignoring unusable snapshot {}: {}", self.path.display(), e);
                LoadOutcome::Fresh(Tree::new())
            }
        }
    }

    /// Writes `tree` to the snapshot file, creating its directory if needed.
    pub async fn save(&self, tree: &Tree) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .context(CreateDirSnafu { path: parent })?;
            }
        }

        let bytes = Snapshot::capture(tree).to_bytes(self.compression_level)?;
        let size = bytes.len();
        let BufResult(result, _) = fs::write(&self.path, bytes).await;
        result.context(WriteSnafu { path: &self.path })?;

        info!("Saved {} bytes to {}", size, self.path.display());
        Ok(())
    }

    async fn read(&self) -> Result<Tree, SnapshotError> {
        let bytes = fs::read(&self.path)
            .await
            .context(ReadSnafu { path: &self.path })?;
        Snapshot::from_bytes(&bytes)?.restore()
    }
}
