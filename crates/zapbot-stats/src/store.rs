//! On-disk snapshots: one pretty-printed JSON file per group.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};
use zapbot_core::error::ZapError;

use crate::model::GroupStats;

const SNAPSHOT_EXT: &str = "json";
const TMP_EXT: &str = "tmp";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Directory of group snapshots, `<dir>/<group_id>.json`.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the snapshot directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> Result<(), ZapError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Snapshot path for a group. Ids that could escape the directory are refused.
    pub fn path_for(&self, group_id: &str) -> Result<PathBuf, ZapError> {
        if group_id.is_empty()
            || group_id.contains(['/', '\\'])
            || group_id == "."
            || group_id == ".."
        {
            return Err(ZapError::Stats(format!("invalid group id: {group_id:?}")));
        }
        Ok(self.dir.join(format!("{group_id}.{SNAPSHOT_EXT}")))
    }

    /// Write a full snapshot of one group.
    ///
    /// The file is written under a temporary name and renamed into place, so
    /// concurrent saves of the same group leave the last complete snapshot.
    pub async fn save(&self, group_id: &str, stats: &GroupStats) -> Result<(), ZapError> {
        let path = self.path_for(group_id)?;
        let body = serde_json::to_vec_pretty(stats)?;

        let seq = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp = self
            .dir
            .join(format!(".{group_id}.{}.{seq}.{TMP_EXT}", std::process::id()));

        tokio::fs::write(&tmp, &body).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        debug!("stats: saved {} ({} bytes)", path.display(), body.len());
        Ok(())
    }

    /// Read one group's snapshot.
    pub async fn load(&self, group_id: &str) -> Result<GroupStats, ZapError> {
        let path = self.path_for(group_id)?;
        let body = tokio::fs::read(&path).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Load every snapshot in the directory.
    ///
    /// Unreadable or corrupt files are skipped with a warning; that group
    /// simply starts over on its next message. Temp files left by an
    /// interrupted save are removed.
    pub async fn load_all(&self) -> Result<HashMap<String, GroupStats>, ZapError> {
        let mut groups = HashMap::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if is_stale_tmp(&path) {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => debug!("stats: removed stale {}", path.display()),
                    Err(e) => warn!("stats: cannot remove {}: {e}", path.display()),
                }
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(SNAPSHOT_EXT) {
                continue;
            }
            let Some(group_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if group_id.starts_with('.') {
                continue;
            }

            match self.load(group_id).await {
                Ok(stats) => {
                    groups.insert(group_id.to_string(), stats);
                }
                Err(e) => {
                    warn!("stats: ignoring snapshot {}: {e}", path.display());
                }
            }
        }

        info!(
            "stats: loaded {} group snapshot(s) from {}",
            groups.len(),
            self.dir.display()
        );
        Ok(groups)
    }
}

/// `.<group>.<pid>.<seq>.tmp`, as written by [`SnapshotStore::save`].
fn is_stale_tmp(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'));
    hidden && path.extension().and_then(|e| e.to_str()) == Some(TMP_EXT)
}
