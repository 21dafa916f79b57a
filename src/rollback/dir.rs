// ABOUTME: Directory-backed rollback store with one JSON file per snapshot.
// ABOUTME: Uses temp file plus hard link so concurrent appends never clobber each other.

use std::path::PathBuf;

use async_trait::async_trait;
use snafu::ResultExt;

use crate::types::EnvironmentName;

use super::error::{AlreadyExistsSnafu, IoSnafu, MalformedSnafu};
use super::{RollbackError, RollbackSnapshot, RollbackStore};

const SNAPSHOT_EXT: &str = "json";

/// Stores snapshots under `<root>/<environment>/<nanos>-<deployment_id>.json`.
///
/// `list` skips files that do not parse as a snapshot and logs them.
#[derive(Debug, Clone)]
pub struct DirRollbackStore {
    root: PathBuf,
}

impl DirRollbackStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn env_dir(&self, environment: &EnvironmentName) -> PathBuf {
        self.root.join(environment.as_str())
    }

    fn file_name(snapshot: &RollbackSnapshot) -> String {
        let nanos = snapshot
            .timestamp
            .timestamp_nanos_opt()
            .unwrap_or_else(|| snapshot.timestamp.timestamp_micros().saturating_mul(1000));
        format!("{nanos:020}-{}.{SNAPSHOT_EXT}", snapshot.deployment_id)
    }
}

#[async_trait]
impl RollbackStore for DirRollbackStore {
    async fn append(&self, snapshot: &RollbackSnapshot) -> Result<(), RollbackError> {
        let dir = self.env_dir(&snapshot.environment);
        tokio::fs::create_dir_all(&dir)
            .await
            .context(IoSnafu { path: dir.clone() })?;

        let body = serde_json::to_vec_pretty(snapshot).context(MalformedSnafu {
            path: dir.clone(),
        })?;

        let final_path = dir.join(Self::file_name(snapshot));
        let tmp_path = dir.join(format!(".{}.tmp", uuid::Uuid::new_v4()));

        tokio::fs::write(&tmp_path, &body)
            .await
            .context(IoSnafu {
                path: tmp_path.clone(),
            })?;

        // hard_link fails if the target exists, giving create-if-absent semantics.
        let linked = tokio::fs::hard_link(&tmp_path, &final_path).await;
        let _ = tokio::fs::remove_file(&tmp_path).await;

        match linked {
            Ok(()) => {
                tracing::debug!("wrote rollback snapshot {}", final_path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                AlreadyExistsSnafu { path: final_path }.fail()
            }
            Err(source) => Err(RollbackError::Io {
                path: final_path,
                source,
            }),
        }
    }

    async fn list(
        &self,
        environment: &EnvironmentName,
    ) -> Result<Vec<RollbackSnapshot>, RollbackError> {
        let dir = self.env_dir(environment);

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(RollbackError::Io { path: dir, source }),
        };

        let mut found = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .context(IoSnafu { path: dir.clone() })?
        {
            let path = entry.path();
            let is_snapshot = path.extension().is_some_and(|ext| ext == SNAPSHOT_EXT)
                && !entry.file_name().to_string_lossy().starts_with('.');
            if !is_snapshot {
                continue;
            }

            let content = tokio::fs::read(&path)
                .await
                .context(IoSnafu { path: path.clone() })?;
            // Unparsable snapshots are skipped, not fatal.
            match serde_json::from_slice::<RollbackSnapshot>(&content)
                .context(MalformedSnafu { path: path.clone() })
            {
                Ok(snapshot) => found.push((path, snapshot)),
                Err(e) => tracing::warn!("skipping {}", e),
            }
        }

        found.sort_by(|(pa, a), (pb, b)| b.timestamp.cmp(&a.timestamp).then_with(|| pb.cmp(pa)));
        Ok(found.into_iter().map(|(_, s)| s).collect())
    }
}
