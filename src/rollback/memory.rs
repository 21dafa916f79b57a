// ABOUTME: In-process rollback store backed by a shared vector.
// ABOUTME: Cloned handles share the same snapshots.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::types::EnvironmentName;

use super::{RollbackError, RollbackSnapshot, RollbackStore};

#[derive(Debug, Clone, Default)]
pub struct MemoryRollbackStore {
    snapshots: Arc<Mutex<Vec<RollbackSnapshot>>>,
}

impl MemoryRollbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total snapshots across all environments.
    pub fn len(&self) -> usize {
        self.snapshots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.lock().is_empty()
    }
}

#[async_trait]
impl RollbackStore for MemoryRollbackStore {
    async fn append(&self, snapshot: &RollbackSnapshot) -> Result<(), RollbackError> {
        self.snapshots.lock().push(snapshot.clone());
        Ok(())
    }

    async fn list(
        &self,
        environment: &EnvironmentName,
    ) -> Result<Vec<RollbackSnapshot>, RollbackError> {
        // Reverse insertion order first so equal timestamps list the later append first.
        let mut matching: Vec<_> = self
            .snapshots
            .lock()
            .iter()
            .rev()
            .filter(|s| &s.environment == environment)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(matching)
    }
}
