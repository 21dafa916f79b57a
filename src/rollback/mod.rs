// ABOUTME: Rollback snapshot persistence for emergency redeploys.
// ABOUTME: Write-once snapshots, listed newest-first per environment.

mod dir;
mod error;
mod memory;
mod snapshot;
mod store;

pub use dir::DirRollbackStore;
pub use error::{RollbackError, RollbackErrorKind};
pub use memory::MemoryRollbackStore;
pub use snapshot::{RollbackSnapshot, SnapshotMetadata};
pub use store::RollbackStore;
