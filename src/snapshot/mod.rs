//! Persistence of a [`Tree`](crate::filesystem::Tree) between runs.

mod snapshot;
mod store;

pub use snapshot::{Snapshot, SnapshotError};
pub use store::{LoadOutcome, SnapshotStore};
