pub mod numbering;
pub mod snapshot_store;
pub mod version_graph;

pub use numbering::next_version_number;
pub use snapshot_store::SnapshotStore;
pub use version_graph::{ActivationOutcome, VersionGraph};
