pub mod line_item;
pub mod snapshot;
pub mod value;
pub mod version;

pub use line_item::LineItem;
pub use snapshot::{CustomerInfo, Snapshot, SnapshotInput, SnapshotMetadata, Terms, Totals};
pub use value::FieldValue;
pub use version::{
    ActivationRequest, ExpectedActive, NewVersion, Version, VersionKind, VersionNumber,
    VersionStatus,
};
