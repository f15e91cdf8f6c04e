//! PlanDiff Core - versioned estimate and financial-plan comparison
//!
//! This crate provides the in-memory kernel of PlanDiff:
//! - Immutable snapshots of estimate / plan documents with content digests
//! - A version graph with numbering, lifecycle and the one-active-version rule
//! - A deterministic diff engine producing ordered changes and price movements
//! - A comparison reporter with Markdown rendering
//! - The error and logging facilities shared with the engine layer

pub mod collaborators;
pub mod diff;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod report;
pub mod rules;

pub use plandiff_core_types as core_types;

// Re-export commonly used types
pub use collaborators::{Clock, IdGenerator, SystemClock, UuidV7Ids};
pub use diff::{compare, Comparison, DiffOptions};
pub use errors::{ExError, ExErrorKind, PlanError, Result};
pub use model::{LineItem, NewVersion, Snapshot, SnapshotInput, Version, VersionKind, VersionStatus};
pub use ops::{SnapshotStore, VersionGraph};
pub use report::{render_human_summary, summarize, ComparisonSummary};
