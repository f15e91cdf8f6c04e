//! Version comparison.
//!
//! Compares the snapshots behind two versions of one document and produces a
//! structured, deterministic [`Comparison`]: ordered line-item changes,
//! per-item price movements and the change of the document total.
//!
//! ## Entry point
//!
//! ```ignore
//! use plandiff_core::diff::{compare, DiffOptions};
//!
//! let comparison = compare(&v1, &s1, &v2, &s2, &DiffOptions::default(), Utc::now())?;
//! let summary = plandiff_core::report::summarize(Some(&comparison))?;
//! ```
//!
//! ## Guarantees
//!
//! - **Determinism**: identical inputs produce equal comparisons, and every
//!   comparison survives a JSON round-trip unchanged.
//! - **Stable ordering**: deletions, additions, modifications, then section
//!   and document-field changes.
//! - **Exact money**: amounts and percentages are decimals; a move away from
//!   a zero baseline is reported as `UndefinedIncrease`, never as infinity,
//!   and a ratio past the decimal range as `OutOfRange`.

pub mod engine;
pub mod model;
pub mod percent;

pub use engine::{compare, diff_snapshots};
pub use model::{
    Change, ChangeKind, ChangeSet, ChangeTarget, Comparison, ComparisonClassification,
    DiffOptions, PercentageChange, PriceChange, TotalChange,
};
pub use percent::{percentage_change, total_change};
