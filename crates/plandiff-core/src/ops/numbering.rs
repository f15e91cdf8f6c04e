//! Version number assignment
//!
//! Numbers are derived from the highest final (non-draft) numbers already
//! present in the document, so they keep increasing even when versions are
//! created from older parents:
//!
//! | kind  | result                                                  |
//! |-------|---------------------------------------------------------|
//! | first | `1.0`                                                   |
//! | major | `(max major) + 1 . 0`                                   |
//! | minor | parent's major, `(max minor under that major) + 1`      |
//! | draft | parent's number with the draft marker (`1.0-draft` root) |
//!
//! A root version requested as minor in a document that already has final
//! versions is numbered like a major; it has no parent to hang a minor off.

use crate::model::{Version, VersionKind, VersionNumber};

/// Compute the number for a new version
///
/// `existing` are the document's versions (the new one excluded).
pub fn next_version_number(
    existing: &[&Version],
    parent: Option<&Version>,
    kind: VersionKind,
) -> VersionNumber {
    let finals: Vec<VersionNumber> = existing
        .iter()
        .map(|v| v.number)
        .filter(|n| !n.draft)
        .collect();

    match (kind, parent) {
        (VersionKind::Draft, Some(parent)) => parent.number.as_draft(),
        (VersionKind::Draft, None) => VersionNumber::INITIAL.as_draft(),
        _ if finals.is_empty() => VersionNumber::INITIAL,
        (VersionKind::Major, _) | (VersionKind::Minor, None) => {
            let max_major = finals.iter().map(|n| n.major).max().unwrap_or(0);
            VersionNumber::new(max_major + 1, 0)
        }
        (VersionKind::Minor, Some(parent)) => {
            let major = parent.number.major;
            let minor = finals
                .iter()
                .filter(|n| n.major == major)
                .map(|n| n.minor + 1)
                .max()
                .unwrap_or(0);
            VersionNumber::new(major, minor)
        }
    }
}
