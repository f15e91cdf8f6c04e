use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// How far a new version moves the version number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionKind {
    /// Bumps the major counter and resets minor (`1.3` -> `2.0`)
    Major,
    /// Bumps the minor counter (`1.3` -> `1.4`)
    Minor,
    /// Keeps the parent's number with a draft marker until promoted
    Draft,
}

impl fmt::Display for VersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VersionKind::Major => "major",
            VersionKind::Minor => "minor",
            VersionKind::Draft => "draft",
        })
    }
}

/// Lifecycle status of a version
///
/// ```text
/// draft ──> active ──> superseded
///   │          │
///   └──────────┴─────> archived
/// ```
/// `superseded` and `archived` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    Draft,
    Active,
    Superseded,
    Archived,
}

impl VersionStatus {
    /// Whether the lifecycle allows moving from `self` to `to`
    pub fn can_transition_to(self, to: VersionStatus) -> bool {
        matches!(
            (self, to),
            (VersionStatus::Draft, VersionStatus::Active)
                | (VersionStatus::Draft, VersionStatus::Archived)
                | (VersionStatus::Active, VersionStatus::Superseded)
                | (VersionStatus::Active, VersionStatus::Archived)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, VersionStatus::Superseded | VersionStatus::Archived)
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VersionStatus::Draft => "draft",
            VersionStatus::Active => "active",
            VersionStatus::Superseded => "superseded",
            VersionStatus::Archived => "archived",
        })
    }
}

/// `major.minor` with an optional draft marker (`1.2-draft`)
///
/// Ordered by major, then minor; a draft sorts before the final number it shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionNumber {
    pub major: u32,
    pub minor: u32,
    pub draft: bool,
}

impl VersionNumber {
    pub const INITIAL: VersionNumber = VersionNumber {
        major: 1,
        minor: 0,
        draft: false,
    };

    pub fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            draft: false,
        }
    }

    /// Same numbers, marked as draft
    pub fn as_draft(self) -> Self {
        Self {
            draft: true,
            ..self
        }
    }
}

impl Ord for VersionNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            // draft (true) sorts before final (false)
            .then(other.draft.cmp(&self.draft))
    }
}

impl PartialOrd for VersionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if self.draft {
            f.write_str("-draft")?;
        }
        Ok(())
    }
}

impl FromStr for VersionNumber {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (base, draft) = match s.strip_suffix("-draft") {
            Some(base) => (base, true),
            None => (s, false),
        };
        let (major, minor) = base
            .split_once('.')
            .ok_or_else(|| format!("version number must look like 1.0, got {:?}", s))?;
        let major = major
            .parse::<u32>()
            .map_err(|e| format!("invalid major in {:?}: {}", s, e))?;
        let minor = minor
            .parse::<u32>()
            .map_err(|e| format!("invalid minor in {:?}: {}", s, e))?;
        Ok(Self {
            major,
            minor,
            draft,
        })
    }
}

impl TryFrom<String> for VersionNumber {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionNumber> for String {
    fn from(value: VersionNumber) -> Self {
        value.to_string()
    }
}

/// A numbered, lifecycle-tracked wrapper around one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub id: String,
    pub document_id: String,
    pub number: VersionNumber,
    pub kind: VersionKind,
    pub status: VersionStatus,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Version this one was derived from (None for roots)
    pub parent_id: Option<String>,

    /// Versions derived from this one, in creation order
    pub child_ids: Vec<String>,

    /// Snapshot wrapped by this version
    pub snapshot_id: String,

    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_log: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Time of the last status change (creation time for fresh drafts)
    pub status_changed_at: DateTime<Utc>,
}

impl Version {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_active(&self) -> bool {
        self.status == VersionStatus::Active
    }

    pub(crate) fn add_child_id(&mut self, child_id: String) {
        if !self.child_ids.contains(&child_id) {
            self.child_ids.push(child_id);
        }
    }

    pub(crate) fn remove_child_id(&mut self, child_id: &str) {
        self.child_ids.retain(|id| id != child_id);
    }
}

/// Request to register a new version in the graph
#[derive(Debug, Clone, PartialEq)]
pub struct NewVersion {
    pub document_id: String,
    pub parent_id: Option<String>,
    pub kind: VersionKind,
    pub title: String,
    pub created_by: String,
    pub description: Option<String>,
    pub change_log: Option<String>,
    pub tags: Vec<String>,
}

impl NewVersion {
    pub fn new(
        document_id: impl Into<String>,
        kind: VersionKind,
        title: impl Into<String>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            parent_id: None,
            kind,
            title: title.into(),
            created_by: String::from("system"),
            description: None,
            change_log: None,
            tags: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn created_by(mut self, user: impl Into<String>) -> Self {
        self.created_by = user.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_change_log(mut self, change_log: impl Into<String>) -> Self {
        self.change_log = Some(change_log.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// What the caller believes is currently active, for optimistic activation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExpectedActive {
    /// Serialize behind any concurrent activation
    #[default]
    Unchecked,
    /// Fail unless the document has no active version
    NoActive,
    /// Fail unless this version is the active one
    Version(String),
}

/// Options for [`crate::ops::VersionGraph::activate_with`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationRequest {
    /// Recorded as the approver together with the activation time
    pub approved_by: Option<String>,
    pub expected_active: ExpectedActive,
}
