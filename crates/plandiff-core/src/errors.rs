use plandiff_core_types::{RequestId, TraceId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::model::{VersionKind, VersionStatus};

/// Result type alias using PlanError
pub type Result<T> = std::result::Result<T, PlanError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every error leaving the core or the engine is classified into one of these
/// kinds. Each kind maps to a stable code suitable for API responses and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    /// Malformed snapshot or version input (negative amounts, duplicate ids, blank title)
    Validation,
    /// Unknown version or snapshot id
    NotFound,
    /// Versions or snapshots that belong to different documents
    Mismatch,
    /// Illegal lifecycle transition
    InvalidState,
    /// Lost an activation race or a snapshot is already bound
    Conflict,
    /// Caller passed an absent or nonsensical argument
    InvalidArgument,

    // Integration
    Persistence,
    Serialization,
    Concurrency,

    // Internal
    /// A computed comparison did not survive its serialization round-trip
    DeterminismViolation,
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Validation => "ERR_VALIDATION",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Mismatch => "ERR_MISMATCH",
            ExErrorKind::InvalidState => "ERR_INVALID_STATE",
            ExErrorKind::Conflict => "ERR_CONFLICT",
            ExErrorKind::InvalidArgument => "ERR_INVALID_ARGUMENT",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::DeterminismViolation => "ERR_DETERMINISM_VIOLATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a stable classification plus whatever context the failing
/// operation could attach (document, version, line item, correlation ids).
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    document_id: Option<String>,
    version_id: Option<String>,
    item_id: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            document_id: None,
            version_id: None,
            item_id: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add document ID context
    pub fn with_document_id(mut self, id: impl Into<String>) -> Self {
        self.document_id = Some(id.into());
        self
    }

    /// Add version ID context
    pub fn with_version_id(mut self, id: impl Into<String>) -> Self {
        self.version_id = Some(id.into());
        self
    }

    /// Add line item ID context
    pub fn with_item_id(mut self, id: impl Into<String>) -> Self {
        self.item_id = Some(id.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add trace ID context
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the document ID context, if any
    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    /// Get the version ID context, if any
    pub fn version_id(&self) -> Option<&str> {
        self.version_id.as_deref()
    }

    /// Get the line item ID context, if any
    pub fn item_id(&self) -> Option<&str> {
        self.item_id.as_deref()
    }

    /// Get the request ID context, if any
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Get the trace ID context, if any
    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(document_id) = &self.document_id {
            write!(f, " (document_id: {})", document_id)?;
        }
        if let Some(version_id) = &self.version_id {
            write!(f, " (version_id: {})", version_id)?;
        }
        if let Some(item_id) = &self.item_id {
            write!(f, " (item_id: {})", item_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy raised by the snapshot store and version graph
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    // ===== Snapshot validation =====
    /// Snapshot was submitted without an owning document
    #[error("Document id cannot be empty")]
    EmptyDocumentId,

    /// A line item has an empty identifier
    #[error("Line item at position {position} has an empty identifier")]
    EmptyItemId { position: usize },

    /// Two line items share an identifier
    #[error("Duplicate line item identifier: {item_id}")]
    DuplicateItemId { item_id: String },

    #[error("Line item {item_id} has negative quantity {quantity}")]
    NegativeQuantity { item_id: String, quantity: Decimal },

    #[error("Line item {item_id} has negative unit price {unit_price}")]
    NegativeUnitPrice { item_id: String, unit_price: Decimal },

    #[error("Line item {item_id} has negative cost price {cost_price}")]
    NegativeCostPrice { item_id: String, cost_price: Decimal },

    #[error("Tax rate cannot be negative: {tax_rate}")]
    NegativeTaxRate { tax_rate: Decimal },

    /// Explicit subtotal, tax or total below zero
    #[error("Document {field} cannot be negative: {amount}")]
    NegativeTotal { field: String, amount: Decimal },

    /// A line total (`item_id` set) or a document total does not fit in a `Decimal`
    #[error("Amount out of range")]
    AmountOverflow { item_id: Option<String> },

    // ===== Version validation =====
    /// Invalid title (empty or whitespace-only)
    #[error("Invalid title: {reason}")]
    InvalidTitle { reason: String },

    // ===== Lookup =====
    #[error("Snapshot not found: {snapshot_id}")]
    SnapshotNotFound { snapshot_id: String },

    #[error("Version not found: {version_id}")]
    VersionNotFound { version_id: String },

    // ===== Cross-document references =====
    /// Parent version belongs to another document
    #[error("Parent {parent_id} belongs to document {parent_document_id}, not {document_id}")]
    ParentDocumentMismatch {
        parent_id: String,
        parent_document_id: String,
        document_id: String,
    },

    /// Snapshot was captured for another document
    #[error("Snapshot {snapshot_id} belongs to document {snapshot_document_id}, not {document_id}")]
    SnapshotDocumentMismatch {
        snapshot_id: String,
        snapshot_document_id: String,
        document_id: String,
    },

    /// Snapshot is already wrapped by another version
    #[error("Snapshot {snapshot_id} is already bound to version {version_id}")]
    SnapshotAlreadyBound {
        snapshot_id: String,
        version_id: String,
    },

    // ===== Lifecycle =====
    #[error("Version {version_id} cannot move from {from} to {to}")]
    IllegalTransition {
        version_id: String,
        from: VersionStatus,
        to: VersionStatus,
    },

    /// Only draft-kind versions in draft status can be promoted
    #[error("Version {version_id} ({kind}, {status}) is not a promotable draft")]
    NotPromotable {
        version_id: String,
        kind: VersionKind,
        status: VersionStatus,
    },

    /// Promotion target must be major or minor
    #[error("Version {version_id} cannot be promoted to a draft")]
    InvalidPromotionTarget { version_id: String },

    /// Only childless draft versions can be deleted
    #[error("Cannot delete version {version_id}: has {child_count} children")]
    DeleteWithChildren {
        version_id: String,
        child_count: usize,
    },

    /// Only draft-status versions can be deleted
    #[error("Cannot delete version {version_id} in status {status}")]
    NotDeletable {
        version_id: String,
        status: VersionStatus,
    },

    // ===== Concurrency =====
    /// Optimistic activation lost against another activation
    #[error("Active version of document {document_id} is {actual:?}, expected {expected:?}")]
    ActiveVersionMismatch {
        document_id: String,
        expected: Option<String>,
        actual: Option<String>,
    },

    #[error("Lock poisoned: {resource}")]
    LockPoisoned { resource: String },

    // ===== Graph integrity =====
    /// Internal bookkeeping of the version graph is inconsistent
    #[error("Version graph invariant violated: {message}")]
    InvariantViolation { message: String },

    #[error("Serialization failed: {message}")]
    Serialization { message: String },
}

impl From<PlanError> for ExError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::EmptyDocumentId => ExError::new(ExErrorKind::Validation)
                .with_message("Document id cannot be empty"),

            PlanError::EmptyItemId { position } => ExError::new(ExErrorKind::Validation)
                .with_message(format!(
                    "Line item at position {} has an empty identifier",
                    position
                )),

            PlanError::DuplicateItemId { item_id } => ExError::new(ExErrorKind::Validation)
                .with_item_id(item_id)
                .with_message("Duplicate line item identifier"),

            PlanError::NegativeQuantity { item_id, quantity } => {
                ExError::new(ExErrorKind::Validation)
                    .with_item_id(item_id)
                    .with_message(format!("Quantity cannot be negative: {}", quantity))
            }

            PlanError::NegativeUnitPrice {
                item_id,
                unit_price,
            } => ExError::new(ExErrorKind::Validation)
                .with_item_id(item_id)
                .with_message(format!("Unit price cannot be negative: {}", unit_price)),

            PlanError::NegativeCostPrice {
                item_id,
                cost_price,
            } => ExError::new(ExErrorKind::Validation)
                .with_item_id(item_id)
                .with_message(format!("Cost price cannot be negative: {}", cost_price)),

            PlanError::NegativeTaxRate { tax_rate } => ExError::new(ExErrorKind::Validation)
                .with_message(format!("Tax rate cannot be negative: {}", tax_rate)),

            PlanError::NegativeTotal { field, amount } => ExError::new(ExErrorKind::Validation)
                .with_message(format!("Document {} cannot be negative: {}", field, amount)),

            PlanError::AmountOverflow { item_id } => {
                let err = ExError::new(ExErrorKind::Validation)
                    .with_message("Amount exceeds the supported decimal range");
                match item_id {
                    Some(item_id) => err.with_item_id(item_id),
                    None => err,
                }
            }

            PlanError::InvalidTitle { reason } => {
                ExError::new(ExErrorKind::Validation).with_message(reason)
            }

            PlanError::SnapshotNotFound { snapshot_id } => ExError::new(ExErrorKind::NotFound)
                .with_message(format!("Snapshot not found: {}", snapshot_id)),

            PlanError::VersionNotFound { version_id } => ExError::new(ExErrorKind::NotFound)
                .with_version_id(version_id)
                .with_message("Version not found"),

            PlanError::ParentDocumentMismatch {
                parent_id,
                parent_document_id,
                document_id,
            } => ExError::new(ExErrorKind::Mismatch)
                .with_document_id(document_id)
                .with_version_id(parent_id)
                .with_message(format!(
                    "Parent version belongs to document {}",
                    parent_document_id
                )),

            PlanError::SnapshotDocumentMismatch {
                snapshot_id,
                snapshot_document_id,
                document_id,
            } => ExError::new(ExErrorKind::Mismatch)
                .with_document_id(document_id)
                .with_message(format!(
                    "Snapshot {} belongs to document {}",
                    snapshot_id, snapshot_document_id
                )),

            PlanError::SnapshotAlreadyBound {
                snapshot_id,
                version_id,
            } => ExError::new(ExErrorKind::Conflict)
                .with_version_id(version_id)
                .with_message(format!("Snapshot {} is already bound", snapshot_id)),

            PlanError::IllegalTransition {
                version_id,
                from,
                to,
            } => ExError::new(ExErrorKind::InvalidState)
                .with_version_id(version_id)
                .with_message(format!("Cannot move from {} to {}", from, to)),

            PlanError::NotPromotable {
                version_id,
                kind,
                status,
            } => ExError::new(ExErrorKind::InvalidState)
                .with_version_id(version_id)
                .with_message(format!(
                    "Only draft versions can be promoted (kind {}, status {})",
                    kind, status
                )),

            PlanError::InvalidPromotionTarget { version_id } => {
                ExError::new(ExErrorKind::InvalidArgument)
                    .with_version_id(version_id)
                    .with_message("Promotion target must be major or minor")
            }

            PlanError::DeleteWithChildren {
                version_id,
                child_count,
            } => ExError::new(ExErrorKind::InvalidState)
                .with_version_id(version_id)
                .with_message(format!("Version has {} children", child_count)),

            PlanError::NotDeletable { version_id, status } => {
                ExError::new(ExErrorKind::InvalidState)
                    .with_version_id(version_id)
                    .with_message(format!("Only drafts can be deleted (status {})", status))
            }

            PlanError::ActiveVersionMismatch {
                document_id,
                expected,
                actual,
            } => ExError::new(ExErrorKind::Conflict)
                .with_document_id(document_id)
                .with_message(format!(
                    "Active version changed concurrently (expected {:?}, found {:?})",
                    expected, actual
                )),

            PlanError::LockPoisoned { resource } => ExError::new(ExErrorKind::Concurrency)
                .with_message(format!("Lock poisoned: {}", resource)),

            PlanError::InvariantViolation { message } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }

            PlanError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to PlanError
impl From<serde_json::Error> for PlanError {
    fn from(err: serde_json::Error) -> Self {
        PlanError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes() {
        let cases = [
            (ExErrorKind::Validation, "ERR_VALIDATION"),
            (ExErrorKind::NotFound, "ERR_NOT_FOUND"),
            (ExErrorKind::Mismatch, "ERR_MISMATCH"),
            (ExErrorKind::InvalidState, "ERR_INVALID_STATE"),
            (ExErrorKind::Conflict, "ERR_CONFLICT"),
            (ExErrorKind::InvalidArgument, "ERR_INVALID_ARGUMENT"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_display_includes_context() {
        let err = ExError::new(ExErrorKind::NotFound)
            .with_op("load_version")
            .with_version_id("v-9")
            .with_message("Version not found");
        let text = err.to_string();
        assert!(text.starts_with("[ERR_NOT_FOUND] in operation 'load_version'"));
        assert!(text.contains("(version_id: v-9)"));
    }

    #[test]
    fn test_source_chain_is_exposed() {
        let inner = ExError::new(ExErrorKind::Persistence).with_message("disk gone");
        let outer = ExError::new(ExErrorKind::Persistence)
            .with_op("load_snapshot")
            .with_source(inner);
        let source = std::error::Error::source(&outer).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("[ERR_PERSISTENCE]: disk gone"));
    }

    #[test]
    fn test_illegal_transition_maps_to_invalid_state() {
        let err: ExError = PlanError::IllegalTransition {
            version_id: "v1".to_string(),
            from: VersionStatus::Archived,
            to: VersionStatus::Active,
        }
        .into();
        assert_eq!(err.kind(), ExErrorKind::InvalidState);
        assert_eq!(err.version_id(), Some("v1"));
    }

    #[test]
    fn test_amount_overflow_maps_to_validation() {
        let err: ExError = PlanError::AmountOverflow {
            item_id: Some("beam".to_string()),
        }
        .into();
        assert_eq!(err.kind(), ExErrorKind::Validation);
        assert_eq!(err.item_id(), Some("beam"));

        let err: ExError = PlanError::AmountOverflow { item_id: None }.into();
        assert_eq!(err.item_id(), None);
    }

    #[test]
    fn test_activation_race_maps_to_conflict() {
        let err: ExError = PlanError::ActiveVersionMismatch {
            document_id: "doc".to_string(),
            expected: None,
            actual: Some("v2".to_string()),
        }
        .into();
        assert_eq!(err.kind(), ExErrorKind::Conflict);
        assert_eq!(err.document_id(), Some("doc"));
    }
}
