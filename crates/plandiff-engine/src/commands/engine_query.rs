//! Engine-level read-only query surface.
//!
//! `apply_engine_query` is the single entry point for queries. It reads only
//! through a [`DocumentLoader`] and never mutates anything, so it works the
//! same against the in-memory workspace and against a persistent backend.
//!
//! ## Logging Ownership
//!
//! Each query is bracketed here by `log_op_start!` and `log_op_end!` /
//! `log_op_error!`.

#![allow(clippy::result_large_err)]

use std::collections::HashSet;

use chrono::Utc;
use plandiff_core::diff::{self, Comparison, DiffOptions};
use plandiff_core::errors::{ExError, ExErrorKind};
use plandiff_core::report::{render_human_summary, summarize, ComparisonSummary};
use plandiff_core::{log_op_end, log_op_error, log_op_start};
use plandiff_core::{Version, VersionStatus};
use plandiff_core_types::RequestContext;

use crate::commands::stamp_error;
use crate::loader::{surface_load_error, DocumentLoader};

type Result<T> = std::result::Result<T, ExError>;

/// Structured summary plus its Markdown rendering.
#[derive(Debug, Clone)]
pub struct SummaryResult {
    pub comparison: Comparison,
    pub summary: ComparisonSummary,
    /// Human-readable Markdown summary
    pub human_summary: String,
}

/// Read-only queries supported by the engine.
#[derive(Debug, Clone)]
pub enum EngineQuery {
    /// Compare two versions of one document (old side first).
    Compare {
        old_version_id: String,
        new_version_id: String,
        options: DiffOptions,
    },
    /// Compare, then summarize and render the result.
    Summarize {
        old_version_id: String,
        new_version_id: String,
        options: DiffOptions,
    },
    /// Versions of a document, newest first.
    History { document_id: String },
    /// The document's active version, if any.
    ActiveVersion { document_id: String },
    /// Root-first ancestor chain ending with the version itself.
    Lineage { version_id: String },
}

/// All possible results from `apply_engine_query`.
#[derive(Debug, Clone)]
pub enum EngineQueryResult {
    Compare(Box<Comparison>),
    Summarize(Box<SummaryResult>),
    History(Vec<Version>),
    ActiveVersion(Option<Version>),
    Lineage(Vec<Version>),
}

impl EngineQuery {
    fn op_name(&self) -> &'static str {
        match self {
            EngineQuery::Compare { .. } => "compare",
            EngineQuery::Summarize { .. } => "summarize",
            EngineQuery::History { .. } => "history",
            EngineQuery::ActiveVersion { .. } => "active_version",
            EngineQuery::Lineage { .. } => "lineage",
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_version(loader: &dyn DocumentLoader, op: &str, version_id: &str) -> Result<Version> {
    loader
        .load_version(version_id)
        .map_err(|e| surface_load_error(op, e))
}

fn compare_versions(
    loader: &dyn DocumentLoader,
    op: &str,
    old_version_id: &str,
    new_version_id: &str,
    options: &DiffOptions,
) -> Result<Comparison> {
    let old_version = load_version(loader, op, old_version_id)?;
    let new_version = load_version(loader, op, new_version_id)?;
    let old_snapshot = loader
        .load_snapshot(&old_version.snapshot_id)
        .map_err(|e| surface_load_error(op, e))?;
    let new_snapshot = loader
        .load_snapshot(&new_version.snapshot_id)
        .map_err(|e| surface_load_error(op, e))?;

    diff::compare(
        &old_version,
        &old_snapshot,
        &new_version,
        &new_snapshot,
        options,
        Utc::now(),
    )
}

fn lineage(loader: &dyn DocumentLoader, op: &str, version_id: &str) -> Result<Vec<Version>> {
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    let mut current = Some(version_id.to_string());

    while let Some(id) = current {
        if !visited.insert(id.clone()) {
            return Err(ExError::new(ExErrorKind::Internal)
                .with_version_id(id)
                .with_message("cycle in parent chain"));
        }
        let version = load_version(loader, op, &id)?;
        current = version.parent_id.clone();
        chain.push(version);
    }

    chain.reverse();
    Ok(chain)
}

fn active_version(
    loader: &dyn DocumentLoader,
    op: &str,
    document_id: &str,
) -> Result<Option<Version>> {
    let mut active: Vec<Version> = loader
        .load_document_versions(document_id)
        .map_err(|e| surface_load_error(op, e))?
        .into_iter()
        .filter(|v| v.status == VersionStatus::Active)
        .collect();

    if active.len() > 1 {
        return Err(ExError::new(ExErrorKind::Internal)
            .with_document_id(document_id)
            .with_message(format!("{} versions are active", active.len())));
    }
    Ok(active.pop())
}

// ---------------------------------------------------------------------------
// apply_engine_query
// ---------------------------------------------------------------------------

/// Run a read-only query.
///
/// # Errors
///
/// - `NotFound` for unknown version ids
/// - `Mismatch` when comparing versions of different documents
/// - `Persistence` when the loader fails for any other reason (the loader's
///   error is kept as the source)
/// - `Internal` for a corrupted graph (parent cycle, several active versions)
///
/// All errors carry the operation name and the request's correlation ids.
pub fn apply_engine_query(
    query: EngineQuery,
    loader: &dyn DocumentLoader,
    ctx: &RequestContext,
) -> Result<EngineQueryResult> {
    let op = query.op_name();
    log_op_start!(op, request_id = ctx.request_id.as_str());
    let start = std::time::Instant::now();

    let result = (|| -> Result<EngineQueryResult> {
        match query {
            EngineQuery::Compare {
                old_version_id,
                new_version_id,
                options,
            } => {
                let comparison =
                    compare_versions(loader, op, &old_version_id, &new_version_id, &options)?;
                Ok(EngineQueryResult::Compare(Box::new(comparison)))
            }

            EngineQuery::Summarize {
                old_version_id,
                new_version_id,
                options,
            } => {
                let comparison =
                    compare_versions(loader, op, &old_version_id, &new_version_id, &options)?;
                let summary = summarize(Some(&comparison))?;
                let human_summary = render_human_summary(&summary);
                Ok(EngineQueryResult::Summarize(Box::new(SummaryResult {
                    comparison,
                    summary,
                    human_summary,
                })))
            }

            EngineQuery::History { document_id } => {
                let mut versions = loader
                    .load_document_versions(&document_id)
                    .map_err(|e| surface_load_error(op, e))?;
                versions.reverse();
                Ok(EngineQueryResult::History(versions))
            }

            EngineQuery::ActiveVersion { document_id } => Ok(EngineQueryResult::ActiveVersion(
                active_version(loader, op, &document_id)?,
            )),

            EngineQuery::Lineage { version_id } => {
                Ok(EngineQueryResult::Lineage(lineage(loader, op, &version_id)?))
            }
        }
    })()
    .map_err(|e| stamp_error(e, op, ctx));

    let elapsed = start.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => log_op_end!(
            op,
            duration_ms = elapsed,
            request_id = ctx.request_id.as_str()
        ),
        Err(e) => {
            let e_clone = e.clone();
            log_op_error!(
                op,
                e_clone,
                duration_ms = elapsed,
                request_id = ctx.request_id.as_str()
            );
        }
    }
    result
}
