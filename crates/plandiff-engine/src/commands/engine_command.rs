//! Engine-level command surface.
//!
//! `apply_engine_command` is the single entry point for every write against
//! a [`Workspace`]: capturing snapshots, registering versions and driving
//! their lifecycle.
//!
//! ## Logging Ownership
//!
//! Each command is bracketed here by `log_op_start!` and `log_op_end!` /
//! `log_op_error!`. The core emits only `debug!` events, so callers never
//! see duplicate lifecycle lines.

#![allow(clippy::result_large_err)]

use std::sync::Arc;

use plandiff_core::errors::ExError;
use plandiff_core::model::{ActivationRequest, ExpectedActive, SnapshotInput};
use plandiff_core::ops::ActivationOutcome;
use plandiff_core::{log_op_end, log_op_error, log_op_start};
use plandiff_core::{NewVersion, Snapshot, Version, VersionKind};
use plandiff_core_types::RequestContext;

use crate::commands::stamp_error;
use crate::loader::Workspace;

type Result<T> = std::result::Result<T, ExError>;

/// Mutating commands supported by the engine.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Validate and store an immutable snapshot of a document
    CaptureSnapshot {
        document_id: String,
        input: SnapshotInput,
    },
    /// Register a version bound to a previously captured snapshot
    ///
    /// The context's actor, when present, is recorded as the creator.
    CreateVersion {
        request: NewVersion,
        snapshot_id: String,
    },
    /// Make a draft the document's active version
    ///
    /// The context's actor, when present, is recorded as the approver.
    Activate {
        version_id: String,
        expected_active: ExpectedActive,
    },
    Archive {
        version_id: String,
    },
    /// Turn a draft-kind version into a numbered major or minor version
    Promote {
        version_id: String,
        kind: VersionKind,
    },
    /// Delete a childless draft together with its snapshot
    DeleteVersion {
        version_id: String,
    },
}

/// Results from `apply_engine_command`, one variant per command.
#[derive(Debug, Clone)]
pub enum EngineCommandResult {
    CaptureSnapshot(Arc<Snapshot>),
    CreateVersion(Version),
    Activate(ActivationOutcome),
    Archive(Version),
    Promote(Version),
    DeleteVersion {
        version_id: String,
        snapshot_id: String,
    },
}

impl EngineCommand {
    fn op_name(&self) -> &'static str {
        match self {
            EngineCommand::CaptureSnapshot { .. } => "capture_snapshot",
            EngineCommand::CreateVersion { .. } => "create_version",
            EngineCommand::Activate { .. } => "activate_version",
            EngineCommand::Archive { .. } => "archive_version",
            EngineCommand::Promote { .. } => "promote_version",
            EngineCommand::DeleteVersion { .. } => "delete_version",
        }
    }
}

/// Apply a command to the workspace.
///
/// # Errors
///
/// Whatever the snapshot store or version graph rejects, converted to
/// [`ExError`] and stamped with the operation name and the request's
/// correlation ids.
pub fn apply_engine_command(
    cmd: EngineCommand,
    workspace: &Workspace,
    ctx: &RequestContext,
) -> Result<EngineCommandResult> {
    let op = cmd.op_name();
    log_op_start!(op, request_id = ctx.request_id.as_str());
    let start = std::time::Instant::now();

    let result = (|| -> Result<EngineCommandResult> {
        match cmd {
            EngineCommand::CaptureSnapshot { document_id, input } => {
                let snapshot = workspace.store().create(&document_id, input)?;
                Ok(EngineCommandResult::CaptureSnapshot(snapshot))
            }

            EngineCommand::CreateVersion {
                mut request,
                snapshot_id,
            } => {
                let snapshot = workspace.store().get(&snapshot_id)?;
                if let Some(actor) = &ctx.actor {
                    request.created_by = actor.clone();
                }
                let version = workspace.graph().create_version(request, &snapshot)?;
                Ok(EngineCommandResult::CreateVersion(version))
            }

            EngineCommand::Activate {
                version_id,
                expected_active,
            } => {
                let request = ActivationRequest {
                    approved_by: ctx.actor.clone(),
                    expected_active,
                };
                let outcome = workspace.graph().activate_with(&version_id, request)?;
                Ok(EngineCommandResult::Activate(outcome))
            }

            EngineCommand::Archive { version_id } => {
                let version = workspace.graph().archive(&version_id)?;
                Ok(EngineCommandResult::Archive(version))
            }

            EngineCommand::Promote { version_id, kind } => {
                let version = workspace.graph().promote(&version_id, kind)?;
                Ok(EngineCommandResult::Promote(version))
            }

            EngineCommand::DeleteVersion { version_id } => {
                // a missing snapshot must fail before the graph forgets the version
                let version = workspace.graph().get(&version_id)?;
                workspace.store().get(&version.snapshot_id)?;
                let snapshot_id = workspace.graph().delete_version(&version_id)?;
                workspace.store().remove(&snapshot_id)?;
                Ok(EngineCommandResult::DeleteVersion {
                    version_id,
                    snapshot_id,
                })
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
