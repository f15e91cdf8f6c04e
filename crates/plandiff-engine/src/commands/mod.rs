//! Command and query orchestration.
//!
//! `engine_command` mutates a [`Workspace`](crate::loader::Workspace);
//! `engine_query` only reads through a [`DocumentLoader`](crate::loader::DocumentLoader).

use plandiff_core::errors::ExError;
use plandiff_core_types::RequestContext;

pub mod engine_command;
pub mod engine_query;

/// Attach the operation name (if missing) and the request's correlation ids
pub(crate) fn stamp_error(err: ExError, op: &str, ctx: &RequestContext) -> ExError {
    let err = if err.op().is_none() {
        err.with_op(op)
    } else {
        err
    };
    let err = err.with_request_id(ctx.request_id.clone());
    match &ctx.trace_id {
        Some(trace_id) => err.with_trace_id(trace_id.clone()),
        None => err,
    }
}
