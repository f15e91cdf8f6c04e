//! Core types shared across PlanDiff facilities
//!
//! This crate provides foundational types used by the error facility,
//! the logging facility and the engine layer:
//!
//! - **Correlation types**: RequestId, TraceId, SpanId, RequestContext
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::{RequestContext, RequestId, SpanId, TraceId};
