//! PlanDiff Engine - orchestration layer
//!
//! Routes commands and queries from callers (the CLI, integration tests)
//! through the in-memory kernel in `plandiff-core`, owns the lifecycle
//! logging of every operation and stamps request correlation ids onto
//! returned errors.

pub mod commands;
pub mod loader;

pub use commands::engine_command::{apply_engine_command, EngineCommand, EngineCommandResult};
pub use commands::engine_query::{apply_engine_query, EngineQuery, EngineQueryResult};
pub use loader::{DocumentLoader, Workspace};
