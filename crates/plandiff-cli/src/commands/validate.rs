//! Validate command

use std::path::PathBuf;

use clap::Args;
use plandiff_core_types::RequestContext;
use plandiff_engine::{apply_engine_command, EngineCommand, EngineCommandResult, Workspace};

use super::read_input;

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Snapshot file to check
    pub file: PathBuf,

    #[arg(long, default_value = "document")]
    pub document: String,
}

pub fn execute(args: ValidateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let input = read_input(&args.file)?;
    let workspace = Workspace::new();

    let snapshot = match apply_engine_command(
        EngineCommand::CaptureSnapshot {
            document_id: args.document,
            input,
        },
        &workspace,
        &RequestContext::new(),
    )? {
        EngineCommandResult::CaptureSnapshot(snapshot) => snapshot,
        other => return Err(format!("unexpected command result: {:?}", other).into()),
    };

    println!(
        "OK {} ({} items, total {})",
        snapshot.digest(),
        snapshot.items().len(),
        snapshot.totals().total.normalize()
    );
    Ok(())
}
