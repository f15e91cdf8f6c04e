//! Compare command

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use plandiff_core::diff::DiffOptions;
use plandiff_core::model::{ExpectedActive, NewVersion};
use plandiff_core::{Version, VersionKind};
use plandiff_core_types::RequestContext;
use plandiff_engine::{
    apply_engine_command, apply_engine_query, EngineCommand, EngineCommandResult, EngineQuery,
    EngineQueryResult, Workspace,
};

use super::read_input;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Markdown,
    Json,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Snapshot file of the baseline version
    #[arg(long)]
    pub old: PathBuf,

    /// Snapshot file of the revised version
    #[arg(long)]
    pub new: PathBuf,

    #[arg(long, default_value = "document")]
    pub document: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
    pub format: OutputFormat,

    /// Report categories that appeared or disappeared
    #[arg(long)]
    pub sections: bool,

    /// Skip customer, terms, tax rate and validity changes
    #[arg(long)]
    pub no_document_fields: bool,
}

fn capture_version(
    workspace: &Workspace,
    ctx: &RequestContext,
    request: NewVersion,
    path: &Path,
) -> Result<Version, Box<dyn std::error::Error>> {
    let input = read_input(path)?;
    let snapshot = match apply_engine_command(
        EngineCommand::CaptureSnapshot {
            document_id: request.document_id.clone(),
            input,
        },
        workspace,
        ctx,
    )? {
        EngineCommandResult::CaptureSnapshot(snapshot) => snapshot,
        other => return Err(format!("unexpected command result: {:?}", other).into()),
    };

    match apply_engine_command(
        EngineCommand::CreateVersion {
            request,
            snapshot_id: snapshot.id().to_string(),
        },
        workspace,
        ctx,
    )? {
        EngineCommandResult::CreateVersion(version) => Ok(version),
        other => Err(format!("unexpected command result: {:?}", other).into()),
    }
}

pub fn execute(args: CompareArgs) -> Result<(), Box<dyn std::error::Error>> {
    let workspace = Workspace::new();
    let ctx = RequestContext::new();

    let baseline = capture_version(
        &workspace,
        &ctx,
        NewVersion::new(&args.document, VersionKind::Major, "Baseline"),
        &args.old,
    )?;
    apply_engine_command(
        EngineCommand::Activate {
            version_id: baseline.id.clone(),
            expected_active: ExpectedActive::NoActive,
        },
        &workspace,
        &ctx,
    )?;
    let revision = capture_version(
        &workspace,
        &ctx,
        NewVersion::new(&args.document, VersionKind::Minor, "Revision").with_parent(&baseline.id),
        &args.new,
    )?;

    let options = DiffOptions {
        include_sections: args.sections,
        include_document_fields: !args.no_document_fields,
    };
    let result = match apply_engine_query(
        EngineQuery::Summarize {
            old_version_id: baseline.id,
            new_version_id: revision.id,
            options,
        },
        &workspace,
        &ctx,
    )? {
        EngineQueryResult::Summarize(result) => result,
        other => return Err(format!("unexpected query result: {:?}", other).into()),
    };

    match args.format {
        OutputFormat::Markdown => print!("{}", result.human_summary),
        OutputFormat::Json => {
            let json = serde_json::json!({
                "summary": result.summary,
                "comparison": result.comparison,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }
    Ok(())
}
