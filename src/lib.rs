// src/lib.rs

pub mod artifacts;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod normalize;
pub mod progress;
pub mod types;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::artifacts::DirectoryRegistry;
use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::JobConfig;
use crate::config::template::TemplateCommand;
use crate::engine::{CancelFlag, CommandBuilder, Engine, Invocation, LoggingContext};
use crate::exec::TokioProcessBackend;
use crate::types::InputArtifact;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - job loading and validation
/// - input parsing
/// - the engine with the real process backend and a directory registry
/// - Ctrl-C handling (sets the cancellation flag)
pub async fn run(args: CliArgs) -> Result<()> {
    let job = load_and_validate(&args.job)?;
    let inputs = parse_inputs(&args.inputs);
    let builder = TemplateCommand::from_config(&job);

    if args.dry_run {
        print_dry_run(&job, &builder, &inputs)?;
        return Ok(());
    }

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating output directory {:?}", args.output_dir))?;

    let workflow_id = args
        .workflow_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            cancel.cancel();
        });
    }
    let ctx = LoggingContext::new(job.name.clone(), cancel);

    let engine = Engine::new(
        TokioProcessBackend::new(),
        DirectoryRegistry::new(&args.output_dir),
    );

    info!(job = %job.name, inputs = inputs.len(), workflow = %workflow_id, "starting task");

    match engine.execute(&ctx, &job, &builder, &inputs, &workflow_id).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(failure) => {
            if !failure.completed.is_empty() || !failure.completed_task_files.is_empty() {
                warn!(
                    completed = failure.completed.len(),
                    task_files = failure.completed_task_files.len(),
                    output_dir = %args.output_dir.display(),
                    "outputs of completed invocations were kept"
                );
            }
            Err(failure.into())
        }
    }
}

/// Parse `PATH[=ID]` values. Without an explicit id the 1-based position is
/// used.
pub fn parse_inputs(raw: &[String]) -> Vec<InputArtifact> {
    raw.iter()
        .enumerate()
        .map(|(idx, value)| match value.rsplit_once('=') {
            Some((path, id)) if !path.is_empty() && !id.is_empty() => {
                InputArtifact::from_path(id, path)
            }
            _ => InputArtifact::from_path((idx + 1).to_string(), value.as_str()),
        })
        .collect()
}

/// Simple dry-run output: print the planned commands per input.
fn print_dry_run(job: &JobConfig, builder: &dyn CommandBuilder, inputs: &[InputArtifact]) -> Result<()> {
    let plan = job.dispatch_plan()?;
    let export_dir = Path::new("<export_dir>");

    println!("toolrun dry-run");
    println!("  job.name = {}", job.name);
    println!("  job.namespace = {}", job.namespace);
    if let Some(timeout) = job.timeout {
        println!("  job.timeout = {:?}", timeout);
    }
    println!("  invocations per input = {}", plan.len());
    println!();

    println!("inputs ({}):", inputs.len());
    for input in inputs {
        println!("  - {} ({})", input.display_name, input.id);
        for variant in plan.variants() {
            let spec = builder.build(&Invocation {
                input,
                variant,
                export_dir,
            })?;
            println!("      cmd: {}", spec.command_line());
            if let Some(stdout) = spec.stdout_file() {
                println!("      stdout: {}", stdout.display());
            }
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inputs_with_and_without_ids() {
        let inputs = parse_inputs(&["/data/a.dd=7".to_string(), "/data/b.dd".to_string()]);
        assert_eq!(inputs[0].id, "7");
        assert_eq!(inputs[0].display_name, "a.dd");
        assert_eq!(inputs[1].id, "2");
        assert_eq!(inputs[1].path, Path::new("/data/b.dd"));
    }
}
