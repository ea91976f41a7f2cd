// src/engine/runner.rs

//! One engine invocation, end to end.
//!
//! For every input and every planned variant, serially:
//!
//! 1. create a scoped export directory,
//! 2. build and spawn the command,
//! 3. supervise it while forwarding progress samples,
//! 4. normalize its log stream,
//! 5. scan, flatten, classify and register what it produced.
//!
//! The export directory is removed when the invocation ends, whichever way
//! it ends.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::artifacts::{
    collate, ArtifactClassifier, ArtifactScanner, OutputCollator, OutputRegistry, ProducedFile,
};
use crate::artifacts::scan::build_globset;
use crate::config::model::{JobConfig, LogStream, ProgressKind};
use crate::dispatch::Variant;
use crate::engine::command::{CommandBuilder, Invocation};
use crate::engine::context::ExecutionContext;
use crate::errors::{EngineFailure, Result, ToolrunError};
use crate::exec::{ExecutionSpec, ExitReport, ProcessBackend, ProcessDriver};
use crate::fs::RealFileSystem;
use crate::normalize::log::render_records;
use crate::normalize::{LogNormalizer, LogRecord, LogSink, RecordFlattener, TracingSink};
use crate::progress::{ByteSize, LineCount, MetricSource, ProgressMonitor};
use crate::types::{DataType, InputArtifact, OutputArtifact, ProgressEvent, TaskResult};

/// What one finished invocation contributes to the task result.
#[derive(Debug, Clone)]
pub struct InvocationOutput {
    pub command: String,
    pub outputs: Vec<OutputArtifact>,
    pub task_file: Option<OutputArtifact>,
    pub log: Vec<LogRecord>,
}

#[derive(Debug, Clone)]
pub struct Engine<B, R> {
    backend: B,
    registry: R,
    normalizer: LogNormalizer,
    temp_root: Option<PathBuf>,
}

impl<B: ProcessBackend, R: OutputRegistry> Engine<B, R> {
    pub fn new(backend: B, registry: R) -> Self {
        Self {
            backend,
            registry,
            normalizer: LogNormalizer::new(),
            temp_root: None,
        }
    }

    /// Create export directories under `root` instead of the system temp
    /// directory.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    pub fn with_normalizer(mut self, normalizer: LogNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Run `job` over `inputs` and collate everything produced.
    ///
    /// Configuration problems are reported before any process starts. No
    /// inputs is a successful, empty result. On a fatal error the failure
    /// carries the outputs of the invocations that had already completed.
    pub async fn execute(
        &self,
        ctx: &dyn ExecutionContext,
        job: &JobConfig,
        builder: &dyn CommandBuilder,
        inputs: &[InputArtifact],
        workflow_id: &str,
    ) -> std::result::Result<TaskResult, EngineFailure> {
        let plan = job.dispatch_plan()?;

        if inputs.is_empty() {
            info!(job = %job.name, "no input files; nothing to do");
            return Ok(collate(Vec::new(), "", workflow_id));
        }

        let driver = ProcessDriver::new(&self.backend, job.poll_interval);
        let mut collator = OutputCollator::new();

        for input in inputs {
            for variant in plan.variants() {
                match self.run_invocation(&driver, ctx, job, builder, input, variant).await {
                    Ok(done) => {
                        collator.add_command(done.command);
                        collator.add_outputs(done.outputs);
                        if let Some(task_file) = done.task_file {
                            collator.add_task_file(task_file);
                        }
                    }
                    Err(error) => {
                        warn!(job = %job.name, input = %input.id, error = %error, "invocation failed; aborting task");
                        let (completed, completed_task_files) = collator.into_parts();
                        return Err(EngineFailure {
                            error,
                            completed,
                            completed_task_files,
                        });
                    }
                }
            }
        }

        let result = collator.finish(workflow_id);
        info!(
            job = %job.name,
            outputs = result.output_files.len(),
            task_files = result.task_files.len(),
            "task finished"
        );
        Ok(result)
    }

    /// Run a single invocation inside its own export directory.
    pub async fn run_invocation(
        &self,
        driver: &ProcessDriver<&B>,
        ctx: &dyn ExecutionContext,
        job: &JobConfig,
        builder: &dyn CommandBuilder,
        input: &InputArtifact,
        variant: &Variant,
    ) -> Result<InvocationOutput> {
        if ctx.cancel_requested() {
            return Err(ToolrunError::Cancelled);
        }

        let export_dir = self.export_dir()?;
        let mut spec = builder.build(&Invocation {
            input,
            variant,
            export_dir: export_dir.path(),
        })?;
        if spec.timeout.is_none() {
            spec.timeout = job.timeout;
        }

        let report = self.supervise(driver, ctx, job, &spec).await?;

        let log = self.normalize_log(job, &report);
        let report = report.check()?;

        let outputs = self.collect_outputs(job, input, export_dir.path())?;
        let task_file = if job.task_log {
            Some(self.register_task_log(job, input, &log)?)
        } else {
            None
        };

        if let Err(e) = export_dir.close() {
            warn!(error = %e, "failed to remove export directory");
        }

        Ok(InvocationOutput {
            command: report.command,
            outputs,
            task_file,
            log,
        })
    }

    fn export_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("toolrun-");
        let dir = match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .context("creating export directory")?;
        debug!(path = %dir.path().display(), "export directory created");
        Ok(dir)
    }

    async fn supervise(
        &self,
        driver: &ProcessDriver<&B>,
        ctx: &dyn ExecutionContext,
        job: &JobConfig,
        spec: &ExecutionSpec,
    ) -> Result<ExitReport> {
        let source = progress_source(job.progress, spec);
        let handle = driver.run(spec)?;

        let Some(source) = source else {
            return driver.wait(handle, ctx).await;
        };

        let (monitor, mut events) = ProgressMonitor::start(source, job.progress_interval);
        let outcome = driver
            .wait_with(handle, ctx, || forward_progress(&mut events, ctx))
            .await;

        match outcome {
            Ok(report) => {
                monitor.stop().await;
                forward_progress(&mut events, ctx);
                Ok(report)
            }
            Err(e) => {
                monitor.abort();
                Err(e)
            }
        }
    }

    fn normalize_log(&self, job: &JobConfig, report: &ExitReport) -> Vec<LogRecord> {
        let raw = match job.log_stream {
            LogStream::Stderr => &report.output.stderr,
            LogStream::Stdout => &report.output.stdout,
            LogStream::None => return Vec::new(),
        };
        let text = String::from_utf8_lossy(raw);
        let records = self.normalizer.normalize(&text);

        let mut sink = TracingSink::new(job.name.clone());
        for record in &records {
            sink.log(record);
        }
        records
    }

    fn collect_outputs(
        &self,
        job: &JobConfig,
        input: &InputArtifact,
        export_dir: &Path,
    ) -> Result<Vec<OutputArtifact>> {
        let fs = RealFileSystem;

        let mut scanner = ArtifactScanner::new().with_exclude_patterns(&job.exclude)?;
        if let Some(mapping) = &job.mapping_file {
            scanner = scanner.skip_file_name(mapping.clone());
        }
        let produced = scanner.scan(&fs, export_dir)?;

        self.flatten_outputs(job, &produced)?;

        let classifier = match &job.mapping_file {
            Some(mapping) => ArtifactClassifier::load(&fs, job.namespace.clone(), &export_dir.join(mapping)),
            None => ArtifactClassifier::fallback_only(job.namespace.clone()),
        };

        let mut outputs = Vec::with_capacity(produced.len());
        for file in &produced {
            let data_type = classifier.data_type(&file.relative_path);
            outputs.push(self.registry.register_output(
                &file.path,
                &file.display_name,
                data_type,
                &input.id,
            )?);
        }

        debug!(input = %input.id, outputs = outputs.len(), "outputs registered");
        Ok(outputs)
    }

    fn flatten_outputs(&self, job: &JobConfig, produced: &[ProducedFile]) -> Result<()> {
        if job.flatten.is_empty() {
            return Ok(());
        }
        let targets = build_globset(&job.flatten)?;
        let flattener = RecordFlattener::new(job.name.clone());

        for file in produced.iter().filter(|f| targets.is_match(&f.relative_path)) {
            if let Some(report) = flattener.flatten(&file.path)? {
                if report.skipped_lines > 0 {
                    warn!(
                        path = %file.relative_path,
                        skipped = report.skipped_lines,
                        "some output lines could not be parsed"
                    );
                }
            }
        }
        Ok(())
    }

    fn register_task_log(
        &self,
        job: &JobConfig,
        input: &InputArtifact,
        log: &[LogRecord],
    ) -> Result<OutputArtifact> {
        let display_name = format!("{}_{}.log", job.name, input.display_name);
        self.registry.register_task_file(
            render_records(log).as_bytes(),
            &display_name,
            DataType::Single(format!("{}:log", job.namespace)),
            &input.id,
        )
    }
}

fn progress_source(kind: ProgressKind, spec: &ExecutionSpec) -> Option<Arc<dyn MetricSource>> {
    let path = spec.stdout_file()?;
    match kind {
        ProgressKind::Lines => Some(Arc::new(LineCount::new(path))),
        ProgressKind::Bytes => Some(Arc::new(ByteSize::new(path))),
        ProgressKind::None => None,
    }
}

fn forward_progress(events: &mut mpsc::UnboundedReceiver<ProgressEvent>, ctx: &dyn ExecutionContext) {
    while let Ok(event) = events.try_recv() {
        ctx.emit_progress(event.count, event.rate);
    }
}
