// src/config/validate.rs

use std::time::Duration;

use crate::artifacts::scan::build_globset;
use crate::config::duration::parse_duration;
use crate::config::model::{
    ArgTemplate, ArgvSection, ArgvTemplate, JobConfig, RawJobConfig, ToolTemplates,
};
use crate::dispatch::{DispatchPlan, Encoding, FilterKind};
use crate::errors::{Result, ToolrunError};

impl TryFrom<RawJobConfig> for JobConfig {
    type Error = ToolrunError;

    fn try_from(raw: RawJobConfig) -> std::result::Result<Self, Self::Error> {
        let job = raw.job;

        if job.namespace.trim().is_empty() {
            return Err(ToolrunError::config("[job].namespace must not be empty"));
        }

        let timeout = match job.timeout.as_deref() {
            Some(s) => Some(positive_duration("[job].timeout", s)?),
            None => None,
        };
        let poll_interval = positive_duration("[job].poll_interval", &job.poll_interval)?;
        let progress_interval = positive_duration("[job].progress_interval", &job.progress_interval)?;

        build_globset(&job.flatten)?;
        build_globset(&job.exclude)?;

        let encodings = job
            .encodings
            .iter()
            .map(|token| token.parse::<Encoding>().map_err(ToolrunError::Configuration))
            .collect::<Result<Vec<_>>>()?;

        let tool = ToolTemplates {
            plain: non_empty_argv(raw.tool.argv, raw.tool.stdout),
            artifacts: raw.tool.artifacts.and_then(section_template),
            files: raw.tool.files.and_then(section_template),
        };

        let config = JobConfig {
            name: job.name,
            namespace: job.namespace,
            timeout,
            poll_interval,
            progress_interval,
            mapping_file: job.mapping_file.filter(|m| !m.trim().is_empty()),
            flatten: job.flatten,
            exclude: job.exclude,
            task_log: job.task_log,
            log_stream: job.log_stream,
            progress: job.progress,
            encodings,
            filters: raw.filters.to_filter_set(),
            filters_required: raw.filters.required,
            tool,
        };

        validate_templates(&config)?;
        Ok(config)
    }
}

impl JobConfig {
    /// The invocations this job expands to for each input.
    pub fn dispatch_plan(&self) -> Result<DispatchPlan> {
        DispatchPlan::build(&self.filters, self.filters_required, &self.encodings)
    }

    /// Template for an invocation of the given filter kind (`None` for a
    /// plain invocation), falling back to `[tool].argv`.
    pub fn template_for(&self, kind: Option<FilterKind>) -> Option<&ArgvTemplate> {
        let specific = match kind {
            Some(FilterKind::Artifacts) => self.tool.artifacts.as_ref(),
            Some(FilterKind::Files) => self.tool.files.as_ref(),
            None => None,
        };
        specific.or(self.tool.plain.as_ref())
    }
}

fn positive_duration(field: &str, value: &str) -> Result<Duration> {
    let parsed = parse_duration(value).map_err(|e| ToolrunError::config(format!("{}: {}", field, e)))?;
    if parsed.is_zero() {
        return Err(ToolrunError::config(format!("{} must be greater than zero", field)));
    }
    Ok(parsed)
}

fn non_empty_argv(argv: Vec<ArgTemplate>, stdout: Option<String>) -> Option<ArgvTemplate> {
    if argv.is_empty() {
        None
    } else {
        Some(ArgvTemplate { argv, stdout })
    }
}

fn section_template(section: ArgvSection) -> Option<ArgvTemplate> {
    non_empty_argv(section.argv, section.stdout)
}

fn validate_templates(cfg: &JobConfig) -> Result<()> {
    let plan = cfg.dispatch_plan()?;

    for variant in plan.variants() {
        let kind = variant.filter.as_ref().map(|f| f.kind());
        if cfg.template_for(kind).is_none() {
            return Err(match kind {
                Some(kind) => ToolrunError::config(format!(
                    "{} filters are configured but neither [tool.{}].argv nor [tool].argv is set",
                    kind, kind
                )),
                None => ToolrunError::config("[tool].argv must not be empty"),
            });
        }
    }
    Ok(())
}
