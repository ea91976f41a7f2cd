#![allow(dead_code)]

use toolrun::config::model::{
    ArgTemplate, ArgvSection, FilterSection, JobSection, LogStream, ProgressKind, RawJobConfig,
    StringList, ToolSection,
};
use toolrun::config::JobConfig;
use toolrun::errors::Result;
use toolrun::types::InputArtifact;

/// Builder for `JobConfig` to simplify test setup.
///
/// Starts from the file defaults, except that the poll interval is 10ms so
/// tests do not wait on the driver.
pub struct JobConfigBuilder {
    raw: RawJobConfig,
}

impl JobConfigBuilder {
    /// A job whose plain `[tool].argv` is `argv`.
    pub fn new(argv: &[&str]) -> Self {
        let job = JobSection {
            poll_interval: "10ms".to_string(),
            ..JobSection::default()
        };
        Self {
            raw: RawJobConfig {
                job,
                tool: ToolSection {
                    argv: args(argv),
                    ..ToolSection::default()
                },
                filters: FilterSection::default(),
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.raw.job.name = name.to_string();
        self
    }

    pub fn namespace(mut self, namespace: &str) -> Self {
        self.raw.job.namespace = namespace.to_string();
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.raw.job.timeout = Some(timeout.to_string());
        self
    }

    pub fn poll_interval(mut self, interval: &str) -> Self {
        self.raw.job.poll_interval = interval.to_string();
        self
    }

    pub fn progress(mut self, kind: ProgressKind, interval: &str) -> Self {
        self.raw.job.progress = kind;
        self.raw.job.progress_interval = interval.to_string();
        self
    }

    pub fn mapping_file(mut self, name: &str) -> Self {
        self.raw.job.mapping_file = Some(name.to_string());
        self
    }

    pub fn flatten(mut self, pattern: &str) -> Self {
        self.raw.job.flatten.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.raw.job.exclude.push(pattern.to_string());
        self
    }

    pub fn task_log(mut self, val: bool) -> Self {
        self.raw.job.task_log = val;
        self
    }

    pub fn log_stream(mut self, stream: LogStream) -> Self {
        self.raw.job.log_stream = stream;
        self
    }

    pub fn encoding(mut self, token: &str) -> Self {
        self.raw.job.encodings.push(token.to_string());
        self
    }

    pub fn stdout(mut self, file_name: &str) -> Self {
        self.raw.tool.stdout = Some(file_name.to_string());
        self
    }

    /// Template for artifact-filter invocations.
    pub fn artifacts_template(mut self, argv: Vec<ArgTemplate>) -> Self {
        self.raw.tool.artifacts = Some(ArgvSection { argv, stdout: None });
        self
    }

    /// Template for name/extension/signature invocations.
    pub fn files_template(mut self, argv: Vec<ArgTemplate>) -> Self {
        self.raw.tool.files = Some(ArgvSection { argv, stdout: None });
        self
    }

    pub fn require_filters(mut self, val: bool) -> Self {
        self.raw.filters.required = val;
        self
    }

    pub fn artifacts(mut self, filter: &str) -> Self {
        self.raw.filters.artifacts = StringList::One(filter.to_string());
        self
    }

    pub fn names(mut self, filter: &str) -> Self {
        self.raw.filters.names = StringList::One(filter.to_string());
        self
    }

    pub fn extensions(mut self, filter: &str) -> Self {
        self.raw.filters.extensions = StringList::One(filter.to_string());
        self
    }

    pub fn try_build(self) -> Result<JobConfig> {
        JobConfig::try_from(self.raw)
    }

    pub fn build(self) -> JobConfig {
        self.try_build().expect("Failed to build valid job config from builder")
    }
}

/// Plain argv elements.
pub fn args(argv: &[&str]) -> Vec<ArgTemplate> {
    argv.iter().map(|a| arg(a)).collect()
}

/// One plain argv element.
pub fn arg(a: &str) -> ArgTemplate {
    ArgTemplate::Arg(a.to_string())
}

/// An optional argv group.
pub fn group(items: &[&str]) -> ArgTemplate {
    ArgTemplate::Group(items.iter().map(|a| a.to_string()).collect())
}

/// Inputs `1..=n` named `input<n>.dd` under `/data`.
pub fn inputs(n: usize) -> Vec<InputArtifact> {
    (1..=n)
        .map(|i| InputArtifact::new(i.to_string(), format!("input{i}.dd"), format!("/data/input{i}.dd")))
        .collect()
}
