// src/config/template.rs

//! Renders `[tool]` argv templates into concrete commands.
//!
//! Placeholders look like `{name}`:
//!
//! - `{input}`, `{input_name}`, `{input_id}`: the input file;
//! - `{export_dir}`: the scoped produce directory;
//! - `{encoding}` / `{encoding_name}`: the encoding code (`s`, `l`, ...) and token;
//! - `{artifacts}`, `{names}`, `{extensions}`, `{signatures}`: comma-joined filters.
//!
//! A plain argument that only rendered placeholders and came out empty is
//! dropped. A group (nested array) is dropped as a whole when any
//! placeholder inside it is empty. Unknown placeholders stay as written.

use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use regex::{Captures, Regex};

use crate::config::model::{ArgTemplate, ArgvTemplate, JobConfig};
use crate::engine::{CommandBuilder, Invocation};
use crate::errors::{Result, ToolrunError};
use crate::exec::ExecutionSpec;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("Invalid placeholder regex"));

/// Builds commands from the templates of a validated `JobConfig`.
#[derive(Debug, Clone)]
pub struct TemplateCommand {
    job: JobConfig,
}

impl TemplateCommand {
    pub fn from_config(job: &JobConfig) -> Self {
        Self { job: job.clone() }
    }

    fn timeout(&self) -> Option<Duration> {
        self.job.timeout
    }
}

impl CommandBuilder for TemplateCommand {
    fn build(&self, invocation: &Invocation<'_>) -> Result<ExecutionSpec> {
        let kind = invocation.variant.filter.as_ref().map(|f| f.kind());
        let template = self.job.template_for(kind).ok_or_else(|| {
            ToolrunError::config(format!("no command template for job '{}'", self.job.name))
        })?;

        let argv = render_argv(template, invocation);
        if argv.is_empty() {
            return Err(ToolrunError::config(format!(
                "command template for job '{}' rendered an empty argv",
                self.job.name
            )));
        }

        let mut spec = ExecutionSpec::new(argv, invocation.export_dir).with_timeout(self.timeout());
        if let Some(stdout) = stdout_path(template, invocation) {
            spec = spec.with_stdout_file(stdout);
        }
        Ok(spec)
    }
}

/// Value of a known placeholder, `None` for unknown names.
fn lookup(key: &str, inv: &Invocation<'_>) -> Option<String> {
    let value = match key {
        "input" => inv.input.path.display().to_string(),
        "input_name" => inv.input.display_name.clone(),
        "input_id" => inv.input.id.clone(),
        "export_dir" => inv.export_dir.display().to_string(),
        "encoding" => inv.variant.encoding.map(|e| e.code().to_string()).unwrap_or_default(),
        "encoding_name" => inv.variant.encoding.map(|e| e.name().to_string()).unwrap_or_default(),
        "artifacts" | "names" | "extensions" | "signatures" => inv
            .variant
            .filter
            .as_ref()
            .map(|f| f.placeholder(key))
            .unwrap_or_default(),
        _ => return None,
    };
    Some(value)
}

/// Render one string. The flag is true when a known placeholder was empty.
fn render(text: &str, inv: &Invocation<'_>) -> (String, bool) {
    let mut saw_empty = false;
    let rendered = PLACEHOLDER.replace_all(text, |caps: &Captures<'_>| match lookup(&caps[1], inv) {
        Some(value) => {
            if value.is_empty() {
                saw_empty = true;
            }
            value
        }
        None => caps[0].to_string(),
    });
    (rendered.into_owned(), saw_empty)
}

pub fn render_argv(template: &ArgvTemplate, inv: &Invocation<'_>) -> Vec<String> {
    let mut argv = Vec::with_capacity(template.argv.len());
    for element in &template.argv {
        match element {
            ArgTemplate::Arg(text) => {
                let (rendered, saw_empty) = render(text, inv);
                if saw_empty && rendered.is_empty() {
                    continue;
                }
                argv.push(rendered);
            }
            ArgTemplate::Group(items) => {
                let rendered: Vec<(String, bool)> = items.iter().map(|t| render(t, inv)).collect();
                if rendered.iter().any(|(_, empty)| *empty) {
                    continue;
                }
                argv.extend(rendered.into_iter().map(|(s, _)| s));
            }
        }
    }
    argv
}

/// Stdout redirect target: only the file name of the rendered template is
/// kept, always inside the produce directory.
fn stdout_path(template: &ArgvTemplate, inv: &Invocation<'_>) -> Option<std::path::PathBuf> {
    let raw = template.stdout.as_deref()?;
    let (rendered, _) = render(raw, inv);
    let name = Path::new(&rendered).file_name()?;
    Some(inv.export_dir.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::parse_and_validate;
    use crate::dispatch::{Encoding, Filter, Variant};
    use crate::types::InputArtifact;

    const IMAGE_EXPORT: &str = r#"
        [job]
        name = "image_export"
        namespace = "extraction:image_export"

        [tool.artifacts]
        argv = ["image_export.py", ["--artifact_filters", "{artifacts}"], "-w", "{export_dir}", "{input}"]

        [tool.files]
        argv = ["image_export.py", ["--names", "{names}"], ["--extensions", "{extensions}"], "-w", "{export_dir}", "{input}"]

        [filters]
        required = true
        artifacts = "BrowserHistory,WindowsRunKeys"
        extensions = ["exe", "dll"]
    "#;

    fn input() -> InputArtifact {
        InputArtifact::new("42", "disk.E01", "/data/disk.E01")
    }

    fn build(job: &JobConfig, variant: &Variant) -> ExecutionSpec {
        let input = input();
        TemplateCommand::from_config(job)
            .build(&Invocation {
                input: &input,
                variant,
                export_dir: Path::new("/tmp/export"),
            })
            .unwrap()
    }

    #[test]
    fn artifact_invocation_keeps_its_group() {
        let job = parse_and_validate(IMAGE_EXPORT).unwrap();
        let plan = job.dispatch_plan().unwrap();
        let spec = build(&job, &plan.variants()[0]);

        assert_eq!(
            spec.argv,
            vec![
                "image_export.py",
                "--artifact_filters",
                "BrowserHistory,WindowsRunKeys",
                "-w",
                "/tmp/export",
                "/data/disk.E01"
            ]
        );
        assert_eq!(spec.working_dir, Path::new("/tmp/export"));
    }

    #[test]
    fn empty_filter_group_is_dropped() {
        let job = parse_and_validate(IMAGE_EXPORT).unwrap();
        let plan = job.dispatch_plan().unwrap();
        let spec = build(&job, &plan.variants()[1]);

        assert_eq!(
            spec.argv,
            vec!["image_export.py", "--extensions", "exe,dll", "-w", "/tmp/export", "/data/disk.E01"]
        );
    }

    #[test]
    fn encoding_and_stdout_redirect() {
        let job = parse_and_validate(
            r#"
            [job]
            name = "strings"
            timeout = "10m"
            encodings = ["UTF16LE"]

            [tool]
            argv = ["strings", "-a", "-t", "d", "-e", "{encoding}", "{input}"]
            stdout = "../{input_id}_{encoding_name}.txt"
            "#,
        )
        .unwrap();
        let variant = Variant {
            filter: None,
            encoding: Some(Encoding::Utf16Le),
        };
        let spec = build(&job, &variant);

        assert_eq!(spec.argv, vec!["strings", "-a", "-t", "d", "-e", "l", "/data/disk.E01"]);
        assert_eq!(spec.stdout_file(), Some(Path::new("/tmp/export/42_UTF16LE.txt")));
        assert_eq!(spec.timeout, Some(Duration::from_secs(600)));
    }

    #[test]
    fn unknown_placeholder_is_kept_and_empty_arg_dropped() {
        let job = parse_and_validate(
            r#"
            [tool]
            argv = ["tool", "{unknown}", "{encoding}", "{input_name}"]
            "#,
        )
        .unwrap();
        let spec = build(&job, &Variant::default());
        assert_eq!(spec.argv, vec!["tool", "{unknown}", "disk.E01"]);
    }

    #[test]
    fn plain_template_is_the_fallback_for_filter_kinds() {
        let job = parse_and_validate(
            r#"
            [tool]
            argv = ["extract", ["--filter", "{names}"], "{input}"]

            [filters]
            names = "*.txt,*.log"
            "#,
        )
        .unwrap();
        let variant = Variant {
            filter: Some(Filter::Files {
                names: vec!["*.txt".into(), "*.log".into()],
                extensions: vec![],
                signatures: vec![],
            }),
            encoding: None,
        };
        let spec = build(&job, &variant);
        assert_eq!(spec.argv, vec!["extract", "--filter", "*.txt,*.log", "/data/disk.E01"]);
    }
}
