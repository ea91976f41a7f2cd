// tests/config_loading.rs

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use toolrun::config::load_and_validate;
use toolrun::config::model::{LogStream, ProgressKind};
use toolrun::dispatch::{Encoding, FilterKind};
use toolrun::errors::ToolrunError;

fn job_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

fn expect_config_error(contents: &str) -> String {
    let file = job_file(contents);
    match load_and_validate(file.path()) {
        Err(ToolrunError::Configuration(msg)) => msg,
        Err(e) => panic!("Expected Configuration error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn full_job_file_loads() {
    let file = job_file(
        r#"
[job]
name = "strings"
namespace = "extraction:strings"
timeout = "2h"
poll_interval = "250ms"
progress_interval = "1s"
task_log = true
log_stream = "stdout"
progress = "lines"
encodings = ["ASCII", "utf16le"]
exclude = ["*.tmp"]

[tool]
argv = ["strings", "-a", "--encoding", "{encoding}", "{input}"]
stdout = "{input_name}.{encoding}_strings"
"#,
    );

    let job = load_and_validate(file.path()).unwrap();

    assert_eq!(job.name, "strings");
    assert_eq!(job.namespace, "extraction:strings");
    assert_eq!(job.timeout, Some(Duration::from_secs(7200)));
    assert_eq!(job.poll_interval, Duration::from_millis(250));
    assert_eq!(job.progress_interval, Duration::from_secs(1));
    assert!(job.task_log);
    assert_eq!(job.log_stream, LogStream::Stdout);
    assert_eq!(job.progress, ProgressKind::Lines);
    assert_eq!(job.encodings, vec![Encoding::Ascii, Encoding::Utf16Le]);
    assert_eq!(job.dispatch_plan().unwrap().len(), 2);
}

#[test]
fn defaults_apply_to_a_minimal_job() {
    let file = job_file(
        r#"
[tool]
argv = ["tool", "{input}"]
"#,
    );

    let job = load_and_validate(file.path()).unwrap();

    assert_eq!(job.name, "tool");
    assert_eq!(job.namespace, "toolrun");
    assert_eq!(job.timeout, None);
    assert_eq!(job.poll_interval, Duration::from_millis(500));
    assert_eq!(job.log_stream, LogStream::Stderr);
    assert_eq!(job.progress, ProgressKind::None);
    assert!(job.mapping_file.is_none());
    assert_eq!(job.dispatch_plan().unwrap().len(), 1);
}

#[test]
fn filter_strings_and_lists_are_both_accepted() {
    let file = job_file(
        r#"
[tool]
argv = ["extract", "{names}", "{input}"]

[filters]
names = "*.txt, *.log,"
signatures = ["exe_mz"]
"#,
    );

    let job = load_and_validate(file.path()).unwrap();

    assert_eq!(job.filters.names, vec!["*.txt", "*.log"]);
    assert_eq!(job.filters.signatures, vec!["exe_mz"]);
    let plan = job.dispatch_plan().unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(
        plan.variants()[0].filter.as_ref().map(|f| f.kind()),
        Some(FilterKind::Files)
    );
}

#[test]
fn unknown_encoding_is_rejected() {
    let msg = expect_config_error(
        r#"
[job]
encodings = ["ASCII", "EBCDIC"]

[tool]
argv = ["strings", "{input}"]
"#,
    );
    assert!(msg.contains("EBCDIC is not a valid encoding"));
}

#[test]
fn required_filters_must_be_set() {
    let msg = expect_config_error(
        r#"
[tool]
argv = ["image_export", "{input}"]

[filters]
required = true
"#,
    );
    assert!(msg.contains("No filters were set"));
}

#[test]
fn filter_kind_without_template_is_rejected() {
    let msg = expect_config_error(
        r#"
[tool.artifacts]
argv = ["image_export", "--artifact_filters", "{artifacts}", "{input}"]

[filters]
artifacts = "BrowserHistory"
extensions = "exe"
"#,
    );
    assert!(msg.contains("files filters"));
}

#[test]
fn zero_interval_and_bad_duration_are_rejected() {
    let msg = expect_config_error(
        r#"
[job]
poll_interval = "0s"

[tool]
argv = ["tool"]
"#,
    );
    assert!(msg.contains("poll_interval"));

    let msg = expect_config_error(
        r#"
[job]
timeout = "10 fortnights"

[tool]
argv = ["tool"]
"#,
    );
    assert!(msg.contains("timeout"));
}

#[test]
fn overflowing_timeout_is_a_configuration_error() {
    let msg = expect_config_error(
        r#"
[job]
timeout = "18446744073709551615h"

[tool]
argv = ["tool"]
"#,
    );
    assert!(msg.contains("timeout"));
    assert!(msg.contains("too large"));
}

#[test]
fn bad_glob_is_rejected() {
    let msg = expect_config_error(
        r#"
[job]
exclude = ["a["]

[tool]
argv = ["tool"]
"#,
    );
    assert!(msg.contains("invalid glob pattern"));
}

#[test]
fn empty_argv_is_rejected() {
    let msg = expect_config_error(
        r#"
[tool]
argv = []
"#,
    );
    assert!(msg.contains("[tool].argv must not be empty"));
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let file = job_file("[job\nname = ");
    assert!(matches!(load_and_validate(file.path()), Err(ToolrunError::Toml(_))));
}
