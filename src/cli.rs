// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `toolrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "toolrun",
    version,
    about = "Run an external analysis tool over input files and collate what it produces.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the job file (TOML).
    #[arg(long, value_name = "PATH")]
    pub job: PathBuf,

    /// Input file, optionally with an explicit id (`PATH=ID`).
    ///
    /// Repeatable. Without an id the 1-based position is used.
    #[arg(long = "input", value_name = "PATH[=ID]")]
    pub inputs: Vec<String>,

    /// Directory that receives registered output and task files.
    #[arg(long, value_name = "DIR", default_value = "toolrun-output")]
    pub output_dir: PathBuf,

    /// Workflow id recorded in the task result. A random one is generated
    /// when omitted.
    #[arg(long, value_name = "ID")]
    pub workflow_id: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TOOLRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate the job and print the planned commands without running them.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeated_inputs() {
        let args = CliArgs::try_parse_from([
            "toolrun",
            "--job",
            "strings.toml",
            "--input",
            "/data/a.dd=7",
            "--input",
            "/data/b.dd",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(args.job, PathBuf::from("strings.toml"));
        assert_eq!(args.inputs, vec!["/data/a.dd=7", "/data/b.dd"]);
        assert!(args.dry_run);
        assert!(args.workflow_id.is_none());
    }
}
