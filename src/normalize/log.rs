// src/normalize/log.rs

//! Reassembles raw tool stdout/stderr into leveled log records.
//!
//! Tools in this family write lines like `[WARNING] message`. Anything
//! else belongs to the last recognized level: tracebacks keep their full
//! text, lines with an unknown bracketed token keep only the message. That rule is a one-variable state
//! machine ([`LevelTracker`]); blank lines never produce a record.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, error, info, warn};

static TAGGED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[([^\[\]\s]+)\][ \t]*(.*)$").expect("Invalid log line regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub text: String,
    pub is_continuation: bool,
}

impl LogRecord {
    pub fn new(level: LogLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            is_continuation: false,
        }
    }

    pub fn continuation(level: LogLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            is_continuation: true,
        }
    }
}

/// Destination for normalized records.
pub trait LogSink {
    fn log(&mut self, record: &LogRecord);
}

impl LogSink for Vec<LogRecord> {
    fn log(&mut self, record: &LogRecord) {
        self.push(record.clone());
    }
}

/// Re-emits tool records as `tracing` events under `toolrun::tool`.
#[derive(Debug, Clone)]
pub struct TracingSink {
    tool: String,
}

impl TracingSink {
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }
}

impl LogSink for TracingSink {
    fn log(&mut self, record: &LogRecord) {
        let tool = self.tool.as_str();
        let text = record.text.as_str();
        match record.level {
            LogLevel::Debug => debug!(target: "toolrun::tool", tool, "{}", text),
            LogLevel::Info => info!(target: "toolrun::tool", tool, "{}", text),
            LogLevel::Warning => warn!(target: "toolrun::tool", tool, "{}", text),
            LogLevel::Error => error!(target: "toolrun::tool", tool, "{}", text),
            LogLevel::Critical => error!(target: "toolrun::tool", tool, critical = true, "{}", text),
        }
    }
}

/// Carry-forward state: the level of the last recognized tagged line.
#[derive(Debug, Clone, Copy)]
pub struct LevelTracker {
    current_level: LogLevel,
}

impl LevelTracker {
    pub fn new(initial: LogLevel) -> Self {
        Self {
            current_level: initial,
        }
    }

    pub fn current_level(&self) -> LogLevel {
        self.current_level
    }

    /// A recognized tag switches the state and starts a record.
    pub fn tagged(&mut self, level: LogLevel, text: &str) -> LogRecord {
        self.current_level = level;
        LogRecord::new(level, text)
    }

    /// Anything else is recorded at the current level, state unchanged.
    pub fn continuation(&self, line: &str) -> LogRecord {
        LogRecord::continuation(self.current_level, line)
    }
}

#[derive(Debug, Clone)]
pub struct LogNormalizer {
    levels: HashMap<String, LogLevel>,
    initial_level: LogLevel,
}

impl Default for LogNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl LogNormalizer {
    /// Recognizes `INFO`, `WARNING`, `ERROR` and `CRITICAL`. Untagged lines
    /// before the first tag are recorded at `INFO`.
    pub fn new() -> Self {
        let levels = [
            LogLevel::Info,
            LogLevel::Warning,
            LogLevel::Error,
            LogLevel::Critical,
        ]
        .into_iter()
        .map(|l| (l.as_str().to_string(), l))
        .collect();

        Self {
            levels,
            initial_level: LogLevel::Info,
        }
    }

    /// Recognize another bracketed token, e.g. `("DEBUG", LogLevel::Debug)`.
    pub fn with_level(mut self, token: &str, level: LogLevel) -> Self {
        self.levels.insert(token.to_ascii_uppercase(), level);
        self
    }

    pub fn with_initial_level(mut self, level: LogLevel) -> Self {
        self.initial_level = level;
        self
    }

    fn recognize(&self, token: &str) -> Option<LogLevel> {
        self.levels.get(&token.to_ascii_uppercase()).copied()
    }

    pub fn normalize(&self, raw: &str) -> Vec<LogRecord> {
        let mut records = Vec::new();
        self.normalize_into(raw, &mut records);
        records
    }

    /// Normalize `raw` and push every record into `sink`, in line order.
    /// Returns the number of records emitted.
    pub fn normalize_into(&self, raw: &str, sink: &mut dyn LogSink) -> usize {
        let mut tracker = LevelTracker::new(self.initial_level);
        let mut emitted = 0;

        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }

            let record = match TAGGED_LINE.captures(line) {
                Some(caps) => match self.recognize(&caps[1]) {
                    Some(level) => tracker.tagged(level, &caps[2]),
                    None => tracker.continuation(&caps[2]),
                },
                None => tracker.continuation(line),
            };

            sink.log(&record);
            emitted += 1;
        }

        emitted
    }
}

/// Render records back into `[LEVEL] text` lines, e.g. for a task log file.
pub fn render_records(records: &[LogRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push('[');
        out.push_str(record.level.as_str());
        out.push_str("] ");
        out.push_str(&record.text);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(records: &[LogRecord]) -> Vec<(LogLevel, &str)> {
        records.iter().map(|r| (r.level, r.text.as_str())).collect()
    }

    #[test]
    fn standard_levels() {
        let logs = "[INFO] This is an info message\n\
                    [WARNING] This is a warning message\n\
                    [ERROR] This is an error message\n";
        let records = LogNormalizer::new().normalize(logs);
        assert_eq!(
            pairs(&records),
            vec![
                (LogLevel::Info, "This is an info message"),
                (LogLevel::Warning, "This is a warning message"),
                (LogLevel::Error, "This is an error message"),
            ]
        );
        assert!(records.iter().all(|r| !r.is_continuation));
    }

    #[test]
    fn traceback_lines_inherit_error_level() {
        let logs = "[ERROR] An error occurred\n\
                    Traceback (most recent call last):\n  \
                    File \"script.py\", line 10, in <module>\n    \
                    raise ValueError(\"oops\")\n\
                    [INFO] Recovery successful";
        let records = LogNormalizer::new().normalize(logs);
        assert_eq!(
            pairs(&records),
            vec![
                (LogLevel::Error, "An error occurred"),
                (LogLevel::Error, "Traceback (most recent call last):"),
                (LogLevel::Error, "  File \"script.py\", line 10, in <module>"),
                (LogLevel::Error, "    raise ValueError(\"oops\")"),
                (LogLevel::Info, "Recovery successful"),
            ]
        );
        assert!(records[1].is_continuation);
        assert!(!records[4].is_continuation);
    }

    #[test]
    fn unknown_token_carries_previous_level() {
        let logs = "[INFO] Start\n\
                    [UNKNOWN_LEVEL] logged as INFO\n\
                    [CRITICAL] Critical error\n\
                    [WEIRD] logged as CRITICAL";
        let records = LogNormalizer::new().normalize(logs);
        assert_eq!(
            pairs(&records),
            vec![
                (LogLevel::Info, "Start"),
                (LogLevel::Info, "logged as INFO"),
                (LogLevel::Critical, "Critical error"),
                (LogLevel::Critical, "logged as CRITICAL"),
            ]
        );
        assert!(records[1].is_continuation);
        assert!(records[3].is_continuation);
    }

    #[test]
    fn unknown_token_message_is_kept_without_the_token() {
        let records = LogNormalizer::new().normalize(
            "[INFO] Start\n[UNKNOWN_LEVEL] This should be logged as INFO (previous level)",
        );
        assert_eq!(records[1].level, LogLevel::Info);
        assert_eq!(records[1].text, "This should be logged as INFO (previous level)");
    }

    #[test]
    fn blank_lines_are_dropped() {
        let records = LogNormalizer::new().normalize("[INFO] Line 1\n\n   \n[INFO] Line 2");
        assert_eq!(
            pairs(&records),
            vec![(LogLevel::Info, "Line 1"), (LogLevel::Info, "Line 2")]
        );
    }

    struct CountingSink(usize);

    impl LogSink for CountingSink {
        fn log(&mut self, _record: &LogRecord) {
            self.0 += 1;
        }
    }

    #[test]
    fn empty_input_never_touches_sink() {
        let mut sink = CountingSink(0);
        assert_eq!(LogNormalizer::new().normalize_into("", &mut sink), 0);
        assert_eq!(LogNormalizer::new().normalize_into("\n  \n", &mut sink), 0);
        assert_eq!(sink.0, 0);
    }

    #[test]
    fn untagged_first_line_uses_initial_level() {
        let records = LogNormalizer::new()
            .with_initial_level(LogLevel::Warning)
            .normalize("starting up\n[INFO] ok");
        assert_eq!(
            pairs(&records),
            vec![(LogLevel::Warning, "starting up"), (LogLevel::Info, "ok")]
        );
    }

    #[test]
    fn extra_levels_can_be_registered() {
        let plain = LogNormalizer::new().normalize("[ERROR] x\n[DEBUG] y");
        assert_eq!(plain[1].level, LogLevel::Error);

        let extended = LogNormalizer::new()
            .with_level("DEBUG", LogLevel::Debug)
            .normalize("[ERROR] x\n[DEBUG] y");
        assert_eq!(pairs(&extended)[1], (LogLevel::Debug, "y"));
    }

    #[test]
    fn render_round_trips_tagged_records() {
        let records = vec![
            LogRecord::new(LogLevel::Error, "boom"),
            LogRecord::continuation(LogLevel::Error, "Traceback..."),
        ];
        assert_eq!(render_records(&records), "[ERROR] boom\n[ERROR] Traceback...\n");
    }
}
