// tests/normalize_properties.rs

use proptest::prelude::*;
use toolrun::normalize::{LogLevel, LogNormalizer};

/// Lines drawn from a small alphabet of tagged, untagged and blank lines.
fn line_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z ]{1,12}".prop_map(|t| format!("[INFO] {t}")),
        "[a-z ]{1,12}".prop_map(|t| format!("[WARNING] {t}")),
        "[a-z ]{1,12}".prop_map(|t| format!("[ERROR] {t}")),
        "[a-z ]{1,12}".prop_map(|t| format!("[CRITICAL] {t}")),
        "[a-z]{1,8}".prop_map(|t| format!("[{t}] unknown tag")),
        "[a-z][a-z ]{0,12}".prop_map(|t| format!("  {t}")),
        Just(String::new()),
        Just("   ".to_string()),
    ]
}

/// Tags are matched case-insensitively, so a generated `[info]` counts too.
fn level_of_tag(line: &str) -> Option<LogLevel> {
    let tag = line.strip_prefix('[')?.split(']').next()?;
    match tag.to_ascii_uppercase().as_str() {
        "INFO" => Some(LogLevel::Info),
        "WARNING" => Some(LogLevel::Warning),
        "ERROR" => Some(LogLevel::Error),
        "CRITICAL" => Some(LogLevel::Critical),
        _ => None,
    }
}

/// Text a continuation keeps: the message after an unrecognized `[TOKEN]`,
/// or the whole line when it has no token.
fn continuation_text(line: &str) -> &str {
    match line.strip_prefix('[').and_then(|rest| rest.split_once(']')) {
        Some((_, message)) => message.trim_start_matches([' ', '\t']),
        None => line,
    }
}

proptest! {
    #[test]
    fn blank_lines_never_change_the_records(lines in proptest::collection::vec(line_strategy(), 0..40)) {
        let normalizer = LogNormalizer::new();
        let with_blanks = lines.join("\n");
        let without_blanks = lines
            .iter()
            .filter(|l| !l.trim().is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join("\n");

        prop_assert_eq!(normalizer.normalize(&with_blanks), normalizer.normalize(&without_blanks));
    }

    #[test]
    fn untagged_lines_carry_the_last_tagged_level(lines in proptest::collection::vec(line_strategy(), 0..40)) {
        let normalizer = LogNormalizer::new();
        let records = normalizer.normalize(&lines.join("\n"));
        let non_blank: Vec<&String> = lines.iter().filter(|l| !l.trim().is_empty()).collect();

        prop_assert_eq!(records.len(), non_blank.len());

        let mut current = LogLevel::Info;
        for (line, record) in non_blank.iter().zip(&records) {
            match level_of_tag(line) {
                Some(level) => {
                    current = level;
                    prop_assert!(!record.is_continuation);
                }
                None => {
                    prop_assert!(record.is_continuation);
                    prop_assert_eq!(record.text.as_str(), continuation_text(line));
                }
            }
            prop_assert_eq!(record.level, current);
        }
    }
}
