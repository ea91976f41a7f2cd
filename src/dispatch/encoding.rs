// src/dispatch/encoding.rs

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Character encodings a string-extraction style tool can be asked for.
///
/// Each configured encoding is run as its own invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Encoding {
    Ascii,
    Big8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}

impl Encoding {
    /// Short code passed to the tool (`strings --encoding`).
    pub fn code(&self) -> &'static str {
        match self {
            Encoding::Ascii => "s",
            Encoding::Big8 => "S",
            Encoding::Utf16Le => "l",
            Encoding::Utf16Be => "b",
            Encoding::Utf32Le => "L",
            Encoding::Utf32Be => "B",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Ascii => "ASCII",
            Encoding::Big8 => "BIG8",
            Encoding::Utf16Le => "UTF16LE",
            Encoding::Utf16Be => "UTF16BE",
            Encoding::Utf32Le => "UTF32LE",
            Encoding::Utf32Be => "UTF32BE",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASCII" => Ok(Encoding::Ascii),
            "BIG8" => Ok(Encoding::Big8),
            "UTF16LE" => Ok(Encoding::Utf16Le),
            "UTF16BE" => Ok(Encoding::Utf16Be),
            "UTF32LE" => Ok(Encoding::Utf32Le),
            "UTF32BE" => Ok(Encoding::Utf32Be),
            _ => Err(format!("{} is not a valid encoding", s.trim())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_strings_flags() {
        assert_eq!(Encoding::Ascii.code(), "s");
        assert_eq!(Encoding::Utf16Le.code(), "l");
    }

    #[test]
    fn parse_is_case_insensitive_and_rejects_unknown() {
        assert_eq!("utf16le".parse::<Encoding>(), Ok(Encoding::Utf16Le));
        assert_eq!(
            "INVALID_ENC".parse::<Encoding>(),
            Err("INVALID_ENC is not a valid encoding".to_string())
        );
    }
}
