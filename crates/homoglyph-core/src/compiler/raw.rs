//! Reader for raw "looks like" mapping data.
//!
//! Each significant line is `SRC; DST [DST...]` with hex codepoints. This is
//! the layout of Unicode's `confusables.txt`, whose trailing type column and
//! `#` comments are ignored.

use std::path::Path;

use crate::codec::{self, HexError};

use super::CompileError;

/// "`source` visually resembles `target`".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMappingEntry {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    #[error("source: {0}")]
    Source(HexError),
    #[error("target: {0}")]
    Target(HexError),
    #[error("source field '{0}' holds more than one codepoint")]
    SourceNotSingle(String),
}

/// Parse one line. `Ok(None)` for blank, comment-only, short or
/// self-referential lines.
pub fn parse_line(line: &str) -> Result<Option<RawMappingEntry>, LineError> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split(';').map(str::trim).collect();
    if fields.len() < 2 || fields[0].is_empty() {
        return Ok(None);
    }

    let source = codec::parse_hex_sequence(fields[0]).map_err(LineError::Source)?;
    if source.chars().count() != 1 {
        return Err(LineError::SourceNotSingle(fields[0].to_string()));
    }
    let target = codec::parse_hex_sequence(fields[1]).map_err(LineError::Target)?;

    if source == target {
        return Ok(None);
    }
    Ok(Some(RawMappingEntry { source, target }))
}

/// Parse a whole data file. Bad lines are logged and skipped.
pub fn parse_str(text: &str) -> Vec<RawMappingEntry> {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let mut entries = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        match parse_line(line) {
            Ok(Some(entry)) => entries.push(entry),
            Ok(None) => {}
            Err(e) => tracing::warn!(line = idx + 1, "skipping raw mapping: {e}"),
        }
    }
    entries
}

/// Read and parse a data file from disk.
pub fn read_file(path: &Path) -> Result<Vec<RawMappingEntry>, CompileError> {
    let bytes = std::fs::read(path).map_err(|source| CompileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_str(&codec::decode_lossy(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(source: &str, target: &str) -> RawMappingEntry {
        RawMappingEntry {
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    #[test]
    fn test_unicode_confusables_layout() {
        let line = "0430 ;\t0061 ;\tMA\t# ( \u{430} \u{2192} a ) CYRILLIC SMALL LETTER A";
        assert_eq!(parse_line(line), Ok(Some(entry("\u{430}", "a"))));
    }

    #[test]
    fn test_multi_codepoint_target() {
        assert_eq!(
            parse_line("2474; 0028 0031 0029"),
            Ok(Some(entry("\u{2474}", "(1)")))
        );
    }

    #[test]
    fn test_skipped_lines() {
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("   # just a comment"), Ok(None));
        assert_eq!(parse_line("0430"), Ok(None));
        assert_eq!(parse_line("0430 # ; 0061"), Ok(None));
        assert_eq!(parse_line("; 0061"), Ok(None));
        assert_eq!(parse_line("0061; 0061"), Ok(None));
    }

    #[test]
    fn test_bad_lines_are_errors() {
        assert!(matches!(parse_line("XYZ; 0061"), Err(LineError::Source(_))));
        assert!(matches!(parse_line("0430; "), Err(LineError::Target(HexError::Empty))));
        assert!(matches!(
            parse_line("0430 0431; 0061"),
            Err(LineError::SourceNotSingle(_))
        ));
    }

    #[test]
    fn test_parse_str_skips_bom_and_bad_lines() {
        let text = "\u{FEFF}# header\n0430 ; 0061\nnot hex ; 0061\n\n03BF ; 006F ; MA\n";
        assert_eq!(
            parse_str(text),
            vec![entry("\u{430}", "a"), entry("\u{3BF}", "o")]
        );
    }
}
