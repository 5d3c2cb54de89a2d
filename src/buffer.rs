//! Input Reader (C1): load a side's bytes, normalize line endings, detect
//! a missing final newline, and split into line spans.
//!
//! Grounded on `original_source/liboccoder/Diff/diffutils/io.c`: the
//! reference reads into a growable word-aligned buffer, strips trailing
//! `\r` in place when requested, and appends a sentinel newline while
//! setting `missing_newline` when the last byte isn't `\n`.

use std::ops::Range;
use std::path::Path;

use crate::config::Config;
use crate::errors::DiffError;

/// One input side, fully prepared for equivalence hashing and diffing.
#[derive(Debug, Clone)]
pub struct Side {
    /// Display name (file name, or `"standard input"`).
    pub name: String,
    /// The prepared bytes: CR-stripped if `Config.strip_trailing_cr`, with
    /// no synthetic trailing newline appended (see `missing_newline`).
    pub text: Vec<u8>,
    /// Byte ranges of each line's content, *excluding* the terminating
    /// `\n`. The last entry may run to the end of `text` without ever
    /// having had a newline — that's `missing_newline`.
    pub lines: Vec<Range<usize>>,
    /// True if the original input did not end in `\n`.
    pub missing_newline: bool,
    /// True if a `NUL` byte was found in the input and
    /// `Config.force_text` was not set.
    pub is_binary: bool,
    /// Modification time, when known (populated by
    /// [`Side::read_from_path`]; `None` for in-memory or stdin sources, in
    /// which case the formatter falls back to the current time).
    pub mtime: Option<std::time::SystemTime>,
}

impl Side {
    /// Prepare a side from already-read bytes (spec §4.1 `prepare`).
    pub fn from_bytes(name: impl Into<String>, raw: &[u8], config: &Config) -> Side {
        let name = name.into();
        let is_binary = !config.force_text && memchr::memchr(0, raw).is_some();

        let mut text = raw.to_vec();
        if config.strip_trailing_cr {
            strip_trailing_cr_in_place(&mut text);
        }

        let missing_newline = !text.is_empty() && *text.last().unwrap() != b'\n';
        let lines = split_lines(&text);

        Side {
            name,
            text,
            lines,
            missing_newline,
            is_binary,
            mtime: None,
        }
    }

    /// Convenience wrapper around [`Side::from_bytes`] that also performs
    /// the actual file read; real directory traversal and `-` (stdin)
    /// handling stay the embedding tool's responsibility (spec §1).
    pub fn read_from_path(path: &Path, config: &Config) -> Result<Side, DiffError> {
        let raw = std::fs::read(path).map_err(|e| DiffError::io(path.display().to_string(), e))?;
        let mut side = Side::from_bytes(path.display().to_string(), &raw, config);
        if let Ok(metadata) = std::fs::metadata(path) {
            side.mtime = metadata.modified().ok();
        }
        Ok(side)
    }

    /// Number of lines, counting a trailing incomplete line as one line.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// The raw bytes of line `i`, not including its terminating newline.
    pub fn line_bytes(&self, i: usize) -> &[u8] {
        &self.text[self.lines[i].clone()]
    }

    /// True if line `i` is the last line and the file had no trailing
    /// newline (spec §3 "incomplete final line").
    pub fn is_incomplete(&self, i: usize) -> bool {
        self.missing_newline && i + 1 == self.lines.len()
    }
}

/// Remove every `\r` that immediately precedes a `\n`, in place.
fn strip_trailing_cr_in_place(buf: &mut Vec<u8>) {
    let mut write = 0;
    for read in 0..buf.len() {
        let is_cr_before_nl = buf[read] == b'\r' && buf.get(read + 1) == Some(&b'\n');
        if is_cr_before_nl {
            continue;
        }
        buf[write] = buf[read];
        write += 1;
    }
    buf.truncate(write);
}

/// Split `text` into line spans (excluding the terminating `\n`).
fn split_lines(text: &[u8]) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    let mut start = 0;
    while start < text.len() {
        match memchr::memchr(b'\n', &text[start..]) {
            Some(rel) => {
                lines.push(start..start + rel);
                start += rel + 1;
            }
            None => {
                lines.push(start..text.len());
                break;
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_complete_lines() {
        let cfg = Config::default();
        let side = Side::from_bytes("a", b"a\nb\nc\n", &cfg);
        assert_eq!(side.lines.len(), 3);
        assert!(!side.missing_newline);
        assert_eq!(side.line_bytes(0), b"a");
        assert_eq!(side.line_bytes(2), b"c");
    }

    #[test]
    fn flags_missing_final_newline() {
        let cfg = Config::default();
        let side = Side::from_bytes("a", b"a\nb", &cfg);
        assert!(side.missing_newline);
        assert_eq!(side.lines.len(), 2);
        assert_eq!(side.line_bytes(1), b"b");
        assert!(side.is_incomplete(1));
        assert!(!side.is_incomplete(0));
    }

    #[test]
    fn empty_input_is_legal() {
        let cfg = Config::default();
        let side = Side::from_bytes("empty", b"", &cfg);
        assert_eq!(side.lines.len(), 0);
        assert!(!side.missing_newline);
    }

    #[test]
    fn strips_crlf_when_requested() {
        let mut cfg = Config::default();
        cfg.strip_trailing_cr = true;
        let side = Side::from_bytes("a", b"a\r\nb\r\n", &cfg);
        assert_eq!(side.line_bytes(0), b"a");
        assert_eq!(side.line_bytes(1), b"b");
    }

    #[test]
    fn detects_binary_unless_forced_text() {
        let cfg = Config::default();
        let side = Side::from_bytes("bin", b"a\0b\n", &cfg);
        assert!(side.is_binary);

        let mut forced = Config::default();
        forced.force_text = true;
        let side = Side::from_bytes("bin", b"a\0b\n", &forced);
        assert!(!side.is_binary);
    }
}
