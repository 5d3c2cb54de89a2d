//! Hunk Analyzer (C6): classify each change record and decide whether its
//! content is ignorable under `-B`/`-I`.
//!
//! Grounded on `original_source/liboccoder/Diff/diffutils/context.c`'s
//! `mark_ignorable`: detach, inspect, restore — modeled here as a plain
//! `&mut Change` borrow rather than an actual detach/reattach, since the
//! linked list already gives safe mutable access one node at a time.

use regex::Regex;

use crate::buffer::Side;
use crate::config::Config;
use crate::script::Change;

/// Which sides a hunk touches (spec §4.6 `analyze`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Changes {
    pub old: bool,
    pub new: bool,
}

impl Changes {
    pub fn of(change: &Change) -> Self {
        Changes {
            old: change.deleted > 0,
            new: change.inserted > 0,
        }
    }
}

/// A 1-based display range. `last < first` encodes an empty range, per
/// spec §4.7's `translate_range` convention (rendered as the bare `last`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkRange {
    pub first: i64,
    pub last: i64,
}

fn range(start: usize, count: usize) -> HunkRange {
    if count == 0 {
        HunkRange {
            first: start as i64,
            last: start as i64 - 1,
        }
    } else {
        HunkRange {
            first: start as i64,
            last: (start + count - 1) as i64,
        }
    }
}

/// `analyze(hunk) -> (changes, first0, last0, first1, last1)` (spec §4.6).
pub fn analyze(change: &Change) -> (Changes, HunkRange, HunkRange) {
    let changes = Changes::of(change);
    let r0 = range(change.line0, change.deleted);
    let r1 = range(change.line1, change.inserted);
    (changes, r0, r1)
}

/// Set `change.ignore` when every line it touches is ignorable under every
/// *enabled* rule (`-B` blank lines, `-I RE` matching lines). With neither
/// flag set, nothing is ever ignorable.
pub fn mark_ignorable(change: &mut Change, side0: &Side, side1: &Side, cfg: &Config, ignore_re: Option<&Regex>) {
    if !cfg.ignore_blank_lines && ignore_re.is_none() {
        change.ignore = false;
        return;
    }

    let deleted_ok = (0..change.deleted)
        .all(|k| line_ignorable(side0.line_bytes(change.line0 + k), cfg, ignore_re));
    let inserted_ok = deleted_ok
        && (0..change.inserted)
            .all(|k| line_ignorable(side1.line_bytes(change.line1 + k), cfg, ignore_re));

    change.ignore = inserted_ok;
}

fn line_ignorable(line: &[u8], cfg: &Config, ignore_re: Option<&Regex>) -> bool {
    let blank_ok = !cfg.ignore_blank_lines || line.iter().all(u8::is_ascii_whitespace);
    let regex_ok = match ignore_re {
        Some(re) => std::str::from_utf8(line).map(|s| re.is_match(s)).unwrap_or(false),
        None => true,
    };
    blank_ok && regex_ok
}
