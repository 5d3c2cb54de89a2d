//! Formatter (C7): render an edit script in the selected output style.
//!
//! Common contracts live here (spec §4.7): line-number translation,
//! context/unified window expansion, function-header lookup, color
//! gating. Style-specific rendering lives in the sibling submodules.

mod context;
mod ed;
mod ifdef;
mod normal;
mod rcs;
mod sdiff;

use std::io::Write;

use colored::{Color, Colorize};
use regex::Regex;

use crate::analyze::HunkRange;
use crate::buffer::Side;
use crate::config::{Config, OutputStyle};
use crate::errors::DiffError;
use crate::script::Change;

/// Render the full script to `out` in `cfg.output_style`.
pub fn write_script(
    out: &mut dyn Write,
    side0: &Side,
    side1: &Side,
    head: &Option<Box<Change>>,
    cfg: &Config,
) -> Result<(), DiffError> {
    match cfg.output_style {
        OutputStyle::Normal => normal::write(out, side0, side1, head, cfg),
        OutputStyle::Context => context::write(out, side0, side1, head, cfg, context::Style::Context),
        OutputStyle::Unified => context::write(out, side0, side1, head, cfg, context::Style::Unified),
        OutputStyle::Ed => ed::write(out, side0, side1, head, cfg, false),
        OutputStyle::ForwardEd => ed::write(out, side0, side1, head, cfg, true),
        OutputStyle::Rcs => rcs::write(out, side0, side1, head, cfg),
        OutputStyle::Ifdef => ifdef::write(out, side0, side1, head, cfg),
        OutputStyle::SdiffAssist => sdiff::write(out, side0, side1, head, cfg),
    }
}

/// 1-based, `patch`-compatible rendering of a range: a bare number when
/// the range collapses to one line or is empty, else `first,last` (spec
/// §4.7 `translate_range`).
pub fn translate_range(r: HunkRange) -> String {
    let first = r.first + 1;
    let last = r.last + 1;
    if last < first {
        format!("{last}")
    } else if first == last {
        format!("{first}")
    } else {
        format!("{first},{last}")
    }
}

/// Unified-style `start,count` rendering: count omitted when it's 1, and
/// the 0-based start is shown bare (not `+1`) when the range is empty
/// (spec.md §8 scenario 2: `@@ -1 +0,0 @@`).
pub fn unified_range(start0: usize, count: usize) -> String {
    if count == 0 {
        format!("{start0},0")
    } else if count == 1 {
        format!("{}", start0 + 1)
    } else {
        format!("{},{}", start0 + 1, count)
    }
}

/// One line of a context/unified hunk body, in terms of 0-based real
/// indices into each side.
#[derive(Debug, Clone, Copy)]
pub enum BodyLine {
    Context(usize, usize),
    /// `(real index, this change also has an inserted counterpart)` — the
    /// latter decides `-` vs `!` in context format.
    Delete(usize, bool),
    /// `(real index, this change also has a deleted counterpart)`.
    Insert(usize, bool),
}

/// A group of [`Change`] records the Post-processor decided belong to one
/// printed hunk (spec §4.5 "Hunk merging"), already filtered to exclude
/// groups that are entirely ignorable.
pub type Hunk<'a> = Vec<&'a Change>;

/// Expand a hunk's window by `context` lines on each side, clipped to the
/// file bounds (spec §4.7 "Common contracts").
pub fn hunk_span(group: &[&Change], context: usize, n0: usize, n1: usize) -> (usize, usize, usize, usize) {
    let first = *group.first().expect("a hunk is never empty");
    let last = *group.last().expect("a hunk is never empty");
    let start0 = first.line0.saturating_sub(context);
    let start1 = first.line1.saturating_sub(context);
    let end0 = (last.line0_end() + context).min(n0);
    let end1 = (last.line1_end() + context).min(n1);
    (start0, end0, start1, end1)
}

/// Walk a hunk's window, interleaving context lines with each change's
/// deleted/inserted lines, in display order.
pub fn build_body(group: &[&Change], start0: usize, end0: usize, start1: usize) -> Vec<BodyLine> {
    let mut body = Vec::new();
    let mut i0 = start0;
    let mut i1 = start1;

    for change in group {
        while i0 < change.line0 && i0 < end0 {
            body.push(BodyLine::Context(i0, i1));
            i0 += 1;
            i1 += 1;
        }
        let is_changed = change.deleted > 0 && change.inserted > 0;
        for k in 0..change.deleted {
            body.push(BodyLine::Delete(change.line0 + k, is_changed));
        }
        for k in 0..change.inserted {
            body.push(BodyLine::Insert(change.line1 + k, is_changed));
        }
        i0 = change.line0 + change.deleted;
        i1 = change.line1 + change.inserted;
    }
    while i0 < end0 {
        body.push(BodyLine::Context(i0, i1));
        i0 += 1;
        i1 += 1;
    }
    body
}

/// Group the full chain into printable hunks, dropping any hunk whose
/// every record is ignorable (spec §4.6 "An ignorable hunk is dropped by
/// most formatters"). Ed-style formats do not call this — they stay
/// line-count-sensitive and must see every record.
pub fn non_ignorable_hunks<'a>(head: &'a Option<Box<Change>>, context: usize) -> Vec<Hunk<'a>> {
    crate::script::group_into_hunks(head, context)
        .into_iter()
        .filter(|group| group.iter().any(|c| !c.ignore))
        .collect()
}

/// Memoized backward scan for the nearest preceding function-header line
/// (`-F`/`-p`), grounded on `context.c`'s `find_function`.
pub struct FunctionHeaderFinder {
    last_search: usize,
    last_match: Option<usize>,
}

impl FunctionHeaderFinder {
    pub fn new() -> Self {
        FunctionHeaderFinder {
            last_search: 0,
            last_match: None,
        }
    }

    /// Find the nearest line at or before `before` (0-based, exclusive
    /// bound) matching `re`, scanning backward from the last search point
    /// so repeated calls across ascending hunks stay roughly linear.
    pub fn find(&mut self, side: &Side, before: usize, re: &Regex) -> Option<String> {
        let start = self.last_search.max(self.last_match.map(|m| m + 1).unwrap_or(0));
        let mut found = self.last_match;
        for i in start..before {
            if let Ok(text) = std::str::from_utf8(side.line_bytes(i)) {
                if re.is_match(text) {
                    found = Some(i);
                }
            }
        }
        self.last_search = before;
        self.last_match = found;
        found.map(|i| String::from_utf8_lossy(side.line_bytes(i)).into_owned())
    }
}

impl Default for FunctionHeaderFinder {
    fn default() -> Self {
        Self::new()
    }
}

/// Which semantic context a span of output belongs to, for SGR coloring
/// (spec §4.7 "Color gating": "header, added, deleted, changed,
/// line-number, reset").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRole {
    /// File banners (`***`/`---`/`+++` lines, `#ifdef`/`#endif` wrappers).
    Header,
    /// A line present only in the new side.
    Added,
    /// A line present only in the old side.
    Deleted,
    /// A `!`-marked context-format line with a counterpart on both sides.
    Changed,
    /// Range/address text (`2c2`, `*** 1,3 ****`, `@@ -1,3 +1,3 @@`, ed
    /// addresses, RCS `a`/`d` commands, sdiff-assist `i`/`c` commands).
    LineNumber,
}

impl ColorRole {
    fn palette_key(self) -> &'static str {
        match self {
            ColorRole::Header => "hd",
            ColorRole::Added => "ad",
            ColorRole::Deleted => "de",
            ColorRole::Changed => "ch",
            ColorRole::LineNumber => "ln",
        }
    }

    fn default_color(self) -> Color {
        match self {
            ColorRole::Header => Color::White,
            ColorRole::Added => Color::Green,
            ColorRole::Deleted => Color::Red,
            ColorRole::Changed => Color::Cyan,
            ColorRole::LineNumber => Color::Yellow,
        }
    }

    /// Resolve this role's color, honoring a `--palette=hd=green:ad=blue`
    /// style override in `cfg.palette` (a named-color simplification of
    /// GNU diff's raw-SGR-parameter palette syntax; see DESIGN.md).
    fn resolve(self, cfg: &Config) -> Color {
        if let Some(palette) = &cfg.palette {
            for entry in palette.split(':') {
                if let Some((key, value)) = entry.split_once('=') {
                    if key == self.palette_key() {
                        if let Ok(c) = value.parse::<Color>() {
                            return c;
                        }
                    }
                }
            }
        }
        self.default_color()
    }
}

/// Color `text` for `role` when `cfg.color_enabled()`; header text is also
/// bold, matching GNU diff's default `hd=1` palette entry. `text` must
/// already be valid UTF-8 (safe for banners, ranges, and command lines);
/// see [`color_bytes`] for raw line content that may not be.
pub fn color(cfg: &Config, role: ColorRole, text: &str) -> String {
    if !cfg.color_enabled() {
        return text.to_string();
    }
    let painted = text.color(role.resolve(cfg));
    if role == ColorRole::Header {
        painted.bold().to_string()
    } else {
        painted.to_string()
    }
}

/// Write `bytes` to `out` wrapped in `role`'s SGR codes when
/// `cfg.color_enabled()`. Unlike [`color`], this never re-encodes the
/// bytes themselves, so it's safe for raw (possibly non-UTF-8) line
/// content: only the inserted escape sequences are text.
pub fn color_bytes(out: &mut dyn Write, cfg: &Config, role: ColorRole, bytes: &[u8]) -> std::io::Result<()> {
    if !cfg.color_enabled() {
        return out.write_all(bytes);
    }
    let c = role.resolve(cfg);
    if role == ColorRole::Header {
        write!(out, "\x1b[1;{}m", c.to_fg_str())?;
    } else {
        write!(out, "\x1b[{}m", c.to_fg_str())?;
    }
    out.write_all(bytes)?;
    write!(out, "\x1b[0m")
}

/// Write a line's bytes followed by `\n`, or a `\ No newline` marker if
/// `no_newline` and that side is missing its trailing newline (spec §4.7
/// "Normal": "Emit `\ No newline...` when a side whose final line is
/// printed was flagged missing-newline"). `prefix` and `bytes` are colored
/// together as one `role` span when `cfg.color_enabled()`. `bytes` is
/// tab-expanded first when `cfg.expand_tabs` is set, and `marker` followed
/// by a space or tab (per `cfg.initial_tab`) forms the prefix, honoring
/// `cfg.suppress_blank_empty` (spec §6 "Tab presentation").
pub fn write_line(
    out: &mut dyn Write,
    cfg: &Config,
    role: ColorRole,
    marker: char,
    bytes: &[u8],
    no_newline: bool,
) -> std::io::Result<()> {
    let bytes = expand_line_tabs(cfg, bytes);
    let bytes = bytes.as_ref();
    let prefix = body_line_prefix(cfg, marker, bytes);
    if cfg.color_enabled() {
        let c = role.resolve(cfg);
        write!(out, "\x1b[{}m{prefix}", c.to_fg_str())?;
        out.write_all(bytes)?;
        write!(out, "\x1b[0m")?;
    } else {
        out.write_all(prefix.as_bytes())?;
        out.write_all(bytes)?;
    }
    out.write_all(b"\n")?;
    if no_newline {
        out.write_all(b"\\ No newline at end of file\n")?;
    }
    Ok(())
}

/// Expand tab characters to `cfg.tabsize`-column stops (`-t`/
/// `--expand-tabs`, spec §6 "Tab presentation"), tracking column position
/// across the line so each tab's width depends on what precedes it. A
/// no-op, returning `bytes` unchanged, unless `cfg.expand_tabs` is set and
/// the line actually contains a tab.
pub fn expand_line_tabs<'a>(cfg: &Config, bytes: &'a [u8]) -> std::borrow::Cow<'a, [u8]> {
    if !cfg.expand_tabs || !bytes.contains(&b'\t') {
        return std::borrow::Cow::Borrowed(bytes);
    }
    let tabsize = cfg.tabsize.max(1);
    let mut out = Vec::with_capacity(bytes.len());
    let mut col = 0usize;
    for &b in bytes {
        if b == b'\t' {
            let width = tabsize - (col % tabsize);
            out.extend(std::iter::repeat(b' ').take(width));
            col += width;
        } else {
            out.push(b);
            col += 1;
        }
    }
    std::borrow::Cow::Owned(out)
}

/// The prefix before a context/unified body line's own text: `marker`
/// followed by a space, or by a tab when `cfg.initial_tab` is set
/// (`-T`/`--initial-tab`, spec §6 "Tab presentation"). A bare context
/// line (`marker == ' '`) collapses to a single tab rather than a space
/// plus a tab. Returns an empty prefix instead when `cfg.suppress_blank_empty`
/// is set and `bytes` (the line's content, without its newline) is empty,
/// so a blank line in the input doesn't grow a trailing marker in the
/// output.
pub fn body_line_prefix(cfg: &Config, marker: char, bytes: &[u8]) -> String {
    if cfg.suppress_blank_empty && bytes.is_empty() {
        return String::new();
    }
    if cfg.initial_tab {
        if marker == ' ' {
            "\t".to_string()
        } else {
            format!("{marker}\t")
        }
    } else {
        format!("{marker} ")
    }
}
