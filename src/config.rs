//! Engine configuration.
//!
//! The reference implementation keeps its options as process-wide globals
//! (`ignore_case`, `context`, `output_style`, ...). This crate collects them
//! into a single [`Config`] value that is threaded through every stage
//! instead, so a process can run more than one comparison concurrently with
//! different settings and so the engine has no hidden state.

use serde::{Deserialize, Serialize};

/// Which rendering style the formatter produces.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputStyle {
    /// `<range0><op><range1>` plus `<`/`>` line groups (the default).
    #[default]
    Normal,
    /// `-c`: `***`/`---` banners with `!`/`-`/`+` markers.
    Context,
    /// `-u`: `---`/`+++` banners with `@@ ... @@` hunk headers.
    Unified,
    /// `-e`: reverse-order `ed` commands.
    Ed,
    /// `-f`: forward-order `ed` commands.
    ForwardEd,
    /// `-n`: forward-ed with line-count commands.
    Rcs,
    /// `-D NAME`: merged file with `#ifdef`/`#ifndef` blocks.
    Ifdef,
    /// `-y`: side-by-side driver assist (`i`/`c` line-count headers).
    SdiffAssist,
}

/// The whitespace/case significance used by the equivalence predicate
/// (spec §4.2). Represented as one enum, not independent booleans, so that
/// the "strongest flag wins" precedence rule (`-w` over `-b`, both
/// independent of `-E`/`-Z`) is enforced by construction rather than by
/// runtime precedence checks.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhitespaceMode {
    /// All whitespace is significant.
    #[default]
    Exact,
    /// `-E`: compare as if tabs were expanded to `tabsize` columns.
    IgnoreTabExpansion,
    /// `-Z`: ignore a run of whitespace ending at the newline.
    IgnoreTrailingSpace,
    /// `-E` and `-Z` combined.
    IgnoreTabExpansionAndTrailingSpace,
    /// `-b`: collapse any run of whitespace to one space; drop trailing.
    IgnoreSpaceChange,
    /// `-w`: skip all whitespace entirely.
    IgnoreAllSpace,
}

/// When to emit SGR color escapes (spec §4.7 "Color gating").
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Never emit color, regardless of the output destination.
    #[default]
    Never,
    /// Emit color only when `Config.presume_tty` is set (the embedding tool
    /// is responsible for deciding whether the real output stream is a
    /// terminal; see spec §1 "Out of scope").
    Auto,
    /// Always emit color.
    Always,
}

/// Engine-wide configuration, threaded explicitly through every component
/// instead of living in process globals.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    /// Selected output style (`-c`/`-u`/`-e`/`-f`/`-n`/`-D`/`-y`/normal).
    pub output_style: OutputStyle,
    /// Context lines for `Context`/`Unified` styles (`-C N`/`-U N`, default 3).
    pub context: usize,
    /// `#ifdef` group name for `Ifdef` style (`-D NAME`).
    pub ifdef_name: Option<String>,
    /// Print only "Files X and Y differ" (`-q`/`--brief`).
    pub brief: bool,
    /// Report identical files explicitly (`-s`).
    pub report_identical: bool,
    /// Case-fold per character (`-i`).
    pub ignore_case: bool,
    /// Active whitespace/equivalence rule (`-w`/`-b`/`-Z`/`-E`).
    pub whitespace: WhitespaceMode,
    /// Ignore hunks whose changed lines are all blank (`-B`).
    pub ignore_blank_lines: bool,
    /// Ignore hunks whose changed lines all match this pattern (`-I RE`).
    pub ignore_regexp: Option<String>,
    /// Force a guaranteed-minimal edit script, skipping the discard
    /// heuristic (`-d`).
    pub minimal: bool,
    /// Trade minimality for speed on large, low-density inputs (`-H`).
    pub speed_large_files: bool,
    /// Extra lines kept past the common prefix/suffix for boundary shift
    /// (`--horizon-lines=N`).
    pub horizon_lines: usize,
    /// Strip a trailing `\r` before the final `\n` of every line
    /// (`--strip-trailing-cr`).
    pub strip_trailing_cr: bool,
    /// Function-header regexp for context/unified hunk headers (`-F RE`).
    pub function_regexp: Option<String>,
    /// Override for a side's displayed name/timestamp (`--label`, used at
    /// most twice: once per side).
    pub labels: [Option<String>; 2],
    /// Columns between tab stops (`--tabsize=N`, default 8).
    pub tabsize: usize,
    /// Re-expand tabs in the output so prefixed lines stay aligned (`-t`).
    pub expand_tabs: bool,
    /// Use a tab rather than a space before the line's own text (`-T`).
    pub initial_tab: bool,
    /// Don't print a leading space/tab before an empty line.
    pub suppress_blank_empty: bool,
    /// `sdiff`: show only the left version of common lines (`-l`).
    pub left_column: bool,
    /// `sdiff`: suppress common lines entirely (`-s` in the sdiff driver).
    pub suppress_common_lines: bool,
    /// `sdiff`: half-width of each column (`-W N`).
    pub sdiff_half_width: usize,
    /// `sdiff`: column offset of the second half (derived from `-W`).
    pub sdiff_column2_offset: usize,
    /// When to emit SGR color escapes.
    pub color: ColorMode,
    /// `--palette=...` override for the header/add/delete/reset SGR codes.
    pub palette: Option<String>,
    /// Test-only stand-in for "the output stream is a real terminal",
    /// consulted only when `color == ColorMode::Auto`.
    pub presume_tty: bool,
    /// `strftime`-like format string for context/unified header timestamps.
    pub time_format: Option<String>,
    /// Treat all inputs as text, skipping the binary sniff (`-a`).
    pub force_text: bool,
    /// `--old-group-format=FMT` override for `Ifdef` style; defaults to a
    /// standard `#ifndef NAME ... #endif` wrapper when unset.
    pub old_group_format: Option<String>,
    /// `--new-group-format=FMT` override; defaults to `#ifdef NAME ... #endif`.
    pub new_group_format: Option<String>,
    /// `--changed-group-format=FMT` override; defaults to
    /// `#ifndef NAME ... #else ... #endif`.
    pub changed_group_format: Option<String>,
    /// `--unchanged-group-format=FMT` override; defaults to the lines
    /// themselves with no wrapper.
    pub unchanged_group_format: Option<String>,
    /// `--line-format=FMT` override applied within a group format's
    /// `%<`/`%>`/`%=` expansions; defaults to `%L` (the line verbatim).
    pub line_format: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_style: OutputStyle::Normal,
            context: 3,
            ifdef_name: None,
            brief: false,
            report_identical: false,
            ignore_case: false,
            whitespace: WhitespaceMode::Exact,
            ignore_blank_lines: false,
            ignore_regexp: None,
            minimal: false,
            speed_large_files: false,
            horizon_lines: 0,
            strip_trailing_cr: false,
            function_regexp: None,
            labels: [None, None],
            tabsize: 8,
            expand_tabs: false,
            initial_tab: false,
            suppress_blank_empty: false,
            left_column: false,
            suppress_common_lines: false,
            sdiff_half_width: 65,
            sdiff_column2_offset: 68,
            color: ColorMode::Never,
            palette: None,
            presume_tty: false,
            time_format: None,
            force_text: false,
            old_group_format: None,
            new_group_format: None,
            changed_group_format: None,
            unchanged_group_format: None,
            line_format: None,
        }
    }
}

impl Config {
    /// Whether color should actually be emitted, given [`ColorMode`] and
    /// [`Config::presume_tty`].
    pub fn color_enabled(&self) -> bool {
        match self.color {
            ColorMode::Never => false,
            ColorMode::Always => true,
            ColorMode::Auto => self.presume_tty,
        }
    }

    /// Whether this output style can represent a file that doesn't end in
    /// a newline (spec §2 C7, "robust" in the reference's terminology).
    pub fn robust_output_style(&self) -> bool {
        !matches!(self.output_style, OutputStyle::Ed | OutputStyle::ForwardEd)
    }
}
