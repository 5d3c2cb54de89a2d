//! Shared logic for context (`-c`) and unified (`-u`) formats: both emit a
//! two-line banner, then one stanza per merged hunk with a window of
//! surrounding context (spec §4.7 "Context"/"Unified").

use std::io::Write;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use regex::Regex;

use crate::buffer::Side;
use crate::config::Config;
use crate::errors::DiffError;
use crate::script::Change;

use super::{body_line_prefix, build_body, color, expand_line_tabs, hunk_span, non_ignorable_hunks, unified_range, BodyLine, ColorRole, FunctionHeaderFinder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Context,
    Unified,
}

pub fn write(
    out: &mut dyn Write,
    side0: &Side,
    side1: &Side,
    head: &Option<Box<Change>>,
    cfg: &Config,
    style: Style,
) -> Result<(), DiffError> {
    let hunks = non_ignorable_hunks(head, cfg.context);
    if hunks.is_empty() {
        return Ok(());
    }

    let (banner0, banner1) = match style {
        Style::Context => ("***", "---"),
        Style::Unified => ("---", "+++"),
    };
    writeln!(out, "{}", color(cfg, ColorRole::Header, &format!("{banner0} {}", label(side0, cfg, 0))))
        .map_err(io_err(side0))?;
    writeln!(out, "{}", color(cfg, ColorRole::Header, &format!("{banner1} {}", label(side1, cfg, 1))))
        .map_err(io_err(side1))?;

    let function_re = cfg
        .function_regexp
        .as_deref()
        .map(Regex::new)
        .transpose()
        .map_err(|e| DiffError::BadRegex {
            pattern: cfg.function_regexp.clone().unwrap_or_default(),
            source: e,
        })?;
    let mut finder = FunctionHeaderFinder::new();

    for group in hunks {
        let (start0, end0, start1, end1) = hunk_span(&group, cfg.context, side0.line_count(), side1.line_count());
        let body = build_body(&group, start0, end0, start1);

        let func_suffix = match &function_re {
            Some(re) => finder
                .find(side0, group[0].line0, re)
                .map(|f| format!(" {f}"))
                .unwrap_or_default(),
            None => String::new(),
        };

        match style {
            Style::Context => write_context_hunk(out, side0, side1, cfg, &body, start0, end0, start1, end1, &func_suffix)?,
            Style::Unified => write_unified_hunk(out, side0, side1, cfg, &body, start0, end0, start1, end1, &func_suffix)?,
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn write_context_hunk(
    out: &mut dyn Write,
    side0: &Side,
    side1: &Side,
    cfg: &Config,
    body: &[BodyLine],
    start0: usize,
    end0: usize,
    start1: usize,
    end1: usize,
    func_suffix: &str,
) -> Result<(), DiffError> {
    writeln!(out, "{}", color(cfg, ColorRole::Header, &format!("***************{func_suffix}")))
        .map_err(io_err(side0))?;
    writeln!(
        out,
        "{}",
        color(cfg, ColorRole::LineNumber, &format!("*** {} ****", range_compat(start0, end0.saturating_sub(start0))))
    )
    .map_err(io_err(side0))?;

    let any_old = body
        .iter()
        .any(|b| matches!(b, BodyLine::Context(..) | BodyLine::Delete(..)));
    if any_old {
        for line in body {
            match *line {
                BodyLine::Context(i0, _) => {
                    let marker = if side0.is_incomplete(i0) { "\\ No newline at end of file\n" } else { "" };
                    let bytes = expand_line_tabs(cfg, side0.line_bytes(i0));
                    let prefix = body_line_prefix(cfg, ' ', &bytes);
                    write!(out, "{prefix}{}\n{marker}", lossy(&bytes)).map_err(io_err(side0))?;
                }
                BodyLine::Delete(i0, changed) => {
                    let (marker_char, role) = if changed { ('!', ColorRole::Changed) } else { ('-', ColorRole::Deleted) };
                    let marker = if side0.is_incomplete(i0) { "\\ No newline at end of file\n" } else { "" };
                    let bytes = expand_line_tabs(cfg, side0.line_bytes(i0));
                    let prefix = body_line_prefix(cfg, marker_char, &bytes);
                    let text = color(cfg, role, &format!("{prefix}{}", lossy(&bytes)));
                    write!(out, "{text}\n{marker}").map_err(io_err(side0))?;
                }
                BodyLine::Insert(..) => {}
            }
        }
    }

    writeln!(
        out,
        "{}",
        color(cfg, ColorRole::LineNumber, &format!("--- {} ----", range_compat(start1, end1.saturating_sub(start1))))
    )
    .map_err(io_err(side1))?;

    let any_new = body
        .iter()
        .any(|b| matches!(b, BodyLine::Context(..) | BodyLine::Insert(..)));
    if any_new {
        for line in body {
            match *line {
                BodyLine::Context(_, i1) => {
                    let marker = if side1.is_incomplete(i1) { "\\ No newline at end of file\n" } else { "" };
                    let bytes = expand_line_tabs(cfg, side1.line_bytes(i1));
                    let prefix = body_line_prefix(cfg, ' ', &bytes);
                    write!(out, "{prefix}{}\n{marker}", lossy(&bytes)).map_err(io_err(side1))?;
                }
                BodyLine::Insert(i1, changed) => {
                    let (marker_char, role) = if changed { ('!', ColorRole::Changed) } else { ('+', ColorRole::Added) };
                    let marker = if side1.is_incomplete(i1) { "\\ No newline at end of file\n" } else { "" };
                    let bytes = expand_line_tabs(cfg, side1.line_bytes(i1));
                    let prefix = body_line_prefix(cfg, marker_char, &bytes);
                    let text = color(cfg, role, &format!("{prefix}{}", lossy(&bytes)));
                    write!(out, "{text}\n{marker}").map_err(io_err(side1))?;
                }
                BodyLine::Delete(..) => {}
            }
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn write_unified_hunk(
    out: &mut dyn Write,
    side0: &Side,
    side1: &Side,
    cfg: &Config,
    body: &[BodyLine],
    start0: usize,
    end0: usize,
    start1: usize,
    end1: usize,
    func_suffix: &str,
) -> Result<(), DiffError> {
    let header = format!(
        "@@ -{} +{} @@{func_suffix}",
        unified_range(start0, end0.saturating_sub(start0)),
        unified_range(start1, end1.saturating_sub(start1)),
    );
    writeln!(out, "{}", color(cfg, ColorRole::LineNumber, &header)).map_err(io_err(side0))?;

    // Unified format's prefix is always a single character (no trailing
    // space/tab column to swap), so `-T`/`--initial-tab` doesn't apply
    // here; only tab-expansion of the line's own text does.
    for line in body {
        match *line {
            BodyLine::Context(i0, _) => {
                let marker = if side0.is_incomplete(i0) { "\\ No newline at end of file\n" } else { "" };
                let bytes = expand_line_tabs(cfg, side0.line_bytes(i0));
                write!(out, " {}\n{marker}", lossy(&bytes)).map_err(io_err(side0))?;
            }
            BodyLine::Delete(i0, _) => {
                let marker = if side0.is_incomplete(i0) { "\\ No newline at end of file\n" } else { "" };
                let bytes = expand_line_tabs(cfg, side0.line_bytes(i0));
                let text = color(cfg, ColorRole::Deleted, &format!("-{}", lossy(&bytes)));
                write!(out, "{text}\n{marker}").map_err(io_err(side0))?;
            }
            BodyLine::Insert(i1, _) => {
                let marker = if side1.is_incomplete(i1) { "\\ No newline at end of file\n" } else { "" };
                let bytes = expand_line_tabs(cfg, side1.line_bytes(i1));
                let text = color(cfg, ColorRole::Added, &format!("+{}", lossy(&bytes)));
                write!(out, "{text}\n{marker}").map_err(io_err(side1))?;
            }
        }
    }
    Ok(())
}

fn range_compat(start0: usize, count: usize) -> String {
    if count == 0 {
        format!("{start0}")
    } else if count == 1 {
        format!("{}", start0 + 1)
    } else {
        format!("{},{}", start0 + 1, start0 + count)
    }
}

fn label(side: &Side, cfg: &Config, index: usize) -> String {
    let name = cfg.labels[index].clone().unwrap_or_else(|| side.name.clone());
    format!("{name}\t{}", timestamp(side.mtime, cfg))
}

fn timestamp(mtime: Option<SystemTime>, cfg: &Config) -> String {
    let time: DateTime<Local> = mtime.unwrap_or_else(SystemTime::now).into();
    match &cfg.time_format {
        Some(fmt) => time.format(fmt).to_string(),
        None => {
            let nanos = time.timestamp_subsec_nanos();
            if nanos == 0 {
                time.format("%Y-%m-%d %H:%M:%S %z").to_string()
            } else {
                time.format("%Y-%m-%d %H:%M:%S.%f %z").to_string()
            }
        }
    }
}

fn lossy(bytes: &[u8]) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

fn io_err(side: &Side) -> impl Fn(std::io::Error) -> DiffError + '_ {
    move |e| DiffError::io(side.name.clone(), e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::build_changes;

    #[test]
    fn scenario_two_unified_empty_new_side() {
        let mut cfg = Config::default();
        cfg.context = 0;
        let side0 = Side::from_bytes("a", b"x\n", &cfg);
        let side1 = Side::from_bytes("b", b"", &cfg);
        let changed0 = [true];
        let changed1: [bool; 0] = [];
        let head = build_changes(&changed0, &changed1);

        let mut buf = Vec::new();
        write(&mut buf, &side0, &side1, &head, &cfg, Style::Unified).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("@@ -1 +0,0 @@\n-x\n"), "got: {text}");
    }

    #[test]
    fn initial_tab_replaces_the_space_before_context_and_marker_lines() {
        let cfg = Config {
            initial_tab: true,
            context: 1,
            ..Config::default()
        };
        let side0 = Side::from_bytes("a", b"x\ny\n", &cfg);
        let side1 = Side::from_bytes("b", b"x\nY\n", &cfg);
        let head = build_changes(&[false, true], &[false, true]);

        let mut buf = Vec::new();
        write(&mut buf, &side0, &side1, &head, &cfg, Style::Context).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\tx\n"), "got: {text}");
        assert!(text.contains("!\ty\n"), "got: {text}");
        assert!(text.contains("!\tY\n"), "got: {text}");
    }

    #[test]
    fn suppress_blank_empty_drops_the_prefix_on_blank_lines() {
        let cfg = Config {
            suppress_blank_empty: true,
            context: 1,
            ..Config::default()
        };
        let side0 = Side::from_bytes("a", b"\ny\n", &cfg);
        let side1 = Side::from_bytes("b", b"\nY\n", &cfg);
        let head = build_changes(&[false, true], &[false, true]);

        let mut buf = Vec::new();
        write(&mut buf, &side0, &side1, &head, &cfg, Style::Context).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("****\n\n"), "expected a bare blank context line, got: {text}");
    }

    #[test]
    fn color_always_wraps_unified_hunk_header_and_body() {
        let cfg = Config {
            color: crate::config::ColorMode::Always,
            context: 0,
            ..Config::default()
        };
        let side0 = Side::from_bytes("a", b"x\n", &cfg);
        let side1 = Side::from_bytes("b", b"", &cfg);
        let changed0 = [true];
        let changed1: [bool; 0] = [];
        let head = build_changes(&changed0, &changed1);

        let mut buf = Vec::new();
        write(&mut buf, &side0, &side1, &head, &cfg, Style::Unified).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\x1b["), "expected SGR codes, got: {text:?}");
        assert!(text.contains("\x1b[0m"));
    }
}
