//! Ifdef (`-D NAME`) format: emit a single merged file with
//! `#ifdef`/`#ifndef`/`#else`/`#endif` blocks marking each side's unique
//! lines (spec §4.7 "Ifdef", §6 "Ifdef format specifiers").
//!
//! Supports the `%<`/`%>`/`%=`/`%%`/`%c'X'` group-format specifiers and
//! `%L`/`%l`/`%c'X'` line-format specifiers, with `%<`/`%>` spans colored
//! as deleted/added when `cfg.color_enabled()`. The numeric
//! `%[-][W][.P]{doxX}LETTER` and `%(A=B?T:E)` forms are part of the
//! documented grammar (spec §6) but aren't implemented: the reference
//! source that defines their exact first/last/count/`F-1`/`L+1` semantics
//! isn't in this repository's corpus, so a format string that uses them is
//! rejected with [`DiffError::UnsupportedFormatSpecifier`] rather than
//! silently echoed or guessed at.

use std::io::Write;

use crate::buffer::Side;
use crate::config::Config;
use crate::errors::DiffError;
use crate::script::{iter, Change};

use super::{color_bytes, ColorRole};

pub fn write(
    out: &mut dyn Write,
    side0: &Side,
    side1: &Side,
    head: &Option<Box<Change>>,
    cfg: &Config,
) -> Result<(), DiffError> {
    let name = cfg.ifdef_name.as_deref().unwrap_or("UNDEFINED");
    let line_format = cfg.line_format.as_deref().unwrap_or("%L");

    let unchanged_fmt = cfg.unchanged_group_format.as_deref();
    let old_fmt = cfg
        .old_group_format
        .clone()
        .unwrap_or_else(|| format!("#ifndef {name}\n%<#endif /* not {name} */\n"));
    let new_fmt = cfg
        .new_group_format
        .clone()
        .unwrap_or_else(|| format!("#ifdef {name}\n%>#endif /* {name} */\n"));
    let changed_fmt = cfg.changed_group_format.clone().unwrap_or_else(|| {
        format!("#ifndef {name}\n%<#else /* {name} */\n%>#endif /* {name} */\n")
    });

    let n0 = side0.line_count();
    let mut i0 = 0usize;

    for change in iter(head) {
        while i0 < change.line0 && i0 < n0 {
            write_group_unchanged(out, cfg, side0, i0, change.line0, unchanged_fmt, line_format)?;
            i0 = change.line0;
        }
        let fmt = if change.deleted > 0 && change.inserted > 0 {
            &changed_fmt
        } else if change.deleted > 0 {
            &old_fmt
        } else {
            &new_fmt
        };
        write_group(out, cfg, side0, side1, change, fmt, line_format)?;

        i0 = change.line0 + change.deleted;
    }
    while i0 < n0 {
        write_group_unchanged(out, cfg, side0, i0, n0, unchanged_fmt, line_format)?;
        i0 = n0;
    }
    Ok(())
}

fn write_group_unchanged(
    out: &mut dyn Write,
    cfg: &Config,
    side0: &Side,
    start: usize,
    end: usize,
    fmt: Option<&str>,
    line_format: &str,
) -> Result<(), DiffError> {
    match fmt {
        Some(fmt) => interpret_group(out, cfg, fmt, side0, side0, &(start..end), &(0..0), line_format, side0),
        None => {
            for i in start..end {
                write_line_format(out, cfg, None, line_format, side0, i, side0)?;
            }
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn write_group(
    out: &mut dyn Write,
    cfg: &Config,
    side0: &Side,
    side1: &Side,
    change: &Change,
    fmt: &str,
    line_format: &str,
) -> Result<(), DiffError> {
    let old_range = change.line0..change.line0 + change.deleted;
    let new_range = change.line1..change.line1 + change.inserted;
    interpret_group(out, cfg, fmt, side0, side1, &old_range, &new_range, line_format, side0)
}

#[allow(clippy::too_many_arguments)]
fn interpret_group(
    out: &mut dyn Write,
    cfg: &Config,
    fmt: &str,
    side0: &Side,
    side1: &Side,
    old_range: &std::ops::Range<usize>,
    new_range: &std::ops::Range<usize>,
    line_format: &str,
    err_side: &Side,
) -> Result<(), DiffError> {
    let mut chars = fmt.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            write!(out, "{c}").map_err(|e| DiffError::io(err_side.name.clone(), e))?;
            continue;
        }
        match chars.next() {
            Some('<') => {
                for i in old_range.clone() {
                    write_line_format(out, cfg, Some(ColorRole::Deleted), line_format, side0, i, err_side)?;
                }
            }
            Some('>') => {
                for i in new_range.clone() {
                    write_line_format(out, cfg, Some(ColorRole::Added), line_format, side1, i, err_side)?;
                }
            }
            Some('=') => {
                for i in old_range.clone() {
                    write_line_format(out, cfg, None, line_format, side0, i, err_side)?;
                }
            }
            Some('%') => {
                write!(out, "%").map_err(|e| DiffError::io(err_side.name.clone(), e))?;
            }
            Some('c') => {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    if let Some(literal) = chars.next() {
                        write!(out, "{literal}").map_err(|e| DiffError::io(err_side.name.clone(), e))?;
                    }
                    if chars.peek() == Some(&'\'') {
                        chars.next();
                    }
                }
            }
            Some('(') => {
                return Err(DiffError::UnsupportedFormatSpecifier(format!("%({}", remaining_prefix(&mut chars))));
            }
            Some(other) if is_numeric_group_specifier_start(other) => {
                return Err(DiffError::UnsupportedFormatSpecifier(format!("%{other}{}", remaining_prefix(&mut chars))));
            }
            Some(other) => {
                write!(out, "%{other}").map_err(|e| DiffError::io(err_side.name.clone(), e))?;
            }
            None => {}
        }
    }
    Ok(())
}

/// A format letter that only appears as part of the numeric
/// `%[-][W][.P]{doxX}LETTER` group specifier (spec §6), used to detect and
/// reject that unimplemented form instead of echoing it literally.
fn is_numeric_group_specifier_start(c: char) -> bool {
    matches!(c, '-' | '.' | 'd' | 'o' | 'x' | 'X' | 'F' | 'L' | 'N' | 'E' | 'M') || c.is_ascii_digit()
}

/// A short, bounded lookahead used only to build a readable error message
/// for an unsupported specifier; does not consume from the real iterator.
fn remaining_prefix(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    chars.clone().take(8).collect()
}

fn write_line_format(
    out: &mut dyn Write,
    cfg: &Config,
    role: Option<ColorRole>,
    fmt: &str,
    side: &Side,
    index: usize,
    err_side: &Side,
) -> Result<(), DiffError> {
    let bytes = side.line_bytes(index);
    let no_newline = side.is_incomplete(index);
    let mut chars = fmt.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            write!(out, "{c}").map_err(|e| DiffError::io(err_side.name.clone(), e))?;
            continue;
        }
        match chars.next() {
            Some('L') => {
                write_maybe_colored(out, cfg, role, bytes).map_err(|e| DiffError::io(err_side.name.clone(), e))?;
                if !no_newline {
                    out.write_all(b"\n").map_err(|e| DiffError::io(err_side.name.clone(), e))?;
                }
            }
            Some('l') => {
                write_maybe_colored(out, cfg, role, bytes).map_err(|e| DiffError::io(err_side.name.clone(), e))?;
            }
            Some('c') => {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    if let Some(literal) = chars.next() {
                        write!(out, "{literal}").map_err(|e| DiffError::io(err_side.name.clone(), e))?;
                    }
                    if chars.peek() == Some(&'\'') {
                        chars.next();
                    }
                }
            }
            Some('%') => {
                write!(out, "%").map_err(|e| DiffError::io(err_side.name.clone(), e))?;
            }
            Some(other) => {
                write!(out, "%{other}").map_err(|e| DiffError::io(err_side.name.clone(), e))?;
            }
            None => {}
        }
    }
    Ok(())
}

fn write_maybe_colored(out: &mut dyn Write, cfg: &Config, role: Option<ColorRole>, bytes: &[u8]) -> std::io::Result<()> {
    match role {
        Some(role) => color_bytes(out, cfg, role, bytes),
        None => out.write_all(bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_old_and_new_only_lines_in_ifdef_blocks() {
        let cfg = Config {
            ifdef_name: Some("FOO".to_string()),
            ..Config::default()
        };
        let side0 = Side::from_bytes("a", b"same\nold\n", &cfg);
        let side1 = Side::from_bytes("b", b"same\nnew\n", &cfg);
        let head = crate::script::build_changes(&[false, true], &[false, true]);

        let mut buf = Vec::new();
        write(&mut buf, &side0, &side1, &head, &cfg).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("same\n"));
        assert!(text.contains("#ifndef FOO\nold\n#else /* FOO */\nnew\n#endif /* FOO */\n"));
    }

    #[test]
    fn rejects_numeric_group_specifier() {
        let cfg = Config {
            ifdef_name: Some("FOO".to_string()),
            old_group_format: Some("%<%3dF".to_string()),
            ..Config::default()
        };
        let side0 = Side::from_bytes("a", b"old\n", &cfg);
        let side1 = Side::from_bytes("b", b"", &cfg);
        let head = crate::script::build_changes(&[true], &[]);

        let mut buf = Vec::new();
        let err = write(&mut buf, &side0, &side1, &head, &cfg).unwrap_err();
        assert!(matches!(err, DiffError::UnsupportedFormatSpecifier(_)), "got: {err:?}");
    }

    #[test]
    fn rejects_ternary_specifier() {
        let cfg = Config {
            ifdef_name: Some("FOO".to_string()),
            old_group_format: Some("%(F=1?x:y)".to_string()),
            ..Config::default()
        };
        let side0 = Side::from_bytes("a", b"old\n", &cfg);
        let side1 = Side::from_bytes("b", b"", &cfg);
        let head = crate::script::build_changes(&[true], &[]);

        let mut buf = Vec::new();
        let err = write(&mut buf, &side0, &side1, &head, &cfg).unwrap_err();
        assert!(matches!(err, DiffError::UnsupportedFormatSpecifier(_)), "got: {err:?}");
    }
}
