//! Sdiff-assist format: line-count headers the side-by-side (`sdiff`)
//! driver consumes — `i<len0>,<len1>` for a common run, `c<len0>,<len1>`
//! for a change (spec §4.7 "Sdiff-assist").

use std::io::Write;

use crate::buffer::Side;
use crate::config::Config;
use crate::errors::DiffError;
use crate::script::{iter, Change};

use super::{color, ColorRole};

pub fn write(
    out: &mut dyn Write,
    side0: &Side,
    _side1: &Side,
    head: &Option<Box<Change>>,
    cfg: &Config,
) -> Result<(), DiffError> {
    let n0 = side0.line_count();
    let mut i0 = 0usize;

    for change in iter(head) {
        if change.line0 > i0 {
            let common = change.line0 - i0;
            writeln!(out, "{}", color(cfg, ColorRole::LineNumber, &format!("i{common},{common}")))
                .map_err(|e| DiffError::io(side0.name.clone(), e))?;
        }
        writeln!(out, "{}", color(cfg, ColorRole::Changed, &format!("c{},{}", change.deleted, change.inserted)))
            .map_err(|e| DiffError::io(side0.name.clone(), e))?;
        i0 = change.line0 + change.deleted;
    }
    if i0 < n0 {
        let common = n0 - i0;
        writeln!(out, "{}", color(cfg, ColorRole::LineNumber, &format!("i{common},{common}")))
            .map_err(|e| DiffError::io(side0.name.clone(), e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::build_changes;

    #[test]
    fn emits_common_and_change_line_counts() {
        let cfg = Config::default();
        let side0 = Side::from_bytes("a", b"a\nb\nc\n", &cfg);
        let side1 = Side::from_bytes("b", b"a\nB\nc\n", &cfg);
        let head = build_changes(&[false, true, false], &[false, true, false]);

        let mut buf = Vec::new();
        write(&mut buf, &side0, &side1, &head, &cfg).unwrap();
        assert_eq!(buf, b"i1,1\nc1,1\ni1,1\n".to_vec());
    }

    #[test]
    fn color_always_wraps_command_lines() {
        let cfg = Config {
            color: crate::config::ColorMode::Always,
            ..Config::default()
        };
        let side0 = Side::from_bytes("a", b"a\nb\nc\n", &cfg);
        let side1 = Side::from_bytes("b", b"a\nB\nc\n", &cfg);
        let head = build_changes(&[false, true, false], &[false, true, false]);

        let mut buf = Vec::new();
        write(&mut buf, &side0, &side1, &head, &cfg).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\x1b["), "expected SGR codes, got: {text:?}");
    }
}
