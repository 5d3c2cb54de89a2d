//! Ed (`-e`) and forward-ed (`-f`) formats: emit `ed`-style `a`/`c`/`d`
//! commands. `-e` orders them bottom-to-top so earlier addresses aren't
//! invalidated by later commands; `-f` keeps top-to-bottom order (spec
//! §4.7 "Ed"/"Forward-ed").

use std::io::Write;

use crate::buffer::Side;
use crate::config::Config;
use crate::errors::DiffError;
use crate::script::{iter, Change};

use super::{color, color_bytes, ColorRole};

pub fn write(
    out: &mut dyn Write,
    side0: &Side,
    side1: &Side,
    head: &Option<Box<Change>>,
    cfg: &Config,
    forward: bool,
) -> Result<(), DiffError> {
    if side0.missing_newline || side1.missing_newline {
        return Err(DiffError::EdNotRobust);
    }

    let changes: Vec<&Change> = iter(head).filter(|c| !c.ignore).collect();
    let ordered: Vec<&&Change> = if forward {
        changes.iter().collect()
    } else {
        changes.iter().rev().collect()
    };

    for change in ordered {
        let op = if change.deleted == 0 {
            'a'
        } else if change.inserted == 0 {
            'd'
        } else {
            'c'
        };
        let address = if op == 'a' {
            format!("{}", change.line0)
        } else if change.deleted == 1 {
            format!("{}", change.line0 + 1)
        } else {
            format!("{},{}", change.line0 + 1, change.line0 + change.deleted)
        };
        writeln!(out, "{}", color(cfg, ColorRole::LineNumber, &format!("{address}{op}")))
            .map_err(|e| DiffError::io(side0.name.clone(), e))?;

        if op != 'd' {
            for i in change.line1..change.line1 + change.inserted {
                color_bytes(out, cfg, ColorRole::Added, side1.line_bytes(i))
                    .and_then(|_| out.write_all(b"\n"))
                    .map_err(|e| DiffError::io(side1.name.clone(), e))?;
            }
            writeln!(out, ".").map_err(|e| DiffError::io(side1.name.clone(), e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::build_changes;

    #[test]
    fn reverse_order_emits_bottom_hunk_first() {
        let cfg = Config::default();
        let side0 = Side::from_bytes("a", b"a\nb\nc\n", &cfg);
        let side1 = Side::from_bytes("b", b"a\nB\nc\n", &cfg);
        let changed0 = [false, true, false];
        let changed1 = [false, true, false];
        let head = build_changes(&changed0, &changed1);

        let mut buf = Vec::new();
        write(&mut buf, &side0, &side1, &head, &cfg, false).unwrap();
        assert_eq!(buf, b"2c\nB\n.\n");
    }

    #[test]
    fn color_always_wraps_address_and_inserted_lines() {
        let cfg = Config {
            color: crate::config::ColorMode::Always,
            ..Config::default()
        };
        let side0 = Side::from_bytes("a", b"a\nb\nc\n", &cfg);
        let side1 = Side::from_bytes("b", b"a\nB\nc\n", &cfg);
        let changed0 = [false, true, false];
        let changed1 = [false, true, false];
        let head = build_changes(&changed0, &changed1);

        let mut buf = Vec::new();
        write(&mut buf, &side0, &side1, &head, &cfg, false).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\x1b["), "expected SGR codes, got: {text:?}");
    }

    #[test]
    fn rejects_missing_trailing_newline() {
        let cfg = Config::default();
        let side0 = Side::from_bytes("a", b"a\nb\nc\n", &cfg);
        let side1 = Side::from_bytes("b", b"a\nb\nc", &cfg);
        let head = build_changes(&[false, false, false], &[false, false, false]);
        let mut buf = Vec::new();
        let err = write(&mut buf, &side0, &side1, &head, &cfg, false).unwrap_err();
        assert!(matches!(err, DiffError::EdNotRobust));
    }
}
