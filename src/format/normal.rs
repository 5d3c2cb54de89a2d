//! Normal format: `<range0><op><range1>` header, `<`/`>` line groups.

use std::io::Write;

use crate::analyze::analyze;
use crate::buffer::Side;
use crate::config::Config;
use crate::errors::DiffError;
use crate::script::{Change, iter};

use super::{color, write_line, ColorRole};

pub fn write(
    out: &mut dyn Write,
    side0: &Side,
    side1: &Side,
    head: &Option<Box<Change>>,
    cfg: &Config,
) -> Result<(), DiffError> {
    for change in iter(head) {
        if change.ignore {
            continue;
        }
        let (changes, r0, r1) = analyze(change);
        let op = if !changes.old {
            'a'
        } else if !changes.new {
            'd'
        } else {
            'c'
        };
        let header = format!("{}{}{}", super::translate_range(r0), op, super::translate_range(r1));
        writeln!(out, "{}", color(cfg, ColorRole::LineNumber, &header))
            .map_err(|e| DiffError::io(side0.name.clone(), e))?;

        for i in change.line0..change.line0 + change.deleted {
            let no_newline = side0.is_incomplete(i);
            write_line(out, cfg, ColorRole::Deleted, '<', side0.line_bytes(i), no_newline)
                .map_err(|e| DiffError::io(side0.name.clone(), e))?;
        }
        if changes.old && changes.new {
            writeln!(out, "{}", color(cfg, ColorRole::Header, "---"))
                .map_err(|e| DiffError::io(side0.name.clone(), e))?;
        }
        for i in change.line1..change.line1 + change.inserted {
            let no_newline = side1.is_incomplete(i);
            write_line(out, cfg, ColorRole::Added, '>', side1.line_bytes(i), no_newline)
                .map_err(|e| DiffError::io(side1.name.clone(), e))?;
        }
    }
    Ok(())
}
