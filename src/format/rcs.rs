//! RCS (`-n`) format: forward-ed variant with line-count commands
//! (`a<line> <count>` / `d<line> <count>`), no `.` terminator (spec §4.7
//! "RCS").

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
) -> Result<(), DiffError> {
    for change in iter(head) {
        if change.ignore {
            continue;
        }
        if change.deleted > 0 {
            writeln!(out, "{}", color(cfg, ColorRole::LineNumber, &format!("d{} {}", change.line0 + 1, change.deleted)))
                .map_err(|e| DiffError::io(side0.name.clone(), e))?;
        }
        if change.inserted > 0 {
            // The insert address follows the deletion GNU diff `-n` already
            // applied at this point, i.e. it's offset by the deleted count.
            let insert_at = change.line0 + change.deleted;
            writeln!(out, "{}", color(cfg, ColorRole::LineNumber, &format!("a{insert_at} {}", change.inserted)))
                .map_err(|e| DiffError::io(side0.name.clone(), e))?;
            for i in change.line1..change.line1 + change.inserted {
                color_bytes(out, cfg, ColorRole::Added, side1.line_bytes(i))
                    .and_then(|_| out.write_all(b"\n"))
                    .map_err(|e| DiffError::io(side1.name.clone(), e))?;
            }
        }
    }
    Ok(())
}
