//! Orchestration: wire C1 → C2 → C3 → C4 → C5 → (C6 during C7) → C7 into
//! the single entry point embedding tools call.

use std::io::Write;
use std::path::Path;

use regex::Regex;

use crate::analyze::mark_ignorable;
use crate::buffer::Side;
use crate::config::Config;
use crate::equivalence::compute_equivalences;
use crate::errors::DiffError;
use crate::format::write_script;
use crate::myers;
use crate::script::{build_changes, iter_mut, shift_boundaries};
use crate::trim::trim_ends;

/// The result of comparing one file pair (spec §4.7 "Exit status").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOutcome {
    /// Inputs are identical after normalization and the ignorability
    /// filter; nothing was written beyond an optional `-s` notice.
    Identical,
    /// Inputs differ and a script was written (or, under `-q`, a one-line
    /// notice was written in its place).
    Differs,
    /// At least one side was detected as binary; no text diff was
    /// attempted, and only a `Binary files ... differ` line (or nothing,
    /// if the bytes were equal) was written.
    BinaryDiffers,
}

impl DiffOutcome {
    /// Conventional diffutils exit status for this outcome (spec §4.7).
    pub fn exit_code(self) -> i32 {
        match self {
            DiffOutcome::Identical => 0,
            DiffOutcome::Differs | DiffOutcome::BinaryDiffers => 1,
        }
    }
}

/// Compare two files on disk and write the selected output format to
/// `out`. Directory traversal and stdin (`-`) handling are the embedding
/// tool's job (spec §1 "Out of scope"); this only ever compares exactly
/// two already-resolved paths.
pub fn diff_files(path0: &Path, path1: &Path, cfg: &Config, out: &mut dyn Write) -> Result<DiffOutcome, DiffError> {
    let side0 = Side::read_from_path(path0, cfg)?;
    let side1 = Side::read_from_path(path1, cfg)?;
    diff_sides(&side0, &side1, cfg, out)
}

/// Compare two already-prepared sides (spec §3 "Lifecycles": buffers live
/// for the duration of one file pair). Exposed directly so callers that
/// already hold in-memory buffers (e.g. directory recursion) don't need
/// to round-trip through the filesystem.
pub fn diff_sides(side0: &Side, side1: &Side, cfg: &Config, out: &mut dyn Write) -> Result<DiffOutcome, DiffError> {
    if side0.is_binary || side1.is_binary {
        tracing::debug!(a = %side0.name, b = %side1.name, "binary content detected, skipping text diff");
        return diff_binary(side0, side1, out);
    }

    let (equivs0, equivs1) = compute_equivalences(side0, side1, cfg);
    let trimmed = trim_ends(&equivs0, &equivs1, cfg.horizon_lines);

    let local = myers::diff(
        &equivs0[trimmed.start..trimmed.end0],
        &equivs1[trimmed.start..trimmed.end1],
        cfg,
    );

    let mut changed0 = vec![false; equivs0.len()];
    let mut changed1 = vec![false; equivs1.len()];
    changed0[trimmed.start..trimmed.end0].copy_from_slice(&local.a);
    changed1[trimmed.start..trimmed.end1].copy_from_slice(&local.b);

    let is_blank0 = |i: usize| side0.line_bytes(i).iter().all(u8::is_ascii_whitespace);
    let is_blank1 = |i: usize| side1.line_bytes(i).iter().all(u8::is_ascii_whitespace);
    shift_boundaries(&mut changed0, &equivs0, &is_blank0);
    shift_boundaries(&mut changed1, &equivs1, &is_blank1);

    let mut head = build_changes(&changed0, &changed1);

    let ignore_re = cfg
        .ignore_regexp
        .as_deref()
        .map(Regex::new)
        .transpose()
        .map_err(|e| DiffError::BadRegex {
            pattern: cfg.ignore_regexp.clone().unwrap_or_default(),
            source: e,
        })?;
    for change in iter_mut(&mut head) {
        mark_ignorable(change, side0, side1, cfg, ignore_re.as_ref());
    }

    let differs = crate::script::iter(&head).any(|c| !c.ignore);

    if !differs {
        tracing::debug!(a = %side0.name, b = %side1.name, "no non-ignorable changes, reporting identical");
        if cfg.report_identical {
            writeln!(out, "Files {} and {} are identical", side0.name, side1.name)
                .map_err(|e| DiffError::io(side0.name.clone(), e))?;
        }
        return Ok(DiffOutcome::Identical);
    }

    if cfg.brief {
        writeln!(out, "Files {} and {} differ", side0.name, side1.name)
            .map_err(|e| DiffError::io(side0.name.clone(), e))?;
        return Ok(DiffOutcome::Differs);
    }

    if !cfg.robust_output_style() && (side0.missing_newline || side1.missing_newline) {
        return Err(DiffError::EdNotRobust);
    }

    write_script(out, side0, side1, &head, cfg)?;
    Ok(DiffOutcome::Differs)
}

fn diff_binary(side0: &Side, side1: &Side, out: &mut dyn Write) -> Result<DiffOutcome, DiffError> {
    if side0.text == side1.text {
        return Ok(DiffOutcome::Identical);
    }
    writeln!(out, "Binary files {} and {} differ", side0.name, side1.name)
        .map_err(|e| DiffError::io(side0.name.clone(), e))?;
    Ok(DiffOutcome::BinaryDiffers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_property_holds_for_any_text() {
        let cfg = Config::default();
        let side = Side::from_bytes("a", b"a\nb\nc\n", &cfg);
        let mut out = Vec::new();
        let outcome = diff_sides(&side, &side, &cfg, &mut out).unwrap();
        assert_eq!(outcome, DiffOutcome::Identical);
        assert!(out.is_empty());
    }

    #[test]
    fn differing_inputs_report_differs() {
        let cfg = Config::default();
        let side0 = Side::from_bytes("a", b"a\nb\nc\n", &cfg);
        let side1 = Side::from_bytes("b", b"a\nB\nc\n", &cfg);
        let mut out = Vec::new();
        let outcome = diff_sides(&side0, &side1, &cfg, &mut out).unwrap();
        assert_eq!(outcome, DiffOutcome::Differs);
        assert_eq!(outcome.exit_code(), 1);
        assert!(!out.is_empty());
    }

    #[test]
    fn normalization_respect_with_ignore_case() {
        let cfg = Config {
            ignore_case: true,
            ..Config::default()
        };
        let side0 = Side::from_bytes("a", b"Hello\n", &cfg);
        let side1 = Side::from_bytes("b", b"hello\n", &cfg);
        let mut out = Vec::new();
        let outcome = diff_sides(&side0, &side1, &cfg, &mut out).unwrap();
        assert_eq!(outcome, DiffOutcome::Identical);
    }

    #[test]
    fn binary_inputs_are_detected_and_compared_by_bytes() {
        let cfg = Config::default();
        let side0 = Side::from_bytes("a", b"a\0b", &cfg);
        let side1 = Side::from_bytes("b", b"a\0c", &cfg);
        let mut out = Vec::new();
        let outcome = diff_sides(&side0, &side1, &cfg, &mut out).unwrap();
        assert_eq!(outcome, DiffOutcome::BinaryDiffers);
        assert!(String::from_utf8_lossy(&out).contains("Binary files"));
    }

    #[test]
    fn ed_format_rejects_missing_trailing_newline() {
        let cfg = Config {
            output_style: crate::config::OutputStyle::Ed,
            ..Config::default()
        };
        let side0 = Side::from_bytes("a", b"a\nb\nc\n", &cfg);
        let side1 = Side::from_bytes("b", b"a\nb\nc", &cfg);
        let mut out = Vec::new();
        let err = diff_sides(&side0, &side1, &cfg, &mut out).unwrap_err();
        assert!(matches!(err, DiffError::EdNotRobust));
    }
}
