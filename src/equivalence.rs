//! Line Hasher (C2): assign an equivalence-class integer to every line of
//! both sides, honoring the configured whitespace/case rules, so the
//! differ never has to re-compare raw bytes.
//!
//! Grounded on `original_source/liboccoder/Diff/diffutils/io.c`'s
//! `equivclass`/hash-table machinery. Per spec §9 Design Notes, the
//! negative "incomplete-line" bucket is replaced here with two ordinary
//! hash maps rather than one chained array with a `-1` bucket.

use std::collections::HashMap;

use bstr::ByteSlice;

use crate::buffer::Side;
use crate::config::{Config, WhitespaceMode};

/// Equivalence class id. `0` is reserved and never assigned (spec §3).
pub type EquivClass = u32;

/// Rotate-left-7 rolling hash over normalized characters (spec §4.2).
/// Two lines the equivalence predicate considers equal always normalize
/// to the same byte string and therefore always hash equal here.
pub fn rol7_hash(normalized: &[u8]) -> u64 {
    let mut h: u64 = 0;
    for &c in normalized {
        h = h.rotate_left(7).wrapping_add(c as u64);
    }
    h
}

/// Normalize a line's bytes according to the active whitespace/case rules.
/// The result is only meaningful for equality/hash purposes; it is not the
/// text that gets printed.
pub fn normalize(line: &[u8], cfg: &Config) -> Vec<u8> {
    let folded: std::borrow::Cow<[u8]> = if cfg.ignore_case {
        std::borrow::Cow::Owned(fold_case(line))
    } else {
        std::borrow::Cow::Borrowed(line)
    };
    let folded = folded.as_ref();

    let expanded: std::borrow::Cow<[u8]> = match cfg.whitespace {
        WhitespaceMode::IgnoreTabExpansion | WhitespaceMode::IgnoreTabExpansionAndTrailingSpace => {
            std::borrow::Cow::Owned(expand_tabs(folded, cfg.tabsize))
        }
        _ => std::borrow::Cow::Borrowed(folded),
    };
    let expanded = expanded.as_ref();

    match cfg.whitespace {
        WhitespaceMode::IgnoreAllSpace => expanded
            .iter()
            .copied()
            .filter(|c| !c.is_ascii_whitespace())
            .collect(),
        WhitespaceMode::IgnoreSpaceChange => collapse_space_runs(expanded),
        WhitespaceMode::IgnoreTrailingSpace | WhitespaceMode::IgnoreTabExpansionAndTrailingSpace => {
            trim_trailing_space(expanded).to_vec()
        }
        WhitespaceMode::IgnoreTabExpansion | WhitespaceMode::Exact => expanded.to_vec(),
    }
}

fn fold_case(line: &[u8]) -> Vec<u8> {
    match line.to_str() {
        Ok(s) => s.to_lowercase().into_bytes(),
        // Invalid UTF-8: fold what we can byte-wise; an encoding error
        // compares only to itself at the same position (spec §4.2).
        Err(_) => line.iter().map(|b| b.to_ascii_lowercase()).collect(),
    }
}

fn expand_tabs(line: &[u8], tabsize: usize) -> Vec<u8> {
    let tabsize = tabsize.max(1);
    let mut out = Vec::with_capacity(line.len());
    let mut col = 0usize;
    for &c in line {
        match c {
            b'\t' => {
                let spaces = tabsize - (col % tabsize);
                out.extend(std::iter::repeat(b' ').take(spaces));
                col += spaces;
            }
            b'\r' | b'\x08' => {
                // Carriage return / backspace: reset the simulated column
                // like the reference's column tracker, but keep the byte
                // so it still participates in equality.
                out.push(c);
                col = 0;
            }
            _ => {
                out.push(c);
                col += 1;
            }
        }
    }
    out
}

fn collapse_space_runs(line: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(line.len());
    let mut i = 0;
    while i < line.len() {
        if line[i].is_ascii_whitespace() {
            let start = i;
            while i < line.len() && line[i].is_ascii_whitespace() {
                i += 1;
            }
            if i < line.len() {
                out.push(b' ');
            }
            let _ = start;
        } else {
            out.push(line[i]);
            i += 1;
        }
    }
    out
}

fn trim_trailing_space(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && line[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    &line[..end]
}

#[derive(PartialEq, Eq, Hash)]
struct NormKey(Vec<u8>);

/// Two logical tables: "main" for complete lines, "incomplete" for the
/// trailing line of a file missing its final newline. A line in one table
/// can never equal a line in the other, however similar their bytes,
/// because their class ids are drawn from disjoint maps (spec §4.2,
/// §9 Design Notes).
#[derive(Default)]
pub struct EquivalenceTable {
    main: HashMap<NormKey, EquivClass>,
    incomplete: HashMap<NormKey, EquivClass>,
    next_class: EquivClass,
}

impl EquivalenceTable {
    pub fn new() -> Self {
        EquivalenceTable {
            main: HashMap::new(),
            incomplete: HashMap::new(),
            next_class: 1, // 0 is reserved (spec §3)
        }
    }

    fn class_for(&mut self, normalized: Vec<u8>, incomplete: bool) -> EquivClass {
        let table = if incomplete {
            &mut self.incomplete
        } else {
            &mut self.main
        };
        let key = NormKey(normalized);
        if let Some(&class) = table.get(&key) {
            return class;
        }
        let class = self.next_class;
        self.next_class += 1;
        (if incomplete {
            &mut self.incomplete
        } else {
            &mut self.main
        })
        .insert(key, class);
        class
    }
}

/// Compute equivalence-class vectors for both sides jointly, so identical
/// lines on either side land in the same class (spec §3 "Equivalence
/// vectors").
pub fn compute_equivalences(
    side0: &Side,
    side1: &Side,
    cfg: &Config,
) -> (Vec<EquivClass>, Vec<EquivClass>) {
    let mut table = EquivalenceTable::new();
    let equivs0 = (0..side0.line_count())
        .map(|i| {
            let normalized = normalize(side0.line_bytes(i), cfg);
            table.class_for(normalized, side0.is_incomplete(i))
        })
        .collect();
    let equivs1 = (0..side1.line_count())
        .map(|i| {
            let normalized = normalize(side1.line_bytes(i), cfg);
            table.class_for(normalized, side1.is_incomplete(i))
        })
        .collect();
    (equivs0, equivs1)
}
