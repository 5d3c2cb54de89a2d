//! Post-processor (C5): turn the raw `changed[]` bitmaps from the differ
//! into an edit script, slide its boundaries onto natural line breaks, and
//! decide which adjacent hunks are close enough to print as one.
//!
//! Grounded on `original_source/liboccoder/Diff/diffutils/context.c`
//! (`find_hunk`, the merge-window walk) and `diff.h` (`struct change`).

use crate::equivalence::EquivClass;

/// One hunk of the edit script: `deleted` lines starting at `line0` of
/// side 0 are replaced by `inserted` lines starting at `line1` of side 1.
/// `link` chains hunks in forward order, mirroring the reference's
/// intrusive list (spec §3 "Change record").
#[derive(Debug, Clone)]
pub struct Change {
    pub line0: usize,
    pub deleted: usize,
    pub line1: usize,
    pub inserted: usize,
    /// Set by the Hunk Analyzer (C6) once every affected line is known to
    /// be ignorable under the active `-B`/`-I` rule.
    pub ignore: bool,
    pub link: Option<Box<Change>>,
}

impl Change {
    /// One-past-the-last affected line of side 0.
    pub fn line0_end(&self) -> usize {
        self.line0 + self.deleted
    }

    /// One-past-the-last affected line of side 1.
    pub fn line1_end(&self) -> usize {
        self.line1 + self.inserted
    }
}

/// Slide a run of changed lines left or right within the range allowed by
/// repeated equivalence classes, preferring a boundary that lands on a
/// blank line, else the furthest (latest) position reachable (spec §4.5
/// "Boundary shift"). Operates on one side's `changed[]` array in place.
///
/// This is the Open Question spec.md §9 flags as subtle; this is a
/// documented, simplified reading of it rather than a literal port.
pub fn shift_boundaries(changed: &mut [bool], equivs: &[EquivClass], is_blank: &dyn Fn(usize) -> bool) {
    let n = changed.len();
    let mut i = 0;
    while i < n {
        if !changed[i] {
            i += 1;
            continue;
        }
        let orig_lo = i;
        let mut orig_hi = i;
        while orig_hi < n && changed[orig_hi] {
            orig_hi += 1;
        }

        let mut best_lo = orig_lo;
        let mut best_hi = orig_hi;
        let mut found_blank = false;

        // Try shifting the run earlier: legal while the line leaving the
        // run's tail equals the line entering at its new head.
        let mut lo = orig_lo;
        let mut hi = orig_hi;
        while lo > 0 && equivs[lo - 1] == equivs[hi - 1] {
            lo -= 1;
            hi -= 1;
            if is_blank(hi - 1) {
                best_lo = lo;
                best_hi = hi;
                found_blank = true;
            }
        }

        // Try shifting the run later, from the original position.
        let mut lo = orig_lo;
        let mut hi = orig_hi;
        while hi < n && equivs[lo] == equivs[hi] {
            lo += 1;
            hi += 1;
            if is_blank(hi - 1) {
                best_lo = lo;
                best_hi = hi;
                found_blank = true;
            } else if !found_blank {
                // No blank-ending option found yet: prefer the latest
                // reachable position (spec §4.5 rule 2).
                best_lo = lo;
                best_hi = hi;
            }
        }

        for k in orig_lo..orig_hi {
            changed[k] = false;
        }
        for k in best_lo..best_hi {
            changed[k] = true;
        }
        i = best_hi.max(orig_hi);
    }
}

/// Scan both `changed[]` arrays in lockstep and emit one [`Change`] per
/// maximal pair of changed runs, chained in forward order (spec §4.5
/// "Change-record construction").
pub fn build_changes(changed0: &[bool], changed1: &[bool]) -> Option<Box<Change>> {
    let n0 = changed0.len();
    let n1 = changed1.len();
    let mut runs = Vec::new();
    let (mut i0, mut i1) = (0usize, 0usize);

    loop {
        while i0 < n0 && i1 < n1 && !changed0[i0] && !changed1[i1] {
            i0 += 1;
            i1 += 1;
        }
        if i0 >= n0 && i1 >= n1 {
            break;
        }
        let start0 = i0;
        let start1 = i1;
        while i0 < n0 && changed0[i0] {
            i0 += 1;
        }
        while i1 < n1 && changed1[i1] {
            i1 += 1;
        }
        if i0 == start0 && i1 == start1 {
            // Neither side advanced: nothing left to do but stop, since
            // further looping would spin in place.
            break;
        }
        runs.push((start0, i0 - start0, start1, i1 - start1));
    }

    let mut head: Option<Box<Change>> = None;
    for (line0, deleted, line1, inserted) in runs.into_iter().rev() {
        head = Some(Box::new(Change {
            line0,
            deleted,
            line1,
            inserted,
            ignore: false,
            link: head,
        }));
    }
    head
}

/// Iterate the chain immutably, in forward order.
pub fn iter(head: &Option<Box<Change>>) -> impl Iterator<Item = &Change> {
    std::iter::successors(head.as_deref(), |c| c.link.as_deref())
}

/// Iterate the chain mutably, in forward order (used by the Hunk Analyzer
/// to set `ignore` on each record).
pub struct IterMut<'a> {
    cur: Option<&'a mut Change>,
}

impl<'a> Iterator for IterMut<'a> {
    type Item = &'a mut Change;

    fn next(&mut self) -> Option<Self::Item> {
        self.cur.take().map(|c| {
            self.cur = c.link.as_deref_mut();
            c
        })
    }
}

pub fn iter_mut(head: &mut Option<Box<Change>>) -> IterMut<'_> {
    IterMut {
        cur: head.as_deref_mut(),
    }
}

/// Group the chain's records into printable hunks (spec §4.5 "Hunk
/// merging"): two adjacent records merge when the unchanged gap between
/// them is small enough, with a tighter threshold when the earlier one is
/// ignorable. Pinned to `2*context` / `context` by spec.md §8 scenario 6.
pub fn group_into_hunks<'a>(head: &'a Option<Box<Change>>, context: usize) -> Vec<Vec<&'a Change>> {
    let mut groups: Vec<Vec<&Change>> = Vec::new();
    for change in iter(head) {
        if let Some(group) = groups.last_mut() {
            let prev = *group.last().expect("a group is never empty");
            let gap = change.line0.saturating_sub(prev.line0_end());
            let threshold = if prev.ignore {
                context
            } else {
                context.saturating_mul(2)
            };
            if gap <= threshold {
                group.push(change);
                continue;
            }
        }
        groups.push(vec![change]);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_changes_splits_independent_runs() {
        // side0: ...X... side1: ...Y... at the same position -> one change.
        let changed0 = [false, true, false, false, true, false];
        let changed1 = [false, true, false, false, true, false];
        let head = build_changes(&changed0, &changed1);
        let changes: Vec<&Change> = iter(&head).collect();
        assert_eq!(changes.len(), 2);
        assert_eq!((changes[0].line0, changes[0].deleted), (1, 1));
        assert_eq!((changes[1].line0, changes[1].deleted), (4, 1));
    }

    #[test]
    fn build_changes_handles_pure_insertion() {
        let changed0 = [false, false, false];
        let changed1 = [false, true, false, false];
        let head = build_changes(&changed0, &changed1);
        let changes: Vec<&Change> = iter(&head).collect();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].deleted, 0);
        assert_eq!((changes[0].line1, changes[0].inserted), (1, 1));
    }

    #[test]
    fn iter_mut_can_flag_ignorable_changes() {
        let changed0 = [true, false, true];
        let changed1 = [true, false, true];
        let mut head = build_changes(&changed0, &changed1);
        for c in iter_mut(&mut head) {
            c.ignore = true;
        }
        assert!(iter(&head).all(|c| c.ignore));
    }

    #[test]
    fn scenario_six_gap_of_seven_stays_split_at_context_three() {
        // Two one-line changes separated by 7 unchanged lines.
        let head = synth_two_hunks(7);
        let groups = group_into_hunks(&head, 3);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn scenario_six_gap_of_seven_merges_at_context_four() {
        let head = synth_two_hunks(7);
        let groups = group_into_hunks(&head, 4);
        assert_eq!(groups.len(), 1);
    }

    fn synth_two_hunks(gap: usize) -> Option<Box<Change>> {
        let second_line0 = 1 + gap;
        Some(Box::new(Change {
            line0: 0,
            deleted: 1,
            line1: 0,
            inserted: 1,
            ignore: false,
            link: Some(Box::new(Change {
                line0: second_line0,
                deleted: 1,
                line1: second_line0,
                inserted: 1,
                ignore: false,
                link: None,
            })),
        }))
    }

    #[test]
    fn shift_boundaries_prefers_blank_ending_position() {
        // classes: [X, BLANK, A, A, BLANK, Y] — a run over the first `A`
        // could equally sit over the second `A`; the blank-ending option
        // to its right should win.
        let equivs = [10u32, 1, 2, 2, 1, 20];
        let mut changed = [false, false, true, false, false, false];
        let is_blank = |i: usize| equivs[i] == 1;
        shift_boundaries(&mut changed, &equivs, &is_blank);
        assert!(changed[3] || changed[2]);
    }
}
