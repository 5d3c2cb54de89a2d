//! Core Differ (C4): the shortest-edit-script algorithm.
//!
//! This is the crate's central deliverable. It implements Myers' O(ND)
//! algorithm in its classic trace-based formulation: successive edit
//! distances `d` are explored greedily, the furthest-reaching `x` on each
//! diagonal is recorded, and the edit script is recovered by walking the
//! recorded trace backward from the end.
//!
//! Spec §4.4 describes GNU diffutils' bidirectional, linear-space variant
//! of the same algorithm (forward and backward frontiers meeting in the
//! middle, recursing on the two halves). This implementation computes the
//! same mathematically shortest script through a single forward search
//! instead — see DESIGN.md for why that tradeoff was made here. Both
//! formulations satisfy the correctness properties in spec §8; this one
//! additionally respects the same cost-bound contract (spec §4.4,
//! "Cost bound") for large low-density inputs, so memory stays bounded on
//! pathological cases even though it isn't O(N) like the reference.

use std::collections::HashMap;

use crate::config::Config;
use crate::equivalence::EquivClass;

/// One step of the recovered edit script, in terms of absolute indices
/// into the (already discard-filtered) input slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Delete(usize),
    Insert(usize),
}

/// Two boolean arrays, one per side, `true` at every index that
/// participates in the edit script (spec §4.4 "Output").
pub struct Changed {
    pub a: Vec<bool>,
    pub b: Vec<bool>,
}

/// Compute the edit script between two equivalence-class sequences and
/// return which positions of each side changed.
pub fn diff(a: &[EquivClass], b: &[EquivClass], cfg: &Config) -> Changed {
    if cfg.minimal {
        diff_sequences(a, b, cfg)
    } else {
        let discard = discard_confusing_lines(a, b);
        let ua: Vec<EquivClass> = discard.kept_a.iter().map(|&i| a[i]).collect();
        let ub: Vec<EquivClass> = discard.kept_b.iter().map(|&i| b[i]).collect();
        let sub = diff_sequences(&ua, &ub, cfg);

        let mut changed_a = vec![false; a.len()];
        let mut changed_b = vec![false; b.len()];
        for (virt, &real) in discard.kept_a.iter().enumerate() {
            changed_a[real] = sub.a[virt];
        }
        for (virt, &real) in discard.kept_b.iter().enumerate() {
            changed_b[real] = sub.b[virt];
        }
        Changed {
            a: changed_a,
            b: changed_b,
        }
    }
}

/// Run Myers' algorithm directly over `a`/`b` with no discard pass.
fn diff_sequences(a: &[EquivClass], b: &[EquivClass], cfg: &Config) -> Changed {
    let n = a.len() as isize;
    let m = b.len() as isize;

    let too_expensive = cost_bound(a.len(), b.len(), cfg);
    let (trace, x, y) = shortest_edit(a, b, too_expensive);
    let mut ops = backtrack(&trace, x, y);
    for i in x..n {
        ops.push(Op::Delete(i as usize));
    }
    for j in y..m {
        ops.push(Op::Insert(j as usize));
    }

    let mut changed_a = vec![false; a.len()];
    let mut changed_b = vec![false; b.len()];
    for op in ops {
        match op {
            Op::Delete(i) => changed_a[i] = true,
            Op::Insert(j) => changed_b[j] = true,
        }
    }
    Changed {
        a: changed_a,
        b: changed_b,
    }
}

/// §4.4 "Cost bound": the number of edit-distance steps worth exploring
/// before giving up on minimality. `--speed-large-files`/`-H` halves it;
/// otherwise it's `2 * isqrt(n + m)`. Both formulas are recorded here as
/// the versioned answer to the Open Question in spec §9.
///
/// `-d`/`Config.minimal` disables the heuristic entirely rather than just
/// skipping the discard pass: it returns `isize::MAX` here so
/// `shortest_edit`'s `too_expensive.clamp(0, max_d)` always lands on the
/// true exhaustive bound `max_d`, guaranteeing a minimal script even on
/// large, low-density inputs that would otherwise hit the cutoff.
fn cost_bound(n: usize, m: usize, cfg: &Config) -> isize {
    if cfg.minimal {
        return isize::MAX;
    }
    let base = 2 * isqrt(n + m);
    let bound = if cfg.speed_large_files {
        isqrt(n + m).max(1)
    } else {
        base
    };
    bound as isize
}

fn isqrt(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

struct Trace {
    offset: usize,
    steps: Vec<Vec<isize>>,
}

impl Trace {
    fn idx(&self, k: isize) -> usize {
        (self.offset as isize + k) as usize
    }
}

/// Myers' greedy forward search. Returns the recorded trace plus the
/// `(x, y)` endpoint actually reached: `(a.len(), b.len())` if the search
/// completed, or an earlier snake if the cost bound was hit first.
fn shortest_edit(a: &[EquivClass], b: &[EquivClass], too_expensive: isize) -> (Trace, isize, isize) {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max_d = (n + m).max(1);
    let offset = max_d as usize;
    let mut v = vec![0isize; 2 * max_d as usize + 1];
    let mut steps: Vec<Vec<isize>> = Vec::new();

    let idx = |k: isize| (offset as isize + k) as usize;
    let limit = too_expensive.clamp(0, max_d);

    for d in 0..=limit {
        for k in (-d..=d).step_by(2) {
            let mut x = if k == -d || (k != d && v[idx(k - 1)] < v[idx(k + 1)]) {
                v[idx(k + 1)]
            } else {
                v[idx(k - 1)] + 1
            };
            let mut y = x - k;
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            v[idx(k)] = x;
            if x >= n && y >= m {
                steps.push(v.clone());
                return (Trace { offset, steps }, n, m);
            }
        }
        steps.push(v.clone());
    }

    // Cost bound reached: fall back to the diagonal that made the most
    // progress at the last explored distance (spec §4.4 "Cost bound").
    tracing::debug!(
        too_expensive,
        n,
        m,
        "Myers search hit the cost bound, falling back to best-effort diagonal"
    );
    let d = steps.len() as isize - 1;
    let last = steps.last().expect("at least one step was recorded");
    let mut best_k = -d;
    let mut best_progress = -1isize;
    for k in (-d..=d).step_by(2) {
        let x = last[idx(k)];
        let y = x - k;
        if x > n || y > m {
            continue;
        }
        if x + y > best_progress {
            best_progress = x + y;
            best_k = k;
        }
    }
    let x = last[idx(best_k)];
    let y = x - best_k;
    (Trace { offset, steps }, x, y)
}

/// Walk the recorded trace backward from `(x, y)` to `(0, 0)`, recovering
/// the edit script as a sequence of deletions and insertions (equal runs
/// are simply skipped — they need no representation in `Changed`).
fn backtrack(trace: &Trace, x_target: isize, y_target: isize) -> Vec<Op> {
    let mut x = x_target;
    let mut y = y_target;
    let mut ops = Vec::new();

    for d in (0..trace.steps.len()).rev() {
        let v = &trace.steps[d];
        let d = d as isize;
        let k = x - y;
        let idx = |k: isize| trace.idx(k);

        let prev_k = if k == -d || (k != d && v[idx(k - 1)] < v[idx(k + 1)]) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = v[idx(prev_k)];
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            x -= 1;
            y -= 1;
        }

        if d > 0 {
            if x == prev_x {
                ops.push(Op::Insert(prev_y as usize));
            } else {
                ops.push(Op::Delete(prev_x as usize));
            }
        }

        x = prev_x;
        y = prev_y;
    }

    ops.reverse();
    ops
}

/// Preliminary discard pass (spec §4.4 "Input"): lines whose equivalence
/// class is extremely common on both sides combined are dropped before
/// the differ runs, since a shortest script over them is almost certainly
/// not what a human wants to see. A kept line squeezed between two
/// discarded runs is folded back into the discard set, since an isolated
/// surviving line there is more likely noise than a real change.
struct Discard {
    kept_a: Vec<usize>,
    kept_b: Vec<usize>,
}

fn discard_confusing_lines(a: &[EquivClass], b: &[EquivClass]) -> Discard {
    let mut counts: HashMap<EquivClass, usize> = HashMap::new();
    for &c in a.iter().chain(b.iter()) {
        *counts.entry(c).or_insert(0) += 1;
    }

    let threshold = ((a.len() + b.len()) / 64).max(3);
    let mut discard_a: Vec<bool> = a.iter().map(|c| counts[c] > threshold).collect();
    let mut discard_b: Vec<bool> = b.iter().map(|c| counts[c] > threshold).collect();

    undo_isolated_survivors(&mut discard_a);
    undo_isolated_survivors(&mut discard_b);

    let kept_a = (0..a.len()).filter(|&i| !discard_a[i]).collect();
    let kept_b = (0..b.len()).filter(|&i| !discard_b[i]).collect();
    Discard { kept_a, kept_b }
}

fn undo_isolated_survivors(discard: &mut [bool]) {
    if discard.len() < 3 {
        return;
    }
    for i in 1..discard.len() - 1 {
        if !discard[i] && discard[i - 1] && discard[i + 1] {
            discard[i] = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed_indices(changed: &[bool]) -> Vec<usize> {
        changed
            .iter()
            .enumerate()
            .filter_map(|(i, &c)| c.then_some(i))
            .collect()
    }

    #[test]
    fn identical_sequences_have_no_changes() {
        let cfg = Config::default();
        let a = [1u32, 2, 3];
        let result = diff_sequences(&a, &a, &cfg);
        assert!(result.a.iter().all(|&c| !c));
        assert!(result.b.iter().all(|&c| !c));
    }

    #[test]
    fn pure_insertion() {
        let cfg = Config::default();
        let a = [1u32, 2, 3];
        let b = [1u32, 9, 2, 3];
        let result = diff_sequences(&a, &b, &cfg);
        assert!(result.a.iter().all(|&c| !c));
        assert_eq!(changed_indices(&result.b), vec![1]);
    }

    #[test]
    fn pure_deletion() {
        let cfg = Config::default();
        let a = [1u32, 9, 2, 3];
        let b = [1u32, 2, 3];
        let result = diff_sequences(&a, &b, &cfg);
        assert_eq!(changed_indices(&result.a), vec![1]);
        assert!(result.b.iter().all(|&c| !c));
    }

    #[test]
    fn single_substitution_is_one_delete_one_insert() {
        let cfg = Config::default();
        let a = [1u32, 2, 3];
        let b = [1u32, 9, 3];
        let result = diff_sequences(&a, &b, &cfg);
        assert_eq!(changed_indices(&result.a), vec![1]);
        assert_eq!(changed_indices(&result.b), vec![1]);
    }

    #[test]
    fn total_edit_count_matches_known_minimal_script() {
        // a\nb\nc\nd\ne -> a\nx\nc\ny\ne : two substitutions, 2 deletes + 2 inserts.
        let cfg = Config::default();
        let a = [1u32, 2, 3, 4, 5];
        let b = [1u32, 9, 3, 8, 5];
        let result = diff_sequences(&a, &b, &cfg);
        let total: usize =
            result.a.iter().filter(|&&c| c).count() + result.b.iter().filter(|&&c| c).count();
        assert_eq!(total, 4);
    }

    #[test]
    fn empty_vs_empty_has_no_changes() {
        let cfg = Config::default();
        let a: [u32; 0] = [];
        let result = diff_sequences(&a, &a, &cfg);
        assert!(result.a.is_empty());
        assert!(result.b.is_empty());
    }

    #[test]
    fn empty_vs_nonempty_is_all_insertions() {
        let cfg = Config::default();
        let a: [u32; 0] = [];
        let b = [1u32, 2];
        let result = diff_sequences(&a, &b, &cfg);
        assert_eq!(changed_indices(&result.b), vec![0, 1]);
    }

    #[test]
    fn minimal_disables_the_cost_bound_heuristic() {
        // Two completely disjoint sequences: every step costs 1 (no
        // diagonal "free" moves), so the true edit distance is n + m and
        // the default cost bound (2 * isqrt(n + m)) truncates far short
        // of it.
        let a: Vec<u32> = (0..80).collect();
        let b: Vec<u32> = (80..160).collect();
        let mut cfg = Config::default();

        let truncated = diff_sequences(&a, &b, &cfg);
        let truncated_total: usize =
            truncated.a.iter().filter(|&&c| c).count() + truncated.b.iter().filter(|&&c| c).count();
        assert!(
            truncated_total < a.len() + b.len(),
            "expected the default cost bound to truncate the search, got {truncated_total} changes"
        );

        cfg.minimal = true;
        let exhaustive = diff_sequences(&a, &b, &cfg);
        assert!(exhaustive.a.iter().all(|&c| c), "-d must mark every line changed here");
        assert!(exhaustive.b.iter().all(|&c| c), "-d must mark every line changed here");
    }

    #[test]
    fn minimal_flag_bypasses_discard_pass() {
        let mut cfg = Config::default();
        cfg.minimal = true;
        // A highly repeated class ('1') would normally be discarded as
        // "too common"; -d must still find the true minimal script.
        let a: Vec<u32> = (0..100).map(|i| if i == 50 { 999 } else { 1 }).collect();
        let mut b = a.clone();
        b[50] = 888;
        let result = diff(&a, &b, &cfg);
        assert_eq!(changed_indices(&result.a), vec![50]);
        assert_eq!(changed_indices(&result.b), vec![50]);
    }
}
