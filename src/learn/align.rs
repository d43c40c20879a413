//! Token-level alignment (Myers shortest edit script).
//!
//! The edit script is grouped into hunks over index ranges of both inputs.
//! A run of deletions and insertions between two equal stretches becomes a
//! single `Replace` hunk, which is where learning candidates come from.

use std::ops::Range;

/// Single-step edit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    Equal,
    Delete,
    Insert,
}

/// Kind of a grouped hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HunkKind {
    Equal,
    Delete,
    Insert,
    Replace,
}

/// A contiguous stretch of the alignment. `a` indexes the first input (raw
/// machine output), `b` the second (reference).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub kind: HunkKind,
    pub a: Range<usize>,
    pub b: Range<usize>,
}

/// Align two token sequences and group the edit script into hunks.
///
/// ```
/// use transcript_qa::learn::align::{align, HunkKind};
///
/// let raw = ["en", "virtu", "de", "la", "loi"];
/// let reference = ["en", "vertu", "de", "la", "loi"];
/// let hunks = align(&raw, &reference);
/// assert_eq!(hunks.len(), 3);
/// assert_eq!(hunks[1].kind, HunkKind::Replace);
/// assert_eq!(hunks[1].a, 1..2);
/// ```
pub fn align<T: PartialEq>(a: &[T], b: &[T]) -> Vec<Hunk> {
    group(&edit_script(a, b))
}

/// Number of tokens both sequences share in the alignment.
pub fn common_tokens(hunks: &[Hunk]) -> usize {
    hunks
        .iter()
        .filter(|h| h.kind == HunkKind::Equal)
        .map(|h| h.a.len())
        .sum()
}

/// Myers O(ND) shortest edit script.
pub fn edit_script<T: PartialEq>(a: &[T], b: &[T]) -> Vec<EditOp> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max = (n + m) as usize;
    if max == 0 {
        return Vec::new();
    }

    let offset = max as isize + 1;
    let mut v = vec![0isize; 2 * max + 3];
    // trace[d] holds V for diagonals -(d+1)..=(d+1) as it was before round d.
    let mut trace: Vec<Vec<isize>> = Vec::new();

    'outer: for d in 0..=max as isize {
        let lo = (offset - d - 1) as usize;
        let hi = (offset + d + 1) as usize;
        trace.push(v[lo..=hi].to_vec());

        for k in (-d..=d).step_by(2) {
            let idx = (offset + k) as usize;
            let mut x = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) {
                v[idx + 1]
            } else {
                v[idx - 1] + 1
            };
            let mut y = x - k;

            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            v[idx] = x;

            if x >= n && y >= m {
                break 'outer;
            }
        }
    }

    let mut ops = Vec::with_capacity(max);
    let mut x = n;
    let mut y = m;

    for (d, window) in trace.iter().enumerate().rev() {
        let d = d as isize;
        let get = |k: isize| window[(k + d + 1) as usize];
        let k = x - y;

        let prev_k = if k == -d || (k != d && get(k - 1) < get(k + 1)) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = get(prev_k);
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            ops.push(EditOp::Equal);
            x -= 1;
            y -= 1;
        }

        if d > 0 {
            if x == prev_x {
                ops.push(EditOp::Insert);
                y -= 1;
            } else {
                ops.push(EditOp::Delete);
                x -= 1;
            }
        }
    }

    ops.reverse();
    ops
}

fn group(ops: &[EditOp]) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);
    let mut pos = 0usize;

    while pos < ops.len() {
        let (a_start, b_start) = (i, j);
        if ops[pos] == EditOp::Equal {
            while pos < ops.len() && ops[pos] == EditOp::Equal {
                i += 1;
                j += 1;
                pos += 1;
            }
            hunks.push(Hunk {
                kind: HunkKind::Equal,
                a: a_start..i,
                b: b_start..j,
            });
            continue;
        }

        while pos < ops.len() && ops[pos] != EditOp::Equal {
            match ops[pos] {
                EditOp::Delete => i += 1,
                EditOp::Insert => j += 1,
                EditOp::Equal => {}
            }
            pos += 1;
        }
        let kind = match (i > a_start, j > b_start) {
            (true, true) => HunkKind::Replace,
            (true, false) => HunkKind::Delete,
            _ => HunkKind::Insert,
        };
        hunks.push(Hunk {
            kind,
            a: a_start..i,
            b: b_start..j,
        });
    }
    hunks
}
