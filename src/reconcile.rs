//! From solver-local matches back to diagram indices.
//!
//! Two independent swaps sit between a solver's `(row, col)` and the caller's
//! `(diagram 1, diagram 2)`:
//!
//! - **global**: the whole problem was set up with the caller's diagrams swapped
//!   (the larger one always plays "diagram 2" internally);
//! - **local**: one class matrix was stored transposed so that rows ≤ columns.
//!
//! The local swap decides which index map translates which solver index. The final
//! orientation is `global XOR local`. Keep both rules inside [`Transposition`].

use crate::assignment::LocalMatching;
use crate::cost::Norm;

/// A matched pair of the caller's diagrams.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Matching {
    /// Index into the first diagram passed by the caller.
    pub first: usize,
    /// Index into the second diagram passed by the caller.
    pub second: usize,
    /// Ground cost of the match. The solver fills in its own units; the distance
    /// computation overwrites it with the pair-to-pair distance.
    pub cost: f64,
}

/// Swap flags for one class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transposition {
    pub global: bool,
    pub local: bool,
}

impl Transposition {
    pub fn new(global: bool, local: bool) -> Self {
        Self { global, local }
    }

    /// Index maps for solver rows and solver columns, given the internal diagram maps.
    pub fn row_col_maps<'a>(self, map1: &'a [usize], map2: &'a [usize]) -> (&'a [usize], &'a [usize]) {
        if self.local {
            (map2, map1)
        } else {
            (map1, map2)
        }
    }

    /// Order two translated indices as `(caller diagram 1, caller diagram 2)`.
    pub fn orient(self, row_point: usize, col_point: usize) -> (usize, usize) {
        if self.global ^ self.local {
            (col_point, row_point)
        } else {
            (row_point, col_point)
        }
    }
}

/// Translate one class's local matches into `out` and return the cost charged to
/// the diagonal ("added persistence"), folded with [`Norm::accumulate`].
///
/// `map1` / `map2` are the class maps of the internal diagram 1 / diagram 2.
pub fn reconcile(
    local: &[LocalMatching],
    transposition: Transposition,
    map1: &[usize],
    map2: &[usize],
    norm: Norm,
    out: &mut Vec<Matching>,
) -> f64 {
    let (row_map, col_map) = transposition.row_col_maps(map1, map2);
    let mut added = 0.0;
    for m in local {
        let cost = m.cost.abs();
        match (row_map.get(m.row), col_map.get(m.col)) {
            (Some(&r), Some(&c)) => {
                let (first, second) = transposition.orient(r, c);
                out.push(Matching {
                    first,
                    second,
                    cost,
                });
            }
            _ => added = norm.accumulate(added, cost),
        }
    }
    added
}
