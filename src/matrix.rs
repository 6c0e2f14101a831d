//! Per-class cost matrices.
//!
//! For a class with `n1` pairs in the first diagram and `n2` in the second, the matrix
//! is `(min(n1,n2)+1) × (max(n1,n2)+1)`:
//!
//! - the top-left block holds pair-to-pair costs,
//! - the last column holds the diagonal cost of each row pair,
//! - the last row holds the diagonal cost of each column pair,
//! - the bottom-right cell is [`INFEASIBLE`].
//!
//! The matrix is always stored with rows ≤ columns. When the first diagram has more
//! pairs of the class than the second, the block is stored transposed and
//! [`CostMatrix::is_transposed`] says so.
//!
//! Entries are ground distances `d`. [`CostMatrix::into_solver_units`] turns them
//! into what a solver minimizes (see [`Units`]).

use ndarray::{Array2, ArrayView2};

use crate::cost::{CostModel, Units};
use crate::diagram::Diagram;

/// Marks a cell that must never be part of an assignment.
pub const INFEASIBLE: f64 = f64::INFINITY;

#[inline]
pub(crate) fn is_infeasible(c: f64) -> bool {
    c == INFEASIBLE || c.is_nan()
}

/// A class cost matrix in canonical (rows ≤ columns) orientation.
#[derive(Debug, Clone)]
pub struct CostMatrix {
    data: Array2<f64>,
    transposed: bool,
}

impl CostMatrix {
    fn new(n1: usize, n2: usize) -> Self {
        let transposed = n1 > n2;
        let (r, c) = if transposed { (n2, n1) } else { (n1, n2) };
        Self {
            data: Array2::zeros((r + 1, c + 1)),
            transposed,
        }
    }

    /// Stored with the first diagram along the columns.
    pub fn is_transposed(&self) -> bool {
        self.transposed
    }

    /// Real (non-diagonal) rows.
    pub fn rows(&self) -> usize {
        self.data.nrows() - 1
    }

    /// Real (non-diagonal) columns.
    pub fn cols(&self) -> usize {
        self.data.ncols() - 1
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.data
    }

    /// Largest feasible entry, 0 if there is none.
    pub fn max_cost(&self) -> f64 {
        self.data
            .iter()
            .copied()
            .filter(|&c| !is_infeasible(c))
            .fold(0.0, f64::max)
    }

    /// Feasible entries mapped through [`Units::to_solver`]; infeasible cells are kept.
    pub fn into_solver_units(mut self, units: Units) -> Array2<f64> {
        self.data.mapv_inplace(|c| {
            if is_infeasible(c) {
                c
            } else {
                units.to_solver(c)
            }
        });
        self.data
    }

    /// Entry for first-diagram local index `i1` and second-diagram local index `i2`,
    /// whatever the storage orientation. The diagonal is index `n1` / `n2`.
    pub fn get(&self, i1: usize, i2: usize) -> f64 {
        if self.transposed {
            self.data[[i2, i1]]
        } else {
            self.data[[i1, i2]]
        }
    }

    #[inline]
    fn set(&mut self, i1: usize, i2: usize, v: f64) {
        if self.transposed {
            self.data[[i2, i1]] = v;
        } else {
            self.data[[i1, i2]] = v;
        }
    }
}

/// Build the cost matrix of one class.
///
/// `map1` / `map2` are the class's index maps into `d1` / `d2`; pairs pruned by the
/// relevance threshold are already absent from them. A pair-to-pair cost larger than
/// the sum of both diagonal costs is replaced by [`INFEASIBLE`]: sending both pairs to
/// the diagonal is always at least as good.
pub fn build_class_matrix(
    d1: &Diagram,
    d2: &Diagram,
    map1: &[usize],
    map2: &[usize],
    model: &CostModel,
) -> CostMatrix {
    let n1 = map1.len();
    let n2 = map2.len();
    let mut m = CostMatrix::new(n1, n2);

    let diag2: Vec<f64> = map2.iter().map(|&j| model.diagonal_cost(&d2[j])).collect();

    for (li, &i) in map1.iter().enumerate() {
        let a = &d1[i];
        let diag_a = model.diagonal_cost(a);
        for (lj, &j) in map2.iter().enumerate() {
            let d = model.pair_cost(a, &d2[j]);
            let cell = if d > diag_a + diag2[lj] { INFEASIBLE } else { d };
            m.set(li, lj, cell);
        }
        m.set(li, n2, diag_a);
    }

    for (lj, &dj) in diag2.iter().enumerate() {
        m.set(n1, lj, dj);
    }
    m.set(n1, n2, INFEASIBLE);
    m
}
