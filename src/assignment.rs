//! Assignment solvers for diagonal-augmented cost matrices.
//!
//! Input is a class matrix as built by [`crate::matrix`]: `rows` real rows, `cols` real
//! columns, plus one diagonal row and one diagonal column. The diagonal may absorb any
//! number of pairs, which is what makes this different from a plain rectangular
//! assignment problem.
//!
//! Both solvers work on the same square expansion of size `rows + cols`:
//!
//! ```text
//!             real cols (cols)      diagonal slots (rows)
//! real rows   C[i][j]               C[i][cols] on slot i, forbidden elsewhere
//! diag rows   C[rows][j] on slot j  0
//! ```
//!
//! so that every real row and every real column is either matched to a real
//! counterpart or to the diagonal, and diagonal-to-diagonal filler is free.
//! [`INFEASIBLE`](crate::matrix::INFEASIBLE) cells are never used.

use ndarray::Array2;

use crate::matrix::is_infeasible;
use crate::{Error, Result};

/// One solver-local match. `row == rows` or `col == cols` means "to the diagonal".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalMatching {
    pub row: usize,
    pub col: usize,
    /// Cell value in the solver's units.
    pub cost: f64,
}

/// An assignment strategy.
pub trait AssignmentSolver {
    fn name(&self) -> &'static str;

    /// Solve one class. `matrix` must be `(rows + 1) × (cols + 1)`.
    ///
    /// Every real row and every real column appears in exactly one returned match.
    fn solve(&self, matrix: Array2<f64>, rows: usize, cols: usize) -> Result<Vec<LocalMatching>>;
}

/// Square view of a diagonal-augmented matrix.
pub(crate) struct Augmented {
    matrix: Array2<f64>,
    rows: usize,
    cols: usize,
}

impl Augmented {
    pub(crate) fn new(matrix: Array2<f64>, rows: usize, cols: usize) -> Result<Self> {
        if matrix.dim() != (rows + 1, cols + 1) {
            return Err(Error::Shape("matrix must be (rows + 1) x (cols + 1)"));
        }
        Ok(Self { matrix, rows, cols })
    }

    /// Side of the square problem.
    #[inline]
    pub(crate) fn size(&self) -> usize {
        self.rows + self.cols
    }

    /// Cost of square cell `(u, v)`, `None` if the edge does not exist.
    #[inline]
    pub(crate) fn cost(&self, u: usize, v: usize) -> Option<f64> {
        let c = match (u < self.rows, v < self.cols) {
            (true, true) => self.matrix[[u, v]],
            (true, false) if v - self.cols == u => self.matrix[[u, self.cols]],
            (false, true) if u - self.rows == v => self.matrix[[self.rows, v]],
            (false, false) => 0.0,
            _ => return None,
        };
        if is_infeasible(c) {
            None
        } else {
            Some(c)
        }
    }

    /// Map a square assignment back to matrix coordinates; diagonal filler maps to `None`.
    pub(crate) fn decode(&self, u: usize, v: usize, cost: f64) -> Option<LocalMatching> {
        match (u < self.rows, v < self.cols) {
            (true, true) => Some(LocalMatching { row: u, col: v, cost }),
            (true, false) => Some(LocalMatching {
                row: u,
                col: self.cols,
                cost,
            }),
            (false, true) => Some(LocalMatching {
                row: self.rows,
                col: v,
                cost,
            }),
            (false, false) => None,
        }
    }

    /// Decode a full square assignment given as `row -> col`.
    pub(crate) fn decode_all(&self, row_to_col: &[usize]) -> Result<Vec<LocalMatching>> {
        let mut out = Vec::with_capacity(self.size());
        for (u, &v) in row_to_col.iter().enumerate() {
            let c = self
                .cost(u, v)
                .ok_or(Error::Domain("assignment used a forbidden cell"))?;
            if let Some(m) = self.decode(u, v, c) {
                out.push(m);
            }
        }
        Ok(out)
    }
}
