//! Minimum-sum assignment (finite Wasserstein norms).
//!
//! Primal-dual Hungarian method in its shortest-augmenting-path form: rows are inserted
//! one at a time, and each insertion runs a Dijkstra-like search over reduced costs
//! `c(i,j) - u[i] - v[j]`, then shifts the potentials. `O(n³)` on the square expansion
//! (`n = rows + cols`).

use ndarray::Array2;

use crate::assignment::{Augmented, AssignmentSolver, LocalMatching};
use crate::{Error, Result};

/// Finite-norm assignment solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct Munkres;

impl AssignmentSolver for Munkres {
    fn name(&self) -> &'static str {
        "munkres"
    }

    fn solve(&self, matrix: Array2<f64>, rows: usize, cols: usize) -> Result<Vec<LocalMatching>> {
        let aug = Augmented::new(matrix, rows, cols)?;
        let row_to_col = hungarian(&aug)?;
        aug.decode_all(&row_to_col)
    }
}

/// Optimal `row -> col` assignment of the square expansion.
fn hungarian(aug: &Augmented) -> Result<Vec<usize>> {
    let n = aug.size();
    if n == 0 {
        return Ok(Vec::new());
    }

    // 1-based internally; index 0 is the virtual source column.
    let mut u = vec![0.0f64; n + 1];
    let mut v = vec![0.0f64; n + 1];
    let mut p = vec![0usize; n + 1]; // p[j] = row matched to column j
    let mut way = vec![0usize; n + 1];
    let mut minv = vec![f64::INFINITY; n + 1];
    let mut used = vec![false; n + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0usize;
        minv.fill(f64::INFINITY);
        used.fill(false);

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0usize;
            for j in 1..=n {
                if used[j] {
                    continue;
                }
                if let Some(c) = aug.cost(i0 - 1, j - 1) {
                    let cur = c - u[i0] - v[j];
                    if cur < minv[j] {
                        minv[j] = cur;
                        way[j] = j0;
                    }
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            if !delta.is_finite() {
                return Err(Error::Domain("no feasible assignment"));
            }
            for j in 0..=n {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        // Flip the augmenting path.
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut row_to_col = vec![usize::MAX; n];
    for j in 1..=n {
        row_to_col[p[j] - 1] = j - 1;
    }
    Ok(row_to_col)
}
