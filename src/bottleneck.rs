//! Bottleneck assignment (infinity norm).
//!
//! Minimizes the **largest** cost used by the assignment rather than the sum. The
//! optimum is one of the edge costs, so we binary-search the sorted distinct costs for
//! the smallest threshold `t` at which the subgraph of edges with cost `≤ t` still has
//! a perfect matching. Each feasibility test is a Hopcroft–Karp maximum matching.

use ndarray::Array2;

use crate::assignment::{Augmented, AssignmentSolver, LocalMatching};
use crate::{Error, Result};

/// Infinity-norm assignment solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bottleneck;

impl AssignmentSolver for Bottleneck {
    fn name(&self) -> &'static str {
        "bottleneck"
    }

    fn solve(&self, matrix: Array2<f64>, rows: usize, cols: usize) -> Result<Vec<LocalMatching>> {
        let aug = Augmented::new(matrix, rows, cols)?;
        let n = aug.size();
        if n == 0 {
            return Ok(Vec::new());
        }

        // Adjacency sorted by cost: the edges usable at threshold t are a prefix.
        let mut adj: Vec<Vec<(usize, f64)>> = (0..n)
            .map(|u| (0..n).filter_map(|v| aug.cost(u, v).map(|c| (v, c))).collect())
            .collect();
        for row in &mut adj {
            row.sort_by(|a, b| a.1.total_cmp(&b.1));
        }

        let mut levels: Vec<f64> = adj.iter().flatten().map(|&(_, c)| c).collect();
        levels.sort_by(f64::total_cmp);
        levels.dedup();

        let mut hk = HopcroftKarp::new(n);
        let (mut lo, mut hi) = (0usize, levels.len());
        // Invariant: levels[hi] (if any) is feasible; everything below lo is not.
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if hk.run(&adj, levels[mid]) == n {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        if lo == levels.len() {
            return Err(Error::Domain("no feasible assignment"));
        }
        let matched = hk.run(&adj, levels[lo]);
        debug_assert_eq!(matched, n);

        aug.decode_all(&hk.pair_left)
    }
}

const NIL: usize = usize::MAX;

struct HopcroftKarp {
    pair_left: Vec<usize>,
    pair_right: Vec<usize>,
    dist: Vec<usize>,
    queue: Vec<usize>,
}

impl HopcroftKarp {
    fn new(n: usize) -> Self {
        Self {
            pair_left: vec![NIL; n],
            pair_right: vec![NIL; n],
            dist: vec![0; n],
            queue: Vec::with_capacity(n),
        }
    }

    /// Size of a maximum matching using edges with cost `<= t`.
    fn run(&mut self, adj: &[Vec<(usize, f64)>], t: f64) -> usize {
        self.pair_left.fill(NIL);
        self.pair_right.fill(NIL);
        let mut size = 0;
        while self.bfs(adj, t) {
            for u in 0..adj.len() {
                if self.pair_left[u] == NIL && self.dfs(adj, t, u) {
                    size += 1;
                }
            }
        }
        size
    }

    /// Layer free left vertices; true if some augmenting path exists.
    fn bfs(&mut self, adj: &[Vec<(usize, f64)>], t: f64) -> bool {
        self.queue.clear();
        for u in 0..adj.len() {
            if self.pair_left[u] == NIL {
                self.dist[u] = 0;
                self.queue.push(u);
            } else {
                self.dist[u] = NIL;
            }
        }
        let mut found = false;
        let mut head = 0;
        while head < self.queue.len() {
            let u = self.queue[head];
            head += 1;
            for &(v, c) in &adj[u] {
                if c > t {
                    break;
                }
                let w = self.pair_right[v];
                if w == NIL {
                    found = true;
                } else if self.dist[w] == NIL {
                    self.dist[w] = self.dist[u] + 1;
                    self.queue.push(w);
                }
            }
        }
        found
    }

    fn dfs(&mut self, adj: &[Vec<(usize, f64)>], t: f64, u: usize) -> bool {
        for &(v, c) in &adj[u] {
            if c > t {
                break;
            }
            let w = self.pair_right[v];
            if w == NIL || (self.dist[w] == self.dist[u] + 1 && self.dfs(adj, t, w)) {
                self.pair_left[u] = v;
                self.pair_right[v] = u;
                return true;
            }
        }
        self.dist[u] = NIL;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::testing::{assert_valid, brute_force, random_augmented};
    use crate::matrix::INFEASIBLE;
    use ndarray::array;
    use proptest::prelude::*;

    fn worst(out: &[LocalMatching]) -> f64 {
        out.iter().map(|m| m.cost).fold(0.0, f64::max)
    }

    #[test]
    fn minimizes_the_largest_edge_not_the_sum() {
        // Sum-optimal: (0,0)+(1,1) = 0 + 4 = 4, worst 4.
        // Bottleneck-optimal: (0,1)+(1,0) = 3 + 3 = 6, worst 3.
        let m = array![[0.0, 3.0, 9.0], [3.0, 4.0, 9.0], [9.0, 9.0, INFEASIBLE]];
        let out = Bottleneck.solve(m.clone(), 2, 2).unwrap();
        assert_valid(&out, &m, 2, 2);
        assert_eq!(worst(&out), 3.0);
    }

    #[test]
    fn empty_side_costs_the_largest_diagonal() {
        let m = array![[5.0, 1.0, INFEASIBLE]];
        let out = Bottleneck.solve(m.clone(), 0, 2).unwrap();
        assert_valid(&out, &m, 0, 2);
        assert_eq!(worst(&out), 5.0);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 96,
            .. ProptestConfig::default()
        })]
        #[test]
        fn prop_matches_brute_force(
            rows in 0usize..4,
            extra in 0usize..3,
            seed in any::<u64>(),
        ) {
            let cols = rows + extra;
            let m = random_augmented(rows, cols, seed);
            let out = Bottleneck.solve(m.clone(), rows, cols).unwrap();
            assert_valid(&out, &m, rows, cols);
            let best = brute_force(&m, rows, cols, f64::max);
            prop_assert_eq!(worst(&out), best);
        }
    }
}
