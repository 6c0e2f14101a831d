//! Bottleneck / p-Wasserstein distance between two persistence diagrams.
//!
//! Pipeline, per call:
//!
//! 1. put the larger diagram second (global transposition),
//! 2. estimate the relevance threshold and split both diagrams into min / max / saddle
//!    classes,
//! 3. for each class: build the cost matrix, solve it, reconcile the matches,
//! 4. recompute every match from the two pairs and combine with the diagonal costs.
//!
//! For a finite norm `w` the result is
//! \((\sum_i d_i^w + \sum_{\text{diag}} d^w)^{1/w}\); for the bottleneck norm it is the
//! largest single cost, diagonal matches included. Finite-norm solvers work on
//! `(d / s)^w` with `s` the largest ground cost of the call (see [`Units`]), so large
//! values and large orders do not overflow.

use core::fmt;
use core::str::FromStr;

use tracing::{debug, info, warn};

use crate::assignment::AssignmentSolver;
use crate::bottleneck::Bottleneck;
use crate::cost::{CostModel, CostWeights, Norm, Units};
use crate::diagram::{
    classify_diagram, geometrical_range, relevance_threshold, ClassMaps, Diagram, PairClass,
    PersistencePair,
};
use crate::matrix::{build_class_matrix, CostMatrix};
use crate::munkres::Munkres;
use crate::reconcile::{reconcile, Matching, Transposition};
use crate::{Error, Result};

/// Matching strategy selector.
///
/// Only [`Algorithm::Ttk`] computes anything; the others are recognised so that a
/// configuration naming them fails with [`Error::Unsupported`] instead of silently
/// falling back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Algorithm {
    /// Exact per-class assignment (this crate).
    Ttk,
    /// Legacy exact solver from Dionysus.
    Legacy,
    /// Approximate geometric solver from Dionysus.
    Geometric,
    /// Multi-threaded variant of [`Algorithm::Ttk`].
    Parallel,
    /// Benchmark of all of the above.
    Bench,
}

impl Algorithm {
    pub fn description(self) -> &'static str {
        match self {
            Algorithm::Ttk => "exact per-class assignment",
            Algorithm::Legacy => "legacy Dionysus exact approach",
            Algorithm::Geometric => "approximate Dionysus geometric approach",
            Algorithm::Parallel => "parallel exact approach",
            Algorithm::Bench => "benchmarking",
        }
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "0" | "ttk" => Ok(Algorithm::Ttk),
            "1" | "legacy" => Ok(Algorithm::Legacy),
            "2" | "geometric" => Ok(Algorithm::Geometric),
            "3" | "parallel" => Ok(Algorithm::Parallel),
            "4" | "bench" => Ok(Algorithm::Bench),
            other => Err(Error::UnknownAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::Ttk => "ttk",
            Algorithm::Legacy => "legacy",
            Algorithm::Geometric => "geometric",
            Algorithm::Parallel => "parallel",
            Algorithm::Bench => "bench",
        };
        f.write_str(name)
    }
}

/// User-facing configuration, validated by [`BottleneckDistance::new`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BottleneckConfig {
    /// `"inf"` for the bottleneck distance, or a positive integer `p` for W_p.
    pub wasserstein: String,
    /// See [`Algorithm`]'s `FromStr`.
    pub algorithm: String,
    pub weights: CostWeights,
    /// Pairs with persistence below this percentage of the pooled persistence range
    /// are ignored. Values outside `(0, 100)` disable pruning.
    pub relevance_percent: f64,
    /// Compare diagrams by birth/death values only (spatial weights forced to zero).
    pub use_persistence_metric: bool,
}

impl Default for BottleneckConfig {
    fn default() -> Self {
        Self {
            wasserstein: "2".to_string(),
            algorithm: "ttk".to_string(),
            weights: CostWeights::default(),
            relevance_percent: 0.0,
            use_persistence_metric: false,
        }
    }
}

/// Result of one distance computation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceReport {
    pub distance: f64,
    /// Pair-to-pair matches, all classes together, in caller indices.
    /// `cost` is the ground distance between the two pairs. Pairs sent to the diagonal
    /// do not appear here.
    pub matchings: Vec<Matching>,
    /// Pair-to-pair part on its own, as a distance: `(Σ d_i^w)^(1/w)`, or max `d_i`.
    pub matched_cost: f64,
    /// Diagonal part per class on its own, as a distance in the same sense.
    pub added_persistence: [f64; 3],
    /// Matches whose solver cost disagreed with the recomputed ground cost.
    pub mismatches: usize,
    pub threshold: f64,
    /// The first diagram was larger and played "diagram 2" internally.
    pub transposed: bool,
    /// Diagonal of the bounding box of both diagrams' critical points.
    pub geometrical_range: f64,
}

impl DistanceReport {
    pub fn added(&self, class: PairClass) -> f64 {
        self.added_persistence[class.slot()]
    }

    /// `distance / geometrical_range`, if the diagrams have any spatial extent.
    pub fn normalized_distance(&self) -> Option<f64> {
        (self.geometrical_range > 0.0).then(|| self.distance / self.geometrical_range)
    }
}

/// Validated distance computation.
#[derive(Debug, Clone)]
pub struct BottleneckDistance {
    norm: Norm,
    algorithm: Algorithm,
    weights: CostWeights,
    relevance_percent: f64,
}

impl BottleneckDistance {
    pub fn new(cfg: &BottleneckConfig) -> Result<Self> {
        let norm: Norm = cfg.wasserstein.parse()?;
        let algorithm: Algorithm = cfg.algorithm.parse()?;
        if !cfg.weights.is_valid() {
            return Err(Error::Domain("weights must be finite and nonnegative"));
        }
        if cfg.relevance_percent.is_nan() {
            return Err(Error::Domain("relevance_percent must not be NaN"));
        }
        let weights = if cfg.use_persistence_metric {
            cfg.weights.without_geometry()
        } else {
            cfg.weights
        };
        Ok(Self {
            norm,
            algorithm,
            weights,
            relevance_percent: cfg.relevance_percent,
        })
    }

    pub fn norm(&self) -> Norm {
        self.norm
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Effective weights (spatial part zeroed under the persistence metric).
    pub fn weights(&self) -> &CostWeights {
        &self.weights
    }

    /// Distance between `d1` and `d2`, with the optimal matching.
    pub fn compute(&self, d1: &Diagram, d2: &Diagram) -> Result<DistanceReport> {
        info!(algorithm = %self.algorithm, "solving with the {}", self.algorithm.description());
        match self.algorithm {
            Algorithm::Ttk => self.compute_exact(d1, d2),
            other => Err(Error::Unsupported(other)),
        }
    }

    fn compute_exact(&self, d1: &Diagram, d2: &Diagram) -> Result<DistanceReport> {
        let solver: &dyn AssignmentSolver = match self.norm {
            Norm::Finite(_) => &Munkres,
            Norm::Infinity => &Bottleneck,
        };
        self.compute_with(d1, d2, solver)
    }

    /// Exact computation with an explicit assignment solver.
    pub(crate) fn compute_with(
        &self,
        d1: &Diagram,
        d2: &Diagram,
        solver: &dyn AssignmentSolver,
    ) -> Result<DistanceReport> {
        if d1.iter().chain(d2.iter()).any(|p| !is_finite_pair(p)) {
            return Err(Error::Domain("diagram contains non-finite values"));
        }

        let norm = self.norm;
        let transposed = d1.len() > d2.len();
        let (a, b) = if transposed { (d2, d1) } else { (d1, d2) };
        if transposed {
            info!("the first persistence diagram is larger than the second; solving the transposed problem");
        }

        let threshold = relevance_threshold(a, b, self.relevance_percent)?;
        let maps1 = classify_diagram(a, threshold);
        let maps2 = classify_diagram(b, threshold);
        debug!(
            threshold,
            retained_first = maps1.total(),
            retained_second = maps2.total(),
            "classified diagrams"
        );

        let model = CostModel::for_norm(self.weights, norm);
        let problems: Vec<ClassProblem<'_>> = PairClass::ALL
            .into_iter()
            .filter_map(|class| ClassProblem::build(a, b, &maps1, &maps2, class, &model))
            .collect();
        let units = Units::new(
            norm,
            problems
                .iter()
                .map(|p| p.matrix.max_cost())
                .fold(0.0, f64::max),
        );
        debug!(scale = units.scale(), solver = solver.name(), "solver units");

        let mut matchings = Vec::new();
        let mut added = [0.0; 3];
        for problem in problems {
            let slot = problem.class.slot();
            added[slot] = problem.solve(solver, transposed, units, &mut matchings)?;
        }

        // Recompute every match from the pairs themselves and check it against the
        // solver's own cost.
        let mut matched = 0.0;
        let mut mismatches = 0usize;
        for m in &mut matchings {
            let (i, j) = if transposed {
                (m.second, m.first)
            } else {
                (m.first, m.second)
            };
            let d = model.pair_cost(&a[i], &b[j]);
            let t = units.to_solver(d);
            if !approx_eq(t, m.cost) {
                mismatches += 1;
            }
            m.cost = d;
            matched = norm.accumulate(matched, t);
        }
        if mismatches > 0 {
            warn!(mismatches, "distance mismatch when rebuilding matchings");
        }

        let total = added.iter().fold(matched, |acc, &x| norm.accumulate(acc, x));
        let distance = units.to_distance(total);
        let added_persistence = added.map(|x| units.to_distance(x));
        let matched_cost = units.to_distance(matched);

        info!(
            norm = %norm,
            diag_min = added_persistence[PairClass::Min.slot()],
            diag_max = added_persistence[PairClass::Max.slot()],
            diag_saddle = added_persistence[PairClass::Saddle.slot()],
            matched = matched_cost,
            distance,
            "computed distance"
        );

        Ok(DistanceReport {
            distance,
            matchings,
            matched_cost,
            added_persistence,
            mismatches,
            threshold,
            transposed,
            geometrical_range: geometrical_range(d1, d2),
        })
    }
}

/// Shorthand for [`BottleneckDistance::new`] + [`BottleneckDistance::compute`].
pub fn diagram_distance(
    d1: &Diagram,
    d2: &Diagram,
    cfg: &BottleneckConfig,
) -> Result<DistanceReport> {
    BottleneckDistance::new(cfg)?.compute(d1, d2)
}

/// One class's matrix with the index maps it was built from.
struct ClassProblem<'a> {
    class: PairClass,
    map1: &'a [usize],
    map2: &'a [usize],
    matrix: CostMatrix,
}

impl<'a> ClassProblem<'a> {
    /// `None` when neither diagram has a pair in `class`. `a` / `b` are the internal
    /// (possibly swapped) diagrams.
    fn build(
        a: &Diagram,
        b: &Diagram,
        maps1: &'a ClassMaps,
        maps2: &'a ClassMaps,
        class: PairClass,
        model: &CostModel,
    ) -> Option<Self> {
        let map1 = maps1.get(class);
        let map2 = maps2.get(class);
        if map1.is_empty() && map2.is_empty() {
            debug!(class = class.name(), "no pairs, skipping");
            return None;
        }
        Some(Self {
            class,
            map1,
            map2,
            matrix: build_class_matrix(a, b, map1, map2, model),
        })
    }

    /// Solve and reconcile into `out`. Returns the diagonal part in solver units.
    fn solve(
        self,
        solver: &dyn AssignmentSolver,
        transposed: bool,
        units: Units,
        out: &mut Vec<Matching>,
    ) -> Result<f64> {
        let transposition = Transposition::new(transposed, self.matrix.is_transposed());
        let (rows, cols) = (self.matrix.rows(), self.matrix.cols());
        debug!(
            class = self.class.name(),
            rows,
            cols,
            "affecting {}",
            self.class.name()
        );
        let local = solver.solve(self.matrix.into_solver_units(units), rows, cols)?;
        Ok(reconcile(
            &local,
            transposition,
            self.map1,
            self.map2,
            units.norm(),
            out,
        ))
    }
}

fn is_finite_pair(p: &PersistencePair) -> bool {
    p.persistence.is_finite()
        && p.birth_value.is_finite()
        && p.death_value.is_finite()
        && p.birth_coords.iter().all(|x| x.is_finite())
        && p.death_coords.iter().all(|x| x.is_finite())
}

#[inline]
fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs()))
}
