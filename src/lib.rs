//! # diagmatch
//!
//! Bottleneck and p-Wasserstein distances between persistence diagrams, with the
//! optimal matching that realizes them.
//!
//! A persistence diagram is a list of (birth, death) pairs of critical points of a
//! scalar field. Two diagrams are compared by matching their pairs one-to-one, where
//! any pair may instead be matched to the diagonal (discarded) at the cost of its own
//! persistence. Pairs are only ever matched within the same class:
//!
//! - **min**: pairs born at a local minimum,
//! - **max**: pairs dying at a local maximum (takes precedence over min),
//! - **saddle**: saddle-saddle pairs.
//!
//! For a finite norm `p` the distance is
//! \(W_p = (\sum_{(a,b)} d(a,b)^p + \sum_{a \to \Delta} d(a,\Delta)^p)^{1/p}\);
//! for `p = inf` (bottleneck) it is the largest single cost.
//!
//! This crate is intentionally small:
//!
//! - it computes one distance between two in-memory diagrams,
//! - it does not read or write diagram files and has no CLI,
//! - it does not compute persistence diagrams.
//!
//! ## Module map
//!
//! - `diagram`: pair types, classification, relevance threshold
//! - `cost`: norm parsing and the pair / diagonal ground costs
//! - `matrix`: diagonal-augmented cost matrix per class
//! - `assignment`: the solver trait and the shared square expansion
//! - `munkres`: minimum-sum assignment (finite norms)
//! - `bottleneck`: minimum-max assignment (infinity norm)
//! - `reconcile`: solver indices back to caller indices
//! - `distance`: configuration and the end-to-end computation
//!
//! ## Public invariants (must not change)
//!
//! - Returned matchings are in the caller's orientation: `first` indexes the first
//!   diagram passed, `second` the second, whatever transposition happened internally.
//! - Distances are symmetric and `d(D, D) = 0`.
//! - A pair whose persistence is below the relevance threshold never appears in a
//!   matching and contributes nothing to the distance.
//!
//! ## Logging
//!
//! Progress is reported through `tracing` (`info` for the selected strategy and the
//! final distance, `debug` per class, `warn` when a recomputed cost disagrees with the
//! solver). Install any subscriber to see it.

pub mod assignment;
pub mod bottleneck;
pub mod cost;
pub mod diagram;
pub mod distance;
pub mod matrix;
pub mod munkres;
pub mod reconcile;

pub use cost::{CostModel, CostWeights, Norm, Units};
pub use diagram::{CriticalType, Diagram, PairClass, PersistencePair};
pub use distance::{
    diagram_distance, Algorithm, BottleneckConfig, BottleneckDistance, DistanceReport,
};
pub use reconcile::Matching;

/// diagmatch error variants.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("shape mismatch: {0}")]
    Shape(&'static str),
    #[error("domain error: {0}")]
    Domain(&'static str),
    #[error("invalid wasserstein norm {0:?}: expected \"inf\" or a positive integer")]
    InvalidNorm(String),
    #[error("unknown assignment algorithm {0:?}")]
    UnknownAlgorithm(String),
    #[error("the {0} algorithm is not supported")]
    Unsupported(Algorithm),
    #[error("both persistence diagrams are empty")]
    EmptyDiagrams,
}

impl Error {
    /// Stable negative status code, for callers that report integers.
    pub fn code(&self) -> i32 {
        match self {
            Error::UnknownAlgorithm(_) => -1,
            Error::Unsupported(_) => -2,
            Error::EmptyDiagrams => -3,
            Error::InvalidNorm(_) => -4,
            Error::Domain(_) => -5,
            Error::Shape(_) => -6,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
