//! Ground costs between persistence pairs.
//!
//! The cost is a generalized \(L_w\) combination of a **topological** term (differences
//! of birth/death scalar values) and a **spatial** term (differences of where the
//! critical points sit in the domain):
//!
//! \[
//! d(a,b) = \Big(w_{b}|b_a - b_b|^w + w_{d}|d_a - d_b|^w + \sum_k p_k |x_{a,k} - x_{b,k}|^w\Big)^{1/w}
//! \]
//!
//! This is not a Euclidean distance in the (birth, death) plane. With all spatial
//! weights at zero and `pe = ps = 1` it reduces to the \(L_w\) distance between the
//! two (birth, death) points.

use core::fmt;
use core::str::FromStr;

use crate::diagram::PersistencePair;
use crate::Error;

/// Largest accepted order `w`; `powi` takes an `i32`.
pub const MAX_ORDER: u32 = i32::MAX as u32;

#[inline]
fn exponent(w: u32) -> i32 {
    i32::try_from(w.clamp(1, MAX_ORDER)).unwrap_or(i32::MAX)
}

/// Norm of the diagram distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Norm {
    /// p-Wasserstein with `p >= 1`.
    Finite(u32),
    /// Bottleneck.
    Infinity,
}

impl Norm {
    pub fn is_finite(self) -> bool {
        matches!(self, Norm::Finite(_))
    }

    /// Order handed to the cost model. The bottleneck solver works on plain
    /// distances, so it uses `w = 1`.
    pub fn cost_order(self) -> u32 {
        match self {
            Norm::Finite(w) => w.clamp(1, MAX_ORDER),
            Norm::Infinity => 1,
        }
    }

    /// Fold one more cost into a running total: sum for finite norms, max for infinity.
    #[inline]
    pub fn accumulate(self, acc: f64, cost: f64) -> f64 {
        match self {
            Norm::Finite(_) => acc + cost,
            Norm::Infinity => acc.max(cost),
        }
    }

    /// Turn a distance into what the solver minimizes: `d^w` for finite norms, `d` otherwise.
    #[inline]
    pub fn transport(self, distance: f64) -> f64 {
        match self {
            Norm::Finite(w) => distance.powi(exponent(w)),
            Norm::Infinity => distance,
        }
    }

    /// Inverse of [`Self::transport`] applied to an accumulated total.
    #[inline]
    pub fn finish(self, total: f64) -> f64 {
        match self {
            Norm::Finite(w) => total.powf(1.0 / f64::from(exponent(w))),
            Norm::Infinity => total,
        }
    }
}

impl FromStr for Norm {
    type Err = Error;

    /// `"inf"` or an integer in `1..=MAX_ORDER`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "inf" {
            return Ok(Norm::Infinity);
        }
        match s.parse::<i64>() {
            Ok(w) if w >= 1 => match u32::try_from(w) {
                Ok(w) if w <= MAX_ORDER => Ok(Norm::Finite(w)),
                _ => Err(Error::InvalidNorm(s.to_string())),
            },
            _ => Err(Error::InvalidNorm(s.to_string())),
        }
    }
}

impl fmt::Display for Norm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Norm::Finite(w) => write!(f, "{w}"),
            Norm::Infinity => f.write_str("inf"),
        }
    }
}

/// What the assignment solvers minimize in one distance computation.
///
/// Finite norms use `(d / scale)^w` with `scale` the largest ground cost in play, so
/// every feasible cell lies in `[0, 1]` whatever `w` and the magnitude of `d`. The
/// bottleneck uses `d` unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Units {
    norm: Norm,
    scale: f64,
}

impl Units {
    /// A `scale` that is not positive and finite falls back to 1.
    pub fn new(norm: Norm, scale: f64) -> Self {
        let scale = if norm.is_finite() && scale > 0.0 && scale.is_finite() {
            scale
        } else {
            1.0
        };
        Self { norm, scale }
    }

    pub fn norm(&self) -> Norm {
        self.norm
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[inline]
    pub fn to_solver(&self, distance: f64) -> f64 {
        match self.norm {
            Norm::Finite(_) => self.norm.transport(distance / self.scale),
            Norm::Infinity => distance,
        }
    }

    /// Distance from a total folded with [`Norm::accumulate`] over solver units.
    #[inline]
    pub fn to_distance(&self, total: f64) -> f64 {
        match self.norm {
            Norm::Finite(_) => self.scale * self.norm.finish(total),
            Norm::Infinity => total,
        }
    }
}

/// Weights of the terms of the ground cost.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostWeights {
    /// Spatial weight along x.
    pub px: f64,
    /// Spatial weight along y.
    pub py: f64,
    /// Spatial weight along z.
    pub pz: f64,
    /// Weight of scalar-value terms on extremum ends.
    pub pe: f64,
    /// Weight of scalar-value terms on saddle ends.
    pub ps: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            px: 0.0,
            py: 0.0,
            pz: 0.0,
            pe: 1.0,
            ps: 1.0,
        }
    }
}

impl CostWeights {
    pub fn is_valid(&self) -> bool {
        [self.px, self.py, self.pz, self.pe, self.ps]
            .iter()
            .all(|&x| x.is_finite() && x >= 0.0)
    }

    /// Same weights with the spatial part switched off.
    pub fn without_geometry(self) -> Self {
        Self {
            px: 0.0,
            py: 0.0,
            pz: 0.0,
            ..self
        }
    }
}

/// Point-to-point and point-to-diagonal costs for a fixed order `w`.
#[derive(Debug, Clone, Copy)]
pub struct CostModel {
    weights: CostWeights,
    order: i32,
}

impl CostModel {
    /// `order` is clamped to at least 1.
    pub fn new(weights: CostWeights, order: u32) -> Self {
        Self {
            weights,
            order: exponent(order),
        }
    }

    pub fn for_norm(weights: CostWeights, norm: Norm) -> Self {
        Self::new(weights, norm.cost_order())
    }

    pub fn weights(&self) -> &CostWeights {
        &self.weights
    }

    pub fn order(&self) -> u32 {
        self.order.unsigned_abs()
    }

    #[inline]
    fn root(&self, x: f64) -> f64 {
        if self.order == 1 {
            x
        } else {
            x.powf(1.0 / f64::from(self.order))
        }
    }

    /// `(Σ c_k |x_k|^w)^(1/w)` over `(c_k, x_k)` terms, factored by the largest `|x_k|`
    /// with a nonzero weight so that neither large values nor large orders overflow.
    fn combine(&self, terms: &[(f64, f64); 5]) -> f64 {
        if self.order == 1 {
            return terms.iter().map(|&(c, x)| c * x.abs()).sum();
        }
        let scale = terms
            .iter()
            .filter(|t| t.0 > 0.0)
            .map(|t| t.1.abs())
            .fold(0.0, f64::max);
        if scale == 0.0 || !scale.is_finite() {
            return scale;
        }
        let sum: f64 = terms
            .iter()
            .filter(|t| t.0 > 0.0)
            .map(|&(c, x)| c * (x.abs() / scale).powi(self.order))
            .sum();
        scale * self.root(sum)
    }

    #[inline]
    fn terms(&self, value: [f64; 2], value_weight: [f64; 2], at: [f64; 3]) -> [(f64, f64); 5] {
        let w = &self.weights;
        [
            (value_weight[0], value[0]),
            (value_weight[1], value[1]),
            (w.px, at[0]),
            (w.py, at[1]),
            (w.pz, at[2]),
        ]
    }

    /// Cost of matching `a` with `b`.
    ///
    /// The caller guarantees both pairs are in the same class; the shape of the cost
    /// (which ends and which weights) is read off `a`. Pairs are assumed oriented as a
    /// persistence computation emits them: a minimum is a birth and a maximum is a
    /// death. Within the max class a reversed pair such as `(LocalMaximum, Saddle2)`
    /// reads differently from `(Saddle2, LocalMaximum)`, and the cost is then not
    /// symmetric.
    pub fn pair_cost(&self, a: &PersistencePair, b: &PersistencePair) -> f64 {
        let w = &self.weights;
        let is_min = a.is_min_type();
        let is_max = a.is_max_type();

        let birth_weight = if is_min && !is_max { w.pe } else { w.ps };
        let death_weight = if is_max { w.pe } else { w.ps };
        let (pa, pb) = if is_max {
            (a.death_coords, b.death_coords)
        } else if is_min {
            (a.birth_coords, b.birth_coords)
        } else {
            (midpoint(a), midpoint(b))
        };

        self.combine(&self.terms(
            [a.birth_value - b.birth_value, a.death_value - b.death_value],
            [birth_weight, death_weight],
            sub(&pa, &pb),
        ))
    }

    /// Cost of sending `a` to the diagonal, i.e. discarding it.
    pub fn diagonal_cost(&self, a: &PersistencePair) -> f64 {
        let w = &self.weights;
        let weight = if a.is_min_type() || a.is_max_type() {
            w.pe
        } else {
            w.ps
        };
        self.combine(&self.terms(
            [a.birth_value - a.death_value, 0.0],
            [weight, 0.0],
            sub(&a.death_coords, &a.birth_coords),
        ))
    }
}

#[inline]
fn sub(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
fn midpoint(p: &PersistencePair) -> [f64; 3] {
    [
        0.5 * (p.birth_coords[0] + p.death_coords[0]),
        0.5 * (p.birth_coords[1] + p.death_coords[1]),
        0.5 * (p.birth_coords[2] + p.death_coords[2]),
    ]
}
