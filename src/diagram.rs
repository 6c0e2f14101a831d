//! Persistence diagrams as consumed by the distance computation.
//!
//! A diagram is an ordered slice of [`PersistencePair`]s. The position of a pair in
//! the slice is its identity: every matching produced by this crate refers to pairs
//! by index, so callers must not reorder a diagram between computing a distance
//! and reading its matchings.
//!
//! This module also holds the two pre-passes that run before any cost is computed:
//! - [`relevance_threshold`]: the persistence magnitude below which pairs are ignored,
//! - [`classify_diagram`]: the split of the remaining pairs into min / max / saddle
//!   classes, which are then matched independently of one another.

use crate::{Error, Result};

/// Type of a critical point at one end of a persistence pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CriticalType {
    LocalMinimum,
    Saddle1,
    Saddle2,
    LocalMaximum,
    Degenerate,
    Regular,
}

impl CriticalType {
    /// Morse index of the critical point, if it has one.
    pub fn index(self) -> Option<usize> {
        match self {
            CriticalType::LocalMinimum => Some(0),
            CriticalType::Saddle1 => Some(1),
            CriticalType::Saddle2 => Some(2),
            CriticalType::LocalMaximum => Some(3),
            CriticalType::Degenerate | CriticalType::Regular => None,
        }
    }
}

/// One (birth, death) pair of a persistence diagram.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PersistencePair {
    /// Mesh vertex carrying the birth critical point.
    pub birth_vertex: usize,
    pub birth_type: CriticalType,
    /// Mesh vertex carrying the death critical point.
    pub death_vertex: usize,
    pub death_type: CriticalType,
    /// Signed `death_value - birth_value`. Only the magnitude is used.
    pub persistence: f64,
    /// Homological dimension of the feature. Carried through, not used by the metric.
    pub dimension: usize,
    pub birth_value: f64,
    pub birth_coords: [f64; 3],
    pub death_value: f64,
    pub death_coords: [f64; 3],
}

impl PersistencePair {
    /// A pair located at the origin, with `persistence = death_value - birth_value`.
    ///
    /// `dimension` defaults to the Morse index of the birth end (0 if it has none).
    pub fn new(
        birth_type: CriticalType,
        birth_value: f64,
        death_type: CriticalType,
        death_value: f64,
    ) -> Self {
        Self {
            birth_vertex: 0,
            birth_type,
            death_vertex: 0,
            death_type,
            persistence: death_value - birth_value,
            dimension: birth_type.index().unwrap_or(0),
            birth_value,
            birth_coords: [0.0; 3],
            death_value,
            death_coords: [0.0; 3],
        }
    }

    pub fn with_coords(mut self, birth: [f64; 3], death: [f64; 3]) -> Self {
        self.birth_coords = birth;
        self.death_coords = death;
        self
    }

    pub fn with_vertices(mut self, birth: usize, death: usize) -> Self {
        self.birth_vertex = birth;
        self.death_vertex = death;
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    #[inline]
    pub fn abs_persistence(&self) -> f64 {
        self.persistence.abs()
    }

    /// Birth end is a local minimum.
    #[inline]
    pub(crate) fn is_min_type(&self) -> bool {
        self.birth_type == CriticalType::LocalMinimum
    }

    /// Death end is a local maximum.
    #[inline]
    pub(crate) fn is_max_type(&self) -> bool {
        self.death_type == CriticalType::LocalMaximum
    }

    /// Which class this pair is matched within (see [`PairClass`]).
    pub fn class(&self) -> Option<PairClass> {
        PairClass::of(self.birth_type, self.death_type)
    }
}

/// A persistence diagram. Index in the slice = identity of the pair.
pub type Diagram = [PersistencePair];

/// Critical-point-pair class. Pairs are only ever matched within their own class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PairClass {
    Min,
    Max,
    Saddle,
}

impl PairClass {
    /// Solving order.
    pub const ALL: [PairClass; 3] = [PairClass::Min, PairClass::Max, PairClass::Saddle];

    /// Classify from the two end types.
    ///
    /// A minimum-to-maximum pair (a whole connected component) is a `Max`. Otherwise a
    /// maximum at either end wins over a minimum at either end; saddle-saddle pairs
    /// must mix the two saddle indices. Anything else has no class.
    pub fn of(birth: CriticalType, death: CriticalType) -> Option<Self> {
        use CriticalType::*;
        if birth == LocalMinimum && death == LocalMaximum {
            return Some(PairClass::Max);
        }
        if birth == LocalMaximum || death == LocalMaximum {
            return Some(PairClass::Max);
        }
        if birth == LocalMinimum || death == LocalMinimum {
            return Some(PairClass::Min);
        }
        match (birth, death) {
            (Saddle1, Saddle2) | (Saddle2, Saddle1) => Some(PairClass::Saddle),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn slot(self) -> usize {
        match self {
            PairClass::Min => 0,
            PairClass::Max => 1,
            PairClass::Saddle => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PairClass::Min => "minima",
            PairClass::Max => "maxima",
            PairClass::Saddle => "saddles",
        }
    }
}

/// Per-class original indices of one diagram, in diagram order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassMaps {
    maps: [Vec<usize>; 3],
}

impl ClassMaps {
    /// Original indices of the pairs in `class`; position = solver-local index.
    pub fn get(&self, class: PairClass) -> &[usize] {
        &self.maps[class.slot()]
    }

    pub fn count(&self, class: PairClass) -> usize {
        self.maps[class.slot()].len()
    }

    /// Number of pairs retained across all classes.
    pub fn total(&self) -> usize {
        self.maps.iter().map(Vec::len).sum()
    }
}

/// Split a diagram into its three class index maps.
///
/// Pairs with `|persistence| < threshold`, and pairs whose end types match no class,
/// appear in no map.
pub fn classify_diagram(diagram: &Diagram, threshold: f64) -> ClassMaps {
    let mut out = ClassMaps::default();
    for (i, pair) in diagram.iter().enumerate() {
        if pair.abs_persistence() < threshold {
            continue;
        }
        if let Some(class) = pair.class() {
            out.maps[class.slot()].push(i);
        }
    }
    out
}

/// Minimum persistence a pair needs to take part in the matching.
///
/// `percent/100 * (max - min)` over the pooled `|persistence|` values of both diagrams.
/// A `percent` outside the open interval `(0, 100)` disables pruning (returns 0).
///
/// Errors if both diagrams are empty.
pub fn relevance_threshold(d1: &Diagram, d2: &Diagram, percent: f64) -> Result<f64> {
    if d1.is_empty() && d2.is_empty() {
        return Err(Error::EmptyDiagrams);
    }
    let s = if percent > 0.0 && percent < 100.0 {
        percent / 100.0
    } else {
        0.0
    };

    let (lo, hi) = d1
        .iter()
        .chain(d2.iter())
        .map(PersistencePair::abs_persistence)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p), hi.max(p))
        });
    Ok(s * (hi - lo))
}

/// Length of the diagonal of the box enclosing every birth and death location of
/// both diagrams. Zero when both are empty.
pub fn geometrical_range(d1: &Diagram, d2: &Diagram) -> f64 {
    let mut lo = [f64::INFINITY; 3];
    let mut hi = [f64::NEG_INFINITY; 3];
    for pair in d1.iter().chain(d2.iter()) {
        for k in 0..3 {
            lo[k] = lo[k].min(pair.birth_coords[k]).min(pair.death_coords[k]);
            hi[k] = hi[k].max(pair.birth_coords[k]).max(pair.death_coords[k]);
        }
    }
    if lo[0] > hi[0] {
        return 0.0;
    }
    (0..3).map(|k| (hi[k] - lo[k]).powi(2)).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use CriticalType::*;

    #[test]
    fn min_max_component_counts_as_maximum_only() {
        let p = PersistencePair::new(LocalMinimum, 0.0, LocalMaximum, 10.0);
        assert_eq!(p.class(), Some(PairClass::Max));
        let maps = classify_diagram(&[p], 0.0);
        assert_eq!(maps.get(PairClass::Max), &[0]);
        assert!(maps.get(PairClass::Min).is_empty());
        assert!(maps.get(PairClass::Saddle).is_empty());
    }

    #[test]
    fn classes_follow_end_types() {
        let d = [
            PersistencePair::new(LocalMinimum, 0.0, Saddle1, 1.0),
            PersistencePair::new(Saddle2, 2.0, LocalMaximum, 4.0),
            PersistencePair::new(Saddle1, 1.0, Saddle2, 3.0),
            PersistencePair::new(Saddle2, 1.0, Saddle1, 3.0),
            PersistencePair::new(Regular, 0.0, Saddle1, 1.0),
            PersistencePair::new(LocalMinimum, 0.5, Saddle1, 2.5),
        ];
        let maps = classify_diagram(&d, 0.0);
        assert_eq!(maps.get(PairClass::Min), &[0, 5]);
        assert_eq!(maps.get(PairClass::Max), &[1]);
        assert_eq!(maps.get(PairClass::Saddle), &[2, 3]);
        assert_eq!(maps.total(), 5);
    }

    #[test]
    fn threshold_uses_pooled_range() {
        let d1 = [PersistencePair::new(LocalMinimum, 0.0, Saddle1, 2.0)];
        let d2 = [
            PersistencePair::new(LocalMinimum, 0.0, Saddle1, 12.0),
            PersistencePair::new(Saddle2, 5.0, LocalMaximum, 1.0),
        ];
        // |p| in {2, 12, 4} -> range 10.
        let t = relevance_threshold(&d1, &d2, 25.0).unwrap();
        assert!((t - 2.5).abs() < 1e-12);
        assert_eq!(relevance_threshold(&d1, &d2, 0.0).unwrap(), 0.0);
        assert_eq!(relevance_threshold(&d1, &d2, 100.0).unwrap(), 0.0);
        assert_eq!(relevance_threshold(&d1, &d2, -5.0).unwrap(), 0.0);
    }

    #[test]
    fn threshold_rejects_two_empty_diagrams() {
        assert!(matches!(
            relevance_threshold(&[], &[], 10.0),
            Err(Error::EmptyDiagrams)
        ));
    }

    #[test]
    fn geometrical_range_is_box_diagonal() {
        let d1 = [PersistencePair::new(LocalMinimum, 0.0, Saddle1, 1.0)
            .with_coords([0.0, 0.0, 0.0], [3.0, 0.0, 0.0])];
        let d2 = [PersistencePair::new(LocalMinimum, 0.0, Saddle1, 1.0)
            .with_coords([0.0, 4.0, 0.0], [1.0, 1.0, 0.0])];
        assert!((geometrical_range(&d1, &d2) - 5.0).abs() < 1e-12);
        assert_eq!(geometrical_range(&[], &[]), 0.0);
    }

    fn arb_type() -> impl Strategy<Value = CriticalType> {
        prop_oneof![
            Just(LocalMinimum),
            Just(Saddle1),
            Just(Saddle2),
            Just(LocalMaximum),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            .. ProptestConfig::default()
        })]
        #[test]
        fn prop_threshold_prunes_low_persistence_pairs(
            pairs in prop::collection::vec((arb_type(), arb_type(), -10.0f64..10.0, -10.0f64..10.0), 1..32),
            percent in 0.5f64..99.5,
        ) {
            let d: Vec<PersistencePair> = pairs
                .iter()
                .map(|&(bt, dt, b, e)| PersistencePair::new(bt, b, dt, e))
                .collect();
            let t = relevance_threshold(&d, &[], percent).unwrap();
            let maps = classify_diagram(&d, t);

            let mut seen = vec![false; d.len()];
            for class in PairClass::ALL {
                for &i in maps.get(class) {
                    prop_assert!(!seen[i], "pair {i} in two classes");
                    seen[i] = true;
                    prop_assert!(d[i].abs_persistence() >= t);
                    prop_assert_eq!(d[i].class(), Some(class));
                }
            }
            for (i, pair) in d.iter().enumerate() {
                if pair.abs_persistence() >= t && pair.class().is_some() {
                    prop_assert!(seen[i], "retained pair {i} missing from every class");
                }
            }
        }
    }
}
