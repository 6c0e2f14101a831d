use diagmatch::diagram::CriticalType::*;
use diagmatch::{
    diagram_distance, BottleneckConfig, BottleneckDistance, Error, Matching, PairClass,
    PersistencePair,
};

fn norm(w: &str) -> BottleneckConfig {
    BottleneckConfig {
        wasserstein: w.to_string(),
        ..BottleneckConfig::default()
    }
}

fn maximum(birth: f64, death: f64) -> PersistencePair {
    PersistencePair::new(Saddle2, birth, LocalMaximum, death)
}

#[test]
fn w2_between_single_pairs_is_the_persistence_gap() {
    for p in [0.25, 1.0, 3.0] {
        let d1 = [maximum(0.0, 10.0)];
        let d2 = [maximum(0.0, 10.0 + p)];
        let r = diagram_distance(&d1, &d2, &norm("2")).expect("distance should succeed");
        assert!((r.distance - p).abs() < 1e-9, "p={p} distance={:.6}", r.distance);
        assert_eq!(
            r.matchings,
            vec![Matching {
                first: 0,
                second: 0,
                cost: p
            }]
        );
    }
}

#[test]
fn bottleneck_takes_the_worst_of_three_matchings() {
    let d1 = [maximum(0.0, 10.0), maximum(0.0, 30.0), maximum(0.0, 50.0)];
    let d2 = [maximum(0.0, 11.0), maximum(0.0, 33.5), maximum(0.0, 52.0)];
    let r = diagram_distance(&d1, &d2, &norm("inf")).expect("distance should succeed");
    assert_eq!(r.distance, 3.5);
    assert_eq!(r.matchings.len(), 3);
    assert_eq!(r.added(PairClass::Max), 0.0);
    for m in &r.matchings {
        assert_eq!(m.first, m.second, "unexpected matching {m:?}");
    }
}

#[test]
fn empty_diagram_costs_the_persistence_of_the_other() {
    let d1 = [maximum(2.0, 7.0)];
    for w in ["1", "2", "inf"] {
        let r = diagram_distance(&d1, &[], &norm(w)).expect("distance should succeed");
        assert!(r.matchings.is_empty());
        assert!((r.distance - 5.0).abs() < 1e-9, "w={w} distance={:.6}", r.distance);

        // Same answer in the other orientation.
        let r = diagram_distance(&[], &d1, &norm(w)).expect("distance should succeed");
        assert!(!r.transposed);
        assert!((r.distance - 5.0).abs() < 1e-9, "w={w} distance={:.6}", r.distance);
    }
}

#[test]
fn larger_first_diagram_still_reports_caller_indices() {
    let d1 = [maximum(0.0, 4.0), maximum(0.0, 9.0), maximum(0.0, 20.0)];
    let d2 = [maximum(0.0, 20.5)];
    let r = diagram_distance(&d1, &d2, &norm("1")).expect("distance should succeed");
    assert!(r.transposed);
    assert_eq!(r.matchings.len(), 1);
    assert_eq!((r.matchings[0].first, r.matchings[0].second), (2, 0));
    assert!((r.matchings[0].cost - 0.5).abs() < 1e-12);
    // 0.5 matched + 4 + 9 sent to the diagonal.
    assert!((r.distance - 13.5).abs() < 1e-9);
    assert!((r.added(PairClass::Max) - 13.0).abs() < 1e-9);
}

#[test]
fn pairs_in_different_classes_are_never_matched() {
    // Identical values, different classes: both must go to the diagonal.
    let d1 = [PersistencePair::new(LocalMinimum, 0.0, Saddle1, 4.0)];
    let d2 = [PersistencePair::new(Saddle1, 0.0, Saddle2, 4.0)];
    let r = diagram_distance(&d1, &d2, &norm("1")).expect("distance should succeed");
    assert!(r.matchings.is_empty());
    assert!((r.distance - 8.0).abs() < 1e-9);
    assert!((r.added(PairClass::Min) - 4.0).abs() < 1e-9);
    assert!((r.added(PairClass::Saddle) - 4.0).abs() < 1e-9);
}

#[test]
fn irrelevant_pairs_are_ignored() {
    let d1 = [maximum(0.0, 10.0), maximum(0.0, 0.5)];
    let d2 = [maximum(0.0, 10.0)];
    let cfg = BottleneckConfig {
        relevance_percent: 10.0,
        ..norm("2")
    };
    let r = diagram_distance(&d1, &d2, &cfg).expect("distance should succeed");
    assert!((r.threshold - 0.95).abs() < 1e-12);
    assert_eq!(r.distance, 0.0);

    let r = diagram_distance(&d1, &d2, &norm("2")).expect("distance should succeed");
    assert!((r.distance - 0.5).abs() < 1e-9);
}

#[test]
fn large_norms_do_not_overflow() {
    let d1 = [maximum(0.0, 10.0)];
    for w in ["400", "2147483647"] {
        let r = diagram_distance(&d1, &[], &norm(w)).expect("distance should succeed");
        assert!((r.distance - 10.0).abs() < 1e-9, "w={w} distance={:.6}", r.distance);
    }

    let d1 = [maximum(0.0, 1e160), maximum(0.0, 4e160)];
    let d2 = [maximum(0.0, 1.1e160)];
    let r = diagram_distance(&d1, &d2, &norm("2")).expect("distance should succeed");
    assert_eq!(r.matchings.len(), 1);
    assert_eq!((r.matchings[0].first, r.matchings[0].second), (1, 0));
    // In units of 1e160: 4.0 matched to 1.1 (2.9), 1.0 discarded.
    let expected = (2.9f64 * 2.9 + 1.0).sqrt();
    assert!((r.distance / 1e160 - expected).abs() < 1e-9, "distance={:e}", r.distance);

    let err = BottleneckDistance::new(&norm("3000000000")).expect_err("norm should be rejected");
    assert_eq!(err.code(), -4);
}

#[test]
fn invalid_norm_reports_code_minus_four() {
    for bad in ["-3", "0", "two", ""] {
        let err = BottleneckDistance::new(&norm(bad)).expect_err("norm should be rejected");
        assert!(matches!(err, Error::InvalidNorm(_)), "{bad:?}: {err}");
        assert_eq!(err.code(), -4);
    }
}

#[test]
fn unsupported_modes_do_not_compute() {
    let d = [maximum(0.0, 1.0)];
    for sel in ["1", "legacy", "geometric", "3", "bench"] {
        let cfg = BottleneckConfig {
            algorithm: sel.to_string(),
            ..BottleneckConfig::default()
        };
        let err = diagram_distance(&d, &d, &cfg).expect_err("mode should be unsupported");
        assert_eq!(err.code(), -2, "{sel}: {err}");
    }
}

#[test]
fn invalid_weights_are_rejected() {
    let mut cfg = BottleneckConfig::default();
    cfg.weights.pe = -1.0;
    let err = BottleneckDistance::new(&cfg).expect_err("negative weight should be rejected");
    assert_eq!(err.code(), -5);
}
