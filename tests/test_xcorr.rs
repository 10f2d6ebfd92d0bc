mod common;
use common::{event_counts, max_abs_diff3, naive_lag_tensor, white_noise};
use ndarray::{Array2, Axis};
use xcorr_net::{
    dominant_lag, estimate_connectivity, lag_tensor, xcorr, DegeneratePolicy, LagConvention,
    XcorrConfig, XcorrError,
};

/// Column 1 repeats column 0 `delay` bins later; column 2 is independent.
fn delayed_copy(n_t: usize, delay: usize, seed: u64) -> Array2<f64> {
    let mut s = white_noise(n_t, 3, seed);
    for t in delay..n_t {
        s[[t, 1]] = s[[t - delay, 0]];
    }
    s
}

#[test]
fn matches_naive_pearson() {
    let s = white_noise(60, 5, 1);
    let h = xcorr(&s, 4).unwrap();
    let h_ref = naive_lag_tensor(&s, 4);
    let err = max_abs_diff3(&h, &h_ref);
    assert!(err < 1e-12, "max abs error {err:.2e} vs naive pearson");
}

#[test]
fn matches_naive_pearson_on_counts() {
    let s = event_counts(200, 7, 2);
    let h = xcorr(&s, 6).unwrap();
    let err = max_abs_diff3(&h, &naive_lag_tensor(&s, 6));
    assert!(err < 1e-12, "max abs error {err:.2e} vs naive pearson");
}

#[test]
fn coefficients_in_unit_interval() {
    let s = event_counts(120, 9, 3);
    let h = xcorr(&s, 8).unwrap();
    for &v in h.iter() {
        assert!((-1.0..=1.0).contains(&v), "coefficient {v} out of range");
    }
}

#[test]
fn zero_lag_self_correlation_removed() {
    let s = white_noise(80, 6, 4);
    let h = xcorr(&s, 3).unwrap();
    for i in 0..6 {
        assert_eq!(h[[i, i, 0]], 0.0);
    }
}

#[test]
fn tiling_does_not_change_result() {
    let s = white_noise(90, 20, 5);
    let reference = lag_tensor(&s, &XcorrConfig { dt_max: 5, chunk_size: 16, ..XcorrConfig::default() })
        .unwrap();
    for chunk_size in [1, 3, 7, 20, 25] {
        let cfg = XcorrConfig { dt_max: 5, chunk_size, ..XcorrConfig::default() };
        let h = lag_tensor(&s, &cfg).unwrap();
        let err = max_abs_diff3(&h, &reference);
        assert!(err < 1e-12, "chunk_size={chunk_size}: max abs diff {err:.2e}");
    }
}

#[test]
fn lag_zero_only_is_symmetric() {
    let s = event_counts(100, 8, 6);
    let c = estimate_connectivity(&s, 1).unwrap();
    for i in 0..8 {
        for j in 0..8 {
            approx::assert_abs_diff_eq!(c[[i, j]], c[[j, i]], epsilon = 1e-12);
        }
    }
}

#[test]
fn delayed_copy_is_asymmetric() {
    let s = delayed_copy(300, 3, 7);
    let c = estimate_connectivity(&s, 6).unwrap();
    assert!(c[[0, 1]] > 1.0);
    assert!(
        c[[0, 1]] > c[[1, 0]],
        "source-leads: C[0,1]={} should exceed C[1,0]={}",
        c[[0, 1]],
        c[[1, 0]]
    );
}

#[test]
fn delayed_copy_scenario() {
    // 100 x 3: column 1 is column 0 delayed by 2 rows, column 2 independent.
    let s = delayed_copy(100, 2, 8);
    let cfg = XcorrConfig::with_dt_max(5);
    let h = lag_tensor(&s, &cfg).unwrap();
    approx::assert_abs_diff_eq!(h[[0, 1, 2]], 1.0, epsilon = 1e-12);

    let c = estimate_connectivity(&s, 5).unwrap();
    for i in 0..3 {
        for j in 0..3 {
            if i != j && (i, j) != (0, 1) {
                assert!(
                    c[[0, 1]] > c[[i, j]],
                    "C[0,1]={} not larger than C[{i},{j}]={}",
                    c[[0, 1]],
                    c[[i, j]]
                );
            }
        }
    }
    assert_eq!(dominant_lag(&h)[[0, 1]], 2);
}

#[test]
fn target_leads_is_transpose() {
    let s = white_noise(70, 6, 9);
    let src = lag_tensor(&s, &XcorrConfig::with_dt_max(4)).unwrap();
    let tgt = lag_tensor(
        &s,
        &XcorrConfig {
            dt_max: 4,
            convention: LagConvention::TargetLeads,
            ..XcorrConfig::default()
        },
    )
    .unwrap();
    for d in 0..4 {
        let swapped = src.index_axis(Axis(2), d).reversed_axes().to_owned();
        for ((i, j), &v) in swapped.indexed_iter() {
            approx::assert_abs_diff_eq!(tgt[[i, j, d]], v, epsilon = 1e-12);
        }
    }
}

#[test]
fn constant_column_yields_zero_not_nan() {
    let mut s = white_noise(100, 3, 10);
    s.column_mut(2).fill(5.0);
    let h = xcorr(&s, 4).unwrap();
    assert!(h.iter().all(|v| v.is_finite()));
    for k in 0..3 {
        for d in 0..4 {
            assert_eq!(h[[k, 2, d]], 0.0);
            assert_eq!(h[[2, k, d]], 0.0);
        }
    }
    let c = estimate_connectivity(&s, 4).unwrap();
    assert!(c.iter().all(|v| v.is_finite()));
    assert!(c[[0, 1]] > 0.0);
}

#[test]
fn nan_policy_propagates() {
    let mut s = white_noise(100, 3, 11);
    s.column_mut(2).fill(5.0);
    let cfg = XcorrConfig { dt_max: 4, degenerate: DegeneratePolicy::Nan, ..XcorrConfig::default() };
    let h = lag_tensor(&s, &cfg).unwrap();
    assert!(h[[0, 2, 1]].is_nan());
    assert!(h[[0, 1, 1]].is_finite());
    // The lag-0 diagonal is cleared even for a degenerate channel.
    assert_eq!(h[[2, 2, 0]], 0.0);
}

#[test]
fn error_policy_reports_first_degenerate_lag() {
    // Channel 1 varies only in its first three bins: the lagged window
    // S[d.., 1] is constant from d = 3 on.
    let mut s = white_noise(50, 3, 12);
    for t in 3..50 {
        s[[t, 1]] = 1.0;
    }
    let cfg = XcorrConfig { dt_max: 5, degenerate: DegeneratePolicy::Error, ..XcorrConfig::default() };
    assert_eq!(
        lag_tensor(&s, &cfg),
        Err(XcorrError::DegenerateVariance { channel: 1, lag: 3 })
    );

    let zero = lag_tensor(&s, &XcorrConfig::with_dt_max(5)).unwrap();
    assert_eq!(zero[[0, 1, 3]], 0.0);
    assert_ne!(zero[[0, 1, 2]], 0.0);
}

#[test]
fn scale_invariant_at_extreme_magnitudes() {
    let s = delayed_copy(100, 2, 15);
    let h = xcorr(&s, 4).unwrap();
    approx::assert_abs_diff_eq!(h[[0, 1, 2]], 1.0, epsilon = 1e-12);

    let strict = XcorrConfig { dt_max: 4, degenerate: DegeneratePolicy::Error, ..XcorrConfig::default() };
    for scale in [1e200, 1e-170] {
        let scaled = s.mapv(|v| v * scale);
        let hs = xcorr(&scaled, 4).unwrap();
        assert!(max_abs_diff3(&h, &hs) < 1e-12, "scale {scale:e}");
        assert!(lag_tensor(&scaled, &strict).is_ok(), "scale {scale:e}");
    }
}

#[test]
fn invalid_shapes_fail_fast() {
    let s = white_noise(6, 2, 13);
    assert_eq!(
        xcorr(&s, 5),
        Err(XcorrError::InvalidShape { n_times: 6, n_channels: 2, dt_max: 5 })
    );
    assert!(xcorr(&s, 4).is_ok());
    assert!(matches!(xcorr(&s, 0), Err(XcorrError::InvalidShape { .. })));

    let empty = Array2::<f64>::zeros((20, 0));
    assert!(matches!(xcorr(&empty, 2), Err(XcorrError::InvalidShape { .. })));

    let cfg = XcorrConfig { dt_max: 2, chunk_size: 0, ..XcorrConfig::default() };
    assert_eq!(lag_tensor(&s, &cfg), Err(XcorrError::InvalidChunkSize));
}

#[test]
fn repeated_calls_are_identical() {
    let s = event_counts(150, 12, 14);
    let a = estimate_connectivity(&s, 7).unwrap();
    let b = estimate_connectivity(&s, 7).unwrap();
    assert_eq!(a, b);
}
