/// Shared helpers for integration tests.
use ndarray::{Array2, Array3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;

/// Uniform white noise in [-0.5, 0.5), shape [T, N].
#[allow(unused)]
pub fn white_noise(n_t: usize, n_ch: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_simple_fn((n_t, n_ch), || rng.gen::<f64>() - 0.5)
}

/// Non-negative integer event counts, shape [T, N].
#[allow(unused)]
pub fn event_counts(n_t: usize, n_ch: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_simple_fn((n_t, n_ch), || rng.gen_range(0..5) as f64)
}

/// Textbook two-pass Pearson coefficient; NaN on zero variance.
#[allow(unused)]
pub fn naive_pearson(x: &[f64], y: &[f64]) -> f64 {
    assert_eq!(x.len(), y.len());
    let n = x.len() as f64;
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx) * (a - mx);
        syy += (b - my) * (b - my);
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    sxy / (sxx * syy).sqrt()
}

/// `H[i, j, d]` computed one entry at a time, source-leads convention,
/// lag-0 diagonal zeroed.
#[allow(unused)]
pub fn naive_lag_tensor(s: &Array2<f64>, dt_max: usize) -> Array3<f64> {
    let (n_t, n_ch) = s.dim();
    let mut h = Array3::zeros((n_ch, n_ch, dt_max));
    for d in 0..dt_max {
        for i in 0..n_ch {
            let x: Vec<f64> = (0..n_t - d).map(|t| s[[t, i]]).collect();
            for j in 0..n_ch {
                if d == 0 && i == j {
                    continue;
                }
                let y: Vec<f64> = (d..n_t).map(|t| s[[t, j]]).collect();
                h[[i, j, d]] = naive_pearson(&x, &y);
            }
        }
    }
    h
}

/// Maximum absolute difference between two tensors of equal shape.
#[allow(unused)]
pub fn max_abs_diff3(a: &Array3<f64>, b: &Array3<f64>) -> f64 {
    assert_eq!(a.dim(), b.dim());
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).fold(0.0_f64, f64::max)
}

/// Per-test scratch file under the system temp dir.
#[allow(unused)]
pub fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("xcorr_net_{}_{name}.safetensors", std::process::id()))
}
