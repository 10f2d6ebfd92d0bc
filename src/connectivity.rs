//! Reduction of the lag tensor to a connectivity matrix, plus ranking
//! helpers.
//!
//! `C[i, j] = Σ_d |H[i, j, d]|`
use std::cmp::Ordering;

use ndarray::{Array2, Array3, Axis};

/// Lag-aggregated, unsigned coupling strength ([N, N]).
///
/// NaN entries of `h` (only possible under [`crate::DegeneratePolicy::Nan`])
/// propagate into the corresponding `C[i, j]`.
pub fn connectivity(h: &Array3<f64>) -> Array2<f64> {
    h.fold_axis(Axis(2), 0.0, |acc, &v| acc + v.abs())
}

/// Lag with the largest `|H[i, j, d]|` for every pair ([N, N]).
///
/// Ties resolve to the smaller lag; NaN entries are skipped.  A pair whose
/// entries are all NaN reports lag 0.
pub fn dominant_lag(h: &Array3<f64>) -> Array2<usize> {
    h.map_axis(Axis(2), |lane| {
        let mut best = (0, f64::NEG_INFINITY);
        for (d, &v) in lane.iter().enumerate() {
            if !v.is_nan() && v.abs() > best.1 {
                best = (d, v.abs());
            }
        }
        best.0
    })
}

/// One off-diagonal entry of a connectivity matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredPair {
    pub source: usize,
    pub target: usize,
    pub score: f64,
}

/// The `k` strongest off-diagonal pairs of `c`, strongest first.
///
/// Equal scores are ordered by `(source, target)`; NaN scores sort last.
///
/// ```
/// use ndarray::array;
/// use xcorr_net::connectivity::top_pairs;
///
/// let c = array![[9.0, 0.2], [0.7, 9.0]];
/// let top = top_pairs(&c, 1);
/// assert_eq!((top[0].source, top[0].target), (1, 0));
/// ```
pub fn top_pairs(c: &Array2<f64>, k: usize) -> Vec<ScoredPair> {
    let mut pairs: Vec<ScoredPair> = c
        .indexed_iter()
        .filter(|((i, j), _)| i != j)
        .map(|((source, target), &score)| ScoredPair { source, target, score })
        .collect();
    pairs.sort_by(|a, b| {
        by_score_desc(a.score, b.score)
            .then(a.source.cmp(&b.source))
            .then(a.target.cmp(&b.target))
    });
    pairs.truncate(k);
    pairs
}

fn by_score_desc(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}

/// Output of [`crate::infer_net`]: the lag tensor and its reduction.
#[derive(Debug, Clone)]
pub struct NetEstimate {
    /// `H`, shape [N, N, dt_max].
    pub lag_tensor: Array3<f64>,
    /// `C`, shape [N, N].
    pub connectivity: Array2<f64>,
}

impl NetEstimate {
    /// Reduce `lag_tensor` and keep both.
    pub fn from_lag_tensor(lag_tensor: Array3<f64>) -> Self {
        let connectivity = connectivity(&lag_tensor);
        Self { lag_tensor, connectivity }
    }

    pub fn n_channels(&self) -> usize {
        self.connectivity.nrows()
    }

    pub fn dt_max(&self) -> usize {
        self.lag_tensor.len_of(Axis(2))
    }

    pub fn dominant_lag(&self) -> Array2<usize> {
        dominant_lag(&self.lag_tensor)
    }

    pub fn top_pairs(&self, k: usize) -> Vec<ScoredPair> {
        top_pairs(&self.connectivity, k)
    }
}
