//! Pearson correlation kernel.
//!
//! Two-pass formulation: every column is first centered on its own mean,
//! then
//!
//! ```text
//! r(x, y) = Σ x̃ ỹ / (‖x̃‖ · ‖ỹ‖)
//! ```
//!
//! clamped to `[-1, 1]` to absorb rounding.  Each coefficient depends only
//! on its two columns, so splitting a correlation matrix into blocks gives
//! bit-identical results.
//!
//! Centered columns are rescaled to unit peak before their norm is taken,
//! so the coefficient is the same at any input magnitude.  A constant column
//! (all samples exactly equal) has no defined correlation.  The raw kernel reports it as NaN; callers decide what to
//! do with it through [`DegeneratePolicy`].
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// What a zero-variance window contributes to the lag tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegeneratePolicy {
    /// Substitute `0.0`: the pair contributes nothing at that lag.
    #[default]
    Zero,
    /// Keep NaN.  It propagates into the connectivity sum for the pair.
    Nan,
    /// Fail with [`crate::XcorrError::DegenerateVariance`].
    Error,
}

impl DegeneratePolicy {
    /// Value written in place of an undefined coefficient, or `None` when the
    /// policy is to fail.
    pub fn substitute(self) -> Option<f64> {
        match self {
            DegeneratePolicy::Zero => Some(0.0),
            DegeneratePolicy::Nan => Some(f64::NAN),
            DegeneratePolicy::Error => None,
        }
    }
}

/// Columns of a time-major block, mean-removed and stored channel-major
/// (`[C, L]`) so each channel is a contiguous row.
#[derive(Debug, Clone)]
pub struct CenteredBlock {
    rows: Array2<f64>,
    norms: Vec<f64>,
}

impl CenteredBlock {
    /// Center every column of `block` ([L, C]).
    pub fn new(block: ArrayView2<f64>) -> Self {
        let (n_t, n_ch) = block.dim();
        let mut rows = Array2::<f64>::zeros((n_ch, n_t));
        let mut norms = Vec::with_capacity(n_ch);

        for (col, mut row) in block.axis_iter(Axis(1)).zip(rows.rows_mut()) {
            if is_constant(col) {
                norms.push(0.0);
                continue;
            }
            let mean = col.sum() / n_t as f64;
            row.zip_mut_with(&col, |r, &v| *r = v - mean);
            // Non-constant, so the peak is > 0 and the squared sum stays in range.
            let peak = row.fold(0.0_f64, |m, &v| m.max(v.abs()));
            row.mapv_inplace(|v| v / peak);
            norms.push(row.dot(&row).sqrt());
        }

        Self { rows, norms }
    }

    pub fn n_channels(&self) -> usize {
        self.norms.len()
    }

    /// Number of aligned samples per channel.
    pub fn n_samples(&self) -> usize {
        self.rows.ncols()
    }

    /// `true` when channel `k` is constant in this block.
    pub fn is_degenerate(&self, k: usize) -> bool {
        self.norms[k] == 0.0
    }

    /// Pearson coefficient between channel `k` of `self` and channel `l` of
    /// `other`.  NaN when either channel is degenerate.
    ///
    /// # Panics
    ///
    /// If the blocks have different sample counts.
    pub fn correlate(&self, k: usize, other: &CenteredBlock, l: usize) -> f64 {
        assert_eq!(self.n_samples(), other.n_samples(), "blocks are not aligned");
        let denom = self.norms[k] * other.norms[l];
        if denom == 0.0 {
            return f64::NAN;
        }
        let num = self.rows.row(k).dot(&other.rows.row(l));
        (num / denom).clamp(-1.0, 1.0)
    }
}

/// Pearson correlation of two equal-length series.  NaN if either is
/// constant.
///
/// ```
/// use ndarray::array;
/// use xcorr_net::pearson::pearson;
///
/// let x = array![1.0, 2.0, 3.0, 4.0];
/// let y = array![2.0, 4.0, 6.0, 8.0];
/// assert!((pearson(x.view(), y.view()) - 1.0).abs() < 1e-12);
/// ```
///
/// # Panics
///
/// If `x` and `y` differ in length.
pub fn pearson(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    let bx = CenteredBlock::new(x.insert_axis(Axis(1)));
    let by = CenteredBlock::new(y.insert_axis(Axis(1)));
    bx.correlate(0, &by, 0)
}

/// Correlate every column of `a` ([L, Na]) with every column of `b`
/// ([L, Nb]).  Returns [Na, Nb]; degenerate pairs are NaN.
///
/// # Panics
///
/// If `a` and `b` have different row counts.
pub fn corrcoef_block(a: ArrayView2<f64>, b: ArrayView2<f64>) -> Array2<f64> {
    let ca = CenteredBlock::new(a);
    let cb = CenteredBlock::new(b);
    Array2::from_shape_fn((ca.n_channels(), cb.n_channels()), |(k, l)| {
        ca.correlate(k, &cb, l)
    })
}

/// `true` when every element equals the first one (or the view is empty).
pub fn is_constant(x: ArrayView1<f64>) -> bool {
    match x.first() {
        Some(&first) => x.iter().all(|&v| v == first),
        None => true,
    }
}
