//! Lagged cross-correlation tensor.
//!
//! For a time-major series `S` ([T, N]) and `dt_max` lags:
//!
//! ```text
//! H[i, j, d] = pearson(A[:, i], B[:, j])        d ∈ [0, dt_max)
//!
//! SourceLeads:  A = S[0 .. T-d, :]   B = S[d .. T, :]
//! TargetLeads:  A = S[d .. T, :]     B = S[0 .. T-d, :]
//!
//! H[i, i, 0] = 0
//! ```
//!
//! Each lag slice is computed in square `chunk_size × chunk_size` channel
//! tiles so that only two centered `chunk_size × (T - d)` blocks are live at
//! once.  Lags are independent and are evaluated in parallel; every worker
//! writes only its own `H[:, :, d]`.
use std::ops::Range;

use ndarray::{s, Array2, Array3, ArrayView2, ArrayViewMut2, Axis};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::XcorrConfig;
use crate::error::{Result, XcorrError};
use crate::pearson::{is_constant, CenteredBlock, DegeneratePolicy};

/// Which of the two aligned windows is shifted forward in time.
///
/// The connectivity matrix is not symmetric once lags are involved, so the
/// orientation matters: under `SourceLeads` a large `C[i, j]` means channel
/// `i` precedes channel `j`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LagConvention {
    /// `H[i, j, d]` pairs channel `i` at time `t` with channel `j` at `t + d`.
    #[default]
    SourceLeads,
    /// `H[i, j, d]` pairs channel `i` at time `t + d` with channel `j` at `t`.
    /// Equal to the `SourceLeads` tensor with `i` and `j` swapped.
    TargetLeads,
}

impl LagConvention {
    /// The `(leading, lagged)` windows of `series` for `lag`, each
    /// `[T - lag, N]`.
    ///
    /// `lag` must be smaller than the number of rows.
    pub fn windows<'a>(
        self,
        series: ArrayView2<'a, f64>,
        lag: usize,
    ) -> (ArrayView2<'a, f64>, ArrayView2<'a, f64>) {
        let n_t = series.nrows();
        let early = series.slice_move(s![..n_t - lag, ..]);
        let late = series.slice_move(s![lag.., ..]);
        match self {
            LagConvention::SourceLeads => (early, late),
            LagConvention::TargetLeads => (late, early),
        }
    }
}

/// Split `0..n` into consecutive ranges of at most `chunk` elements.
///
/// ```
/// use xcorr_net::xcorr::tile_ranges;
/// let tiles: Vec<_> = tile_ranges(5, 2).collect();
/// assert_eq!(tiles, vec![0..2, 2..4, 4..5]);
/// ```
pub fn tile_ranges(n: usize, chunk: usize) -> impl Iterator<Item = Range<usize>> + Clone {
    let chunk = chunk.max(1);
    (0..n).step_by(chunk).map(move |start| start..(start + chunk).min(n))
}

/// Reject series that leave fewer than two aligned samples at the largest lag.
pub fn check_shape(series: ArrayView2<f64>, dt_max: usize) -> Result<()> {
    let (n_times, n_channels) = series.dim();
    if n_channels == 0 || dt_max == 0 || n_times <= dt_max + 1 {
        return Err(XcorrError::InvalidShape { n_times, n_channels, dt_max });
    }
    Ok(())
}

/// Reject NaN and infinite samples.
pub fn check_finite(series: ArrayView2<f64>) -> Result<()> {
    match series.indexed_iter().find(|(_, v)| !v.is_finite()) {
        Some(((time, channel), _)) => Err(XcorrError::NonFiniteSample { time, channel }),
        None => Ok(()),
    }
}

/// Build the full lag tensor `H` ([N, N, dt_max]) for `series` ([T, N]).
///
/// `cfg.smooth` is ignored here; smoothing belongs to [`crate::infer_net`].
///
/// # Errors
///
/// * [`XcorrError::InvalidShape`] unless `N ≥ 1`, `dt_max ≥ 1` and
///   `T > dt_max + 1`.
/// * [`XcorrError::InvalidChunkSize`] if `cfg.chunk_size == 0`.
/// * [`XcorrError::NonFiniteSample`] if `series` holds NaN or ±inf.
/// * [`XcorrError::DegenerateVariance`] under [`DegeneratePolicy::Error`],
///   for the smallest lag with a constant window.
pub fn lag_tensor(series: &Array2<f64>, cfg: &XcorrConfig) -> Result<Array3<f64>> {
    cfg.validate()?;
    check_shape(series.view(), cfg.dt_max)?;
    check_finite(series.view())?;

    let (n_t, n_ch) = series.dim();
    debug!(
        n_times = n_t,
        n_channels = n_ch,
        dt_max = cfg.dt_max,
        chunk_size = cfg.chunk_size,
        convention = ?cfg.convention,
        "computing lag tensor"
    );

    let view = series.view();
    let mut h = Array3::<f64>::zeros((n_ch, n_ch, cfg.dt_max));
    let per_lag: Vec<Result<usize>> = h
        .axis_iter_mut(Axis(2))
        .into_par_iter()
        .enumerate()
        .map(|(lag, slot)| compute_slice(view, lag, cfg, slot))
        .collect();

    let mut n_degenerate = 0;
    for result in per_lag {
        n_degenerate += result?;
    }
    if n_degenerate > 0 {
        warn!(
            n_degenerate,
            policy = ?cfg.degenerate,
            "zero-variance windows produced undefined correlations"
        );
    }
    Ok(h)
}

/// Build one lag slice `H[:, :, lag]` ([N, N]).
///
/// The diagonal is zeroed when `lag == 0`.  Same errors as [`lag_tensor`]
/// with `dt_max = lag + 1`.
pub fn lag_slice(series: &Array2<f64>, lag: usize, cfg: &XcorrConfig) -> Result<Array2<f64>> {
    cfg.validate()?;
    check_shape(series.view(), lag + 1)?;
    check_finite(series.view())?;
    let n_ch = series.ncols();
    let mut slice = Array2::<f64>::zeros((n_ch, n_ch));
    compute_slice(series.view(), lag, cfg, slice.view_mut())?;
    Ok(slice)
}

/// [`lag_tensor`] with the default configuration and `dt_max` lags.
pub fn xcorr(series: &Array2<f64>, dt_max: usize) -> Result<Array3<f64>> {
    lag_tensor(series, &XcorrConfig::with_dt_max(dt_max))
}

/// Tiled computation of one lag slice, written into `out` ([N, N]).
/// Returns the number of undefined coefficients that were substituted.
///
/// At lag 0 the diagonal is written as 0 and never counts as undefined.
fn compute_slice(
    series: ArrayView2<f64>,
    lag: usize,
    cfg: &XcorrConfig,
    mut out: ArrayViewMut2<f64>,
) -> Result<usize> {
    let n_ch = series.ncols();
    let (leading, lagged) = cfg.convention.windows(series, lag);

    // A single channel at lag 0 only has the cleared diagonal.
    if cfg.degenerate == DegeneratePolicy::Error && (lag > 0 || n_ch > 1) {
        if let Some(channel) = (0..n_ch)
            .find(|&c| is_constant(leading.column(c)) || is_constant(lagged.column(c)))
        {
            return Err(XcorrError::DegenerateVariance { channel, lag });
        }
    }

    let mut n_degenerate = 0;
    let tiles = tile_ranges(n_ch, cfg.chunk_size);
    for rows in tiles.clone() {
        let a = CenteredBlock::new(leading.slice(s![.., rows.clone()]));
        for cols in tiles.clone() {
            let b = CenteredBlock::new(lagged.slice(s![.., cols.clone()]));
            let mut tile = out.slice_mut(s![rows.clone(), cols.clone()]);
            for ((k, l), h) in tile.indexed_iter_mut() {
                if lag == 0 && rows.start + k == cols.start + l {
                    *h = 0.0;
                    continue;
                }
                let r = a.correlate(k, &b, l);
                if !r.is_nan() {
                    *h = r;
                    continue;
                }
                n_degenerate += 1;
                *h = match cfg.degenerate.substitute() {
                    Some(v) => v,
                    None => {
                        let channel = if a.is_degenerate(k) { rows.start + k } else { cols.start + l };
                        return Err(XcorrError::DegenerateVariance { channel, lag });
                    }
                };
            }
        }
    }
    Ok(n_degenerate)
}
