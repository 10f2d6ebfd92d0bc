//! Trailing moving-average smoother.
//!
//! `data`: [T, N]  →  `out[t, n] = mean(data[t ..= t + w - 1, n])`,
//! shape [T - w + 1, N].
//!
//! Computed from per-channel prefix sums in f64:
//!
//! ```text
//! P[t]   = Σ_{k ≤ t} data[k]
//! out[0] = P[w - 1] / w
//! out[t] = (P[t + w - 1] - P[t - 1]) / w
//! ```
use ndarray::{s, Array2, Axis};
use tracing::debug;

use crate::error::{Result, XcorrError};

/// Smooth every channel of `data` ([T, N]) with a trailing window of
/// `window` samples.
///
/// `window == T` is allowed and returns a single row of channel means.
///
/// # Errors
///
/// * [`XcorrError::InvalidWindow`] if `window == 0`.
/// * [`XcorrError::SmootherWindowTooLarge`] if `window > T`.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use xcorr_net::smooth::moving_average;
///
/// let data = array![[1.0], [2.0], [3.0], [4.0]];
/// let out = moving_average(&data, 2).unwrap();
/// assert_eq!(out, array![[1.5], [2.5], [3.5]]);
/// ```
pub fn moving_average(data: &Array2<f64>, window: usize) -> Result<Array2<f64>> {
    let (n_t, n_ch) = data.dim();
    if window == 0 {
        return Err(XcorrError::InvalidWindow);
    }
    if window > n_t {
        return Err(XcorrError::SmootherWindowTooLarge { window, n_times: n_t });
    }

    let mut csum = data.to_owned();
    csum.accumulate_axis_inplace(Axis(0), |&prev, cur| *cur += prev);

    let n_out = n_t - window + 1;
    let mut out = csum.slice(s![window - 1.., ..]).to_owned();
    {
        let mut tail = out.slice_mut(s![1.., ..]);
        tail -= &csum.slice(s![..n_out - 1, ..]);
    }
    let inv = 1.0 / window as f64;
    out.mapv_inplace(|v| v * inv);

    debug!(n_times = n_t, n_channels = n_ch, window, n_out, "smoothed series");
    Ok(out)
}
