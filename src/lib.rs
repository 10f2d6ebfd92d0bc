//! # xcorr-net: lagged cross-correlation connectivity in pure Rust
//!
//! `xcorr-net` estimates a directed coupling matrix between the channels of a
//! multichannel event-count recording (spike trains, binned events) from
//! their pairwise time-lagged Pearson correlation.  It is the cheap baseline
//! one runs before fitting a Hawkes-type point-process model.
//!
//! ## Pipeline overview
//!
//! ```text
//! S  [T, N]  time-major series
//!   │
//!   ├─ smooth::moving_average()   optional trailing mean → [T - w + 1, N]
//!   ├─ xcorr::lag_tensor()        H[i, j, d] = pearson(S[..T-d, i], S[d.., j])
//!   │                             tiled per lag, lags in parallel, H[i, i, 0] = 0
//!   └─ connectivity()             C[i, j] = Σ_d |H[i, j, d]|
//!        │
//!        └─→ NetEstimate { lag_tensor: [N, N, dt_max], connectivity: [N, N] }
//! ```
//!
//! ## Quick start
//!
//! ```
//! use ndarray::Array2;
//! use xcorr_net::estimate_connectivity;
//!
//! // Channel 1 repeats channel 0 two bins later.
//! let x: Vec<f64> = (0..200)
//!     .map(|t| ((t as f64 * 12.9898).sin() * 43758.5453).fract())
//!     .collect();
//! let s = Array2::from_shape_fn((200, 2), |(t, c)| {
//!     if c == 0 { x[t] } else if t >= 2 { x[t - 2] } else { 0.0 }
//! });
//!
//! let c = estimate_connectivity(&s, 5).unwrap();
//! assert!(c[[0, 1]] > c[[1, 0]]);
//! ```
//!
//! ## Configuring the engine
//!
//! ```
//! use ndarray::Array2;
//! use xcorr_net::{infer_net, DegeneratePolicy, LagConvention, XcorrConfig};
//!
//! let s: Array2<f64> = Array2::from_shape_fn((500, 20), |(t, c)| ((t * (c + 1)) % 7) as f64);
//! let cfg = XcorrConfig {
//!     dt_max: 8,
//!     smooth: Some(4),
//!     chunk_size: 8,
//!     convention: LagConvention::SourceLeads,
//!     degenerate: DegeneratePolicy::Zero,
//! };
//! let est = infer_net(&s, &cfg).unwrap();
//! assert_eq!(est.lag_tensor.dim(), (20, 20, 8));
//! for pair in est.top_pairs(3) {
//!     println!("{} → {}: {:.3}", pair.source, pair.target, pair.score);
//! }
//! ```

pub mod config;
pub mod connectivity;
pub mod error;
pub mod io;
pub mod pearson;
pub mod smooth;
pub mod xcorr;

use ndarray::Array2;
use tracing::debug;

// ── Crate-root re-exports ─────────────────────────────────────────────────

pub use config::XcorrConfig;
pub use connectivity::{connectivity, dominant_lag, top_pairs, NetEstimate, ScoredPair};
pub use error::{Result, XcorrError};
pub use io::{write_estimate, SeriesData, StWriter};
pub use pearson::{corrcoef_block, pearson, DegeneratePolicy};
pub use smooth::moving_average;
pub use xcorr::{lag_slice, lag_tensor, xcorr, LagConvention};

/// Run the **full connectivity pipeline** on one recording.
///
/// 1. Smooth with [`XcorrConfig::smooth`] if set.
/// 2. Build the lag tensor `H` ([N, N, dt_max]) under
///    [`XcorrConfig::convention`], tiled by [`XcorrConfig::chunk_size`].
/// 3. Zero the lag-0 self-correlations.
/// 4. Reduce to `C[i, j] = Σ_d |H[i, j, d]|`.
///
/// `series` is `[T, N]`, rows in time order, and is never modified.
///
/// # Errors
///
/// * [`XcorrError::NonFiniteSample`] at the input row, before smoothing.
/// * Smoothing errors ([`XcorrError::InvalidWindow`],
///   [`XcorrError::SmootherWindowTooLarge`]).
/// * Any error of [`lag_tensor`], checked against the smoothed length.
pub fn infer_net(series: &Array2<f64>, cfg: &XcorrConfig) -> Result<NetEstimate> {
    cfg.validate()?;
    // Before smoothing, so a bad sample is reported at its input row.
    xcorr::check_finite(series.view())?;

    let h = match cfg.smooth {
        Some(window) => {
            let smoothed = smooth::moving_average(series, window)?;
            xcorr::lag_tensor(&smoothed, cfg)?
        }
        None => xcorr::lag_tensor(series, cfg)?,
    };

    let est = NetEstimate::from_lag_tensor(h);
    debug!(n_channels = est.n_channels(), dt_max = est.dt_max(), "connectivity estimated");
    Ok(est)
}

/// Connectivity matrix `C` ([N, N]) of `series` ([T, N]) over `dt_max` lags
/// with the default settings: no smoothing, 16-channel tiles,
/// [`LagConvention::SourceLeads`], [`DegeneratePolicy::Zero`].
///
/// # Errors
///
/// [`XcorrError::InvalidShape`] unless `N ≥ 1`, `dt_max ≥ 1` and
/// `T > dt_max + 1`; [`XcorrError::NonFiniteSample`] for NaN/inf input.
pub fn estimate_connectivity(series: &Array2<f64>, dt_max: usize) -> Result<Array2<f64>> {
    let est = infer_net(series, &XcorrConfig::with_dt_max(dt_max))?;
    Ok(est.connectivity)
}
