//! Engine configuration.
//!
//! [`XcorrConfig`] holds every tunable parameter of the connectivity
//! pipeline.  Defaults: ten lags, 16-channel tiles, no smoothing.
use crate::error::{Result, XcorrError};
use crate::pearson::DegeneratePolicy;
use crate::xcorr::LagConvention;

/// Configuration for [`crate::infer_net`] and [`crate::lag_tensor`].
///
/// All fields are `pub`, so use struct-update syntax:
///
/// ```
/// use xcorr_net::XcorrConfig;
///
/// let cfg = XcorrConfig {
///     dt_max: 5,
///     smooth: Some(3),
///     ..XcorrConfig::default()
/// };
/// assert_eq!(cfg.chunk_size, 16);
/// ```
#[derive(Debug, Clone)]
pub struct XcorrConfig {
    /// Number of lags evaluated: `d ∈ [0, dt_max)`.
    ///
    /// The input must have more than `dt_max + 1` time bins (after
    /// smoothing, if enabled).
    ///
    /// Default: `10`.
    pub dt_max: usize,

    /// Trailing moving-average window applied before correlating.
    ///
    /// `Some(w)` shortens the series from `T` to `T - w + 1` rows.
    ///
    /// Default: `None` (no smoothing).
    pub smooth: Option<usize>,

    /// Side length of the square channel tiles each lag slice is computed
    /// in.
    ///
    /// Bounds the transient working set to two `chunk_size × (T - d)`
    /// centered blocks.  Has no effect on the result.
    ///
    /// Default: `16`.
    pub chunk_size: usize,

    /// Which window of the pair is shifted forward.
    ///
    /// Default: [`LagConvention::SourceLeads`] (`H[i, j, d]` correlates
    /// channel `i` at `t` with channel `j` at `t + d`).
    pub convention: LagConvention,

    /// What a zero-variance window contributes.
    ///
    /// Default: [`DegeneratePolicy::Zero`].
    pub degenerate: DegeneratePolicy,
}

impl Default for XcorrConfig {
    fn default() -> Self {
        Self {
            dt_max: 10,
            smooth: None,
            chunk_size: 16,
            convention: LagConvention::SourceLeads,
            degenerate: DegeneratePolicy::Zero,
        }
    }
}

impl XcorrConfig {
    /// Default configuration with a custom lag count.
    ///
    /// ```
    /// use xcorr_net::XcorrConfig;
    /// assert_eq!(XcorrConfig::with_dt_max(4).dt_max, 4);
    /// ```
    pub fn with_dt_max(dt_max: usize) -> Self {
        Self { dt_max, ..Self::default() }
    }

    /// Check the parameters that do not depend on the input shape.
    ///
    /// `dt_max` is checked together with the series length by the engine.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(XcorrError::InvalidChunkSize);
        }
        if self.smooth == Some(0) {
            return Err(XcorrError::InvalidWindow);
        }
        Ok(())
    }
}
