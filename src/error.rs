//! Error type for the smoothing and lag-correlation routines.
//!
//! File I/O and the CLI use `anyhow` instead; every variant here converts
//! into `anyhow::Error` through `?`.
use thiserror::Error;

/// Failures reported by [`crate::smooth`], [`crate::xcorr`] and the
/// [`crate::infer_net`] pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum XcorrError {
    /// The series is too short for the requested lags, has no channels, or
    /// `dt_max` is zero.
    ///
    /// Every lag slice needs at least two aligned samples, so the engine
    /// requires `n_times > dt_max + 1`.
    #[error(
        "invalid shape: {n_times} time bins x {n_channels} channels with dt_max = {dt_max} \
         (need n_channels >= 1, dt_max >= 1, n_times > dt_max + 1)"
    )]
    InvalidShape {
        n_times: usize,
        n_channels: usize,
        dt_max: usize,
    },

    #[error("chunk size must be at least 1")]
    InvalidChunkSize,

    /// A channel is constant over an aligned lag window and the
    /// configured [`crate::DegeneratePolicy`] is `Error`.
    #[error("channel {channel} has zero variance in the window for lag {lag}")]
    DegenerateVariance { channel: usize, lag: usize },

    #[error("smoothing window {window} exceeds series length {n_times}")]
    SmootherWindowTooLarge { window: usize, n_times: usize },

    #[error("smoothing window must be at least 1")]
    InvalidWindow,

    #[error("non-finite sample at time {time}, channel {channel}")]
    NonFiniteSample { time: usize, channel: usize },
}

pub type Result<T> = std::result::Result<T, XcorrError>;
