/// xcorr_net: read a [T, N] series from safetensors, estimate lagged
/// cross-correlation connectivity, write the result to safetensors.
///
/// Output keys:
///   lag_tensor    [N, N, dt_max]  f64
///   connectivity  [N, N]          f64
///   dominant_lag  [N, N]          i32
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use xcorr_net::{
    infer_net,
    io::{write_estimate, SeriesData},
    DegeneratePolicy, LagConvention, XcorrConfig,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Convention {
    /// H[i, j, d] pairs channel i at t with channel j at t + d.
    SourceLeads,
    /// H[i, j, d] pairs channel i at t + d with channel j at t.
    TargetLeads,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Degenerate {
    Zero,
    Nan,
    Error,
}

#[derive(Parser, Debug)]
#[command(name = "xcorr_net", about = "Lagged cross-correlation connectivity")]
struct Args {
    /// Input safetensors file holding a [T, N] series.
    #[arg(long)]
    input: PathBuf,

    /// Tensor key of the series inside the input file.
    #[arg(long, default_value = "S")]
    key: String,

    /// Output safetensors path.
    #[arg(long)]
    output: PathBuf,

    /// Number of lags (0 .. dt_max).
    #[arg(long, default_value_t = 10)]
    dt_max: usize,

    /// Trailing moving-average window applied first.
    #[arg(long)]
    smooth: Option<usize>,

    /// Channel tile size.
    #[arg(long, default_value_t = 16)]
    chunk_size: usize,

    #[arg(long, value_enum, default_value_t = Convention::SourceLeads)]
    convention: Convention,

    /// Handling of zero-variance windows.
    #[arg(long, value_enum, default_value_t = Degenerate::Zero)]
    degenerate: Degenerate,

    /// Number of strongest pairs to log.
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Log debug events from the engine.
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // ── 1. Load ────────────────────────────────────────────────────────────
    let t_load = Instant::now();
    let series = SeriesData::load(&args.input, &args.key)?;
    let (n_t, n_ch) = series.data.dim();
    info!(
        n_times = n_t,
        n_channels = n_ch,
        ms = t_load.elapsed().as_secs_f64() * 1000.0,
        "loaded {}",
        args.input.display()
    );

    // ── 2. Estimate ────────────────────────────────────────────────────────
    let cfg = XcorrConfig {
        dt_max: args.dt_max,
        smooth: args.smooth,
        chunk_size: args.chunk_size,
        convention: match args.convention {
            Convention::SourceLeads => LagConvention::SourceLeads,
            Convention::TargetLeads => LagConvention::TargetLeads,
        },
        degenerate: match args.degenerate {
            Degenerate::Zero => DegeneratePolicy::Zero,
            Degenerate::Nan => DegeneratePolicy::Nan,
            Degenerate::Error => DegeneratePolicy::Error,
        },
    };
    let t_est = Instant::now();
    let est = infer_net(&series.data, &cfg)?;
    info!(
        dt_max = cfg.dt_max,
        ms = t_est.elapsed().as_secs_f64() * 1000.0,
        "lag tensor computed"
    );

    let lags = est.dominant_lag();
    for (rank, pair) in est.top_pairs(args.top).iter().enumerate() {
        info!(
            rank = rank + 1,
            score = pair.score,
            lag = lags[[pair.source, pair.target]],
            "{} -> {}",
            series.channel_label(pair.source),
            series.channel_label(pair.target)
        );
    }

    // ── 3. Write ───────────────────────────────────────────────────────────
    write_estimate(&est, &args.output)?;
    info!("written {}", args.output.display());
    Ok(())
}
