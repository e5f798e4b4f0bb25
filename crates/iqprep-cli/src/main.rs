//! I/Q pre-processor for Cs16 sample streams
//!
//! Reads interleaved signed 16-bit I/Q samples, corrects a one-sample skew
//! between the channels (detected automatically unless a mode is forced),
//! optionally swaps I and Q, and writes the result in the same format.
//!
//! # Usage Examples
//!
//! ## Automatic detection, file to file
//! ```bash
//! iqprep -i capture.cs16 -o fixed.cs16 -v
//! ```
//!
//! ## Forced correction in a pipeline
//! ```bash
//! rtl_sdr - | convert | iqprep --mode delay-i --swap > fixed.cs16
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use clap::{ArgAction, Parser};
use iqprep::{
    CorrectionMode, Cs16Reader, Cs16Writer, DetectorThresholds, GateMiss, IqPreprocessor,
    StreamHost, iqread,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Detect and correct one-sample I/Q skew in Cs16 streams", long_about = None)]
struct Args {
    /// Input file (Cs16, little-endian); stdin when omitted or "-"
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file; stdout when omitted or "-"
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force a correction mode (delay-q, none, delay-i); disables detection
    #[arg(short, long, value_parser = CorrectionMode::from_str)]
    mode: Option<CorrectionMode>,

    /// Swap I and Q after correction
    #[arg(long, default_value_t = false)]
    swap: bool,

    /// Do not run automatic skew detection
    #[arg(long, default_value_t = false)]
    no_detect: bool,

    /// Spectral bins ignored on each side of DC
    #[arg(long, default_value_t = 5)]
    guard_width: usize,

    /// Strongest line must exceed this multiple of the average power
    #[arg(long, default_value_t = 10.0)]
    avg_multiplier: f32,

    /// Minimum line-to-image power ratio
    #[arg(long, default_value_t = 100.0)]
    min_ratio: f32,

    /// Consecutive failures before trying the next correction
    #[arg(long, default_value_t = 10)]
    failure_limit: u32,

    /// Consecutive successes before the correction is frozen
    #[arg(long, default_value_t = 100)]
    success_limit: u32,

    /// Count blocks without a dominant line as successes
    #[arg(long, default_value_t = false)]
    count_weak_blocks: bool,

    /// Verbosity level (-v=info, -vv=debug, -vvv=trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn thresholds(&self) -> DetectorThresholds {
        let gate_miss = if self.count_weak_blocks {
            GateMiss::CountSuccess
        } else {
            GateMiss::Ignore
        };
        DetectorThresholds::default()
            .with_guard_width(self.guard_width)
            .with_spectral_avg_multiplier(self.avg_multiplier)
            .with_min_imbalance_ratio(self.min_ratio)
            .with_failure_limit(self.failure_limit)
            .with_success_limit(self.success_limit)
            .with_gate_miss(gate_miss)
    }
}

fn main() -> iqprep::Result<()> {
    let args = Args::parse();

    // 0 = WARN (quiet), 1 = INFO, 2 = DEBUG, 3+ = TRACE
    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .try_init();

    let mut pre = IqPreprocessor::with_thresholds(args.thresholds())?;
    if let Some(mode) = args.mode {
        if args.no_detect {
            warn!("--no-detect is implied by --mode");
        }
        pre.set_correction(mode);
    } else if args.no_detect {
        pre.stop_auto_detection();
    }
    pre.set_swap(args.swap);

    let reader = iqread::open_input(args.input.as_deref())?;
    let writer = iqread::create_output(args.output.as_deref())?;

    let mut host = StreamHost::from_parts(Cs16Reader::new(reader), Cs16Writer::new(writer));
    let summary = host.run(&mut pre)?;

    let state = pre.detection_state();
    info!(
        frames = summary.frames_written,
        mode = %pre.correction(),
        detecting = state.enabled,
        swap = pre.swap_enabled(),
        "done"
    );
    if state.enabled && !args.no_detect && args.mode.is_none() {
        warn!(
            mode = %pre.correction(),
            "detection did not settle before the end of the stream"
        );
    }

    Ok(())
}
