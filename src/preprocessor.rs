//! I/Q pre-processor
//!
//! [`IqPreprocessor`] ties the conditioning blocks together and exposes the
//! control surface: starting and stopping auto-detection, forcing a
//! correction mode, and swapping channels.
//!
//! # Example
//!
//! ```
//! use iqprep::{BlockPair, CorrectionMode, IqPreprocessor};
//!
//! let mut pre = IqPreprocessor::new();
//! let mut pair = BlockPair::zeroed();
//!
//! // Silence never produces a verdict, so the mode stays put
//! for _ in 0..10 {
//!     pre.process(&mut pair);
//! }
//! assert_eq!(pre.correction(), CorrectionMode::NoCorrection);
//! assert!(pre.is_auto_detection_enabled());
//!
//! pre.set_correction(CorrectionMode::DelayI);
//! assert!(!pre.is_auto_detection_enabled());
//! ```

use tracing::{debug, info};

use crate::config::DetectorThresholds;
use crate::dsp::delay::DelayCompensator;
use crate::dsp::imbalance::{Detection, ImbalanceDetector, ImbalanceReport};
use crate::dsp::mode::{CorrectionMode, DetectionState, ModeStateMachine, Transition};
use crate::dsp::swap::ChannelSwap;
use crate::dsp::transform::{RustFftTransform, Transform};
use crate::error::Result;
use crate::host::BlockHost;
use crate::{BlockPair, Channel, SampleBlock};

/// What happened during one processed tick.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TickReport {
    /// Mode the compensator applied (the mode active when the tick started)
    pub mode_applied: CorrectionMode,
    /// Detector output, `None` while auto-detection is off
    pub detection: Option<Detection>,
    /// State machine changes made at the end of the tick
    pub transition: Transition,
    /// Whether I and Q were exchanged
    pub swapped: bool,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TickOutcome {
    /// One channel's block was missing; nothing was processed or emitted
    Skipped,
    Processed(TickReport),
}

impl TickOutcome {
    pub fn report(&self) -> Option<&TickReport> {
        match self {
            TickOutcome::Skipped => None,
            TickOutcome::Processed(report) => Some(report),
        }
    }
}

pub struct IqPreprocessor<T: Transform = RustFftTransform> {
    thresholds: DetectorThresholds,
    compensator: DelayCompensator,
    detector: ImbalanceDetector<T>,
    machine: ModeStateMachine,
    swap: ChannelSwap,
    last_report: Option<ImbalanceReport>,
}

impl IqPreprocessor<RustFftTransform> {
    /// Preprocessor with default thresholds and detection running
    pub fn new() -> Self {
        Self {
            thresholds: DetectorThresholds::default(),
            compensator: DelayCompensator::new(),
            detector: ImbalanceDetector::new(),
            machine: ModeStateMachine::new(),
            swap: ChannelSwap::default(),
            last_report: None,
        }
    }

    pub fn with_thresholds(thresholds: DetectorThresholds) -> Result<Self> {
        Self::with_transform(RustFftTransform::new(), thresholds)
    }
}

impl Default for IqPreprocessor<RustFftTransform> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transform> IqPreprocessor<T> {
    pub fn with_transform(transform: T, thresholds: DetectorThresholds) -> Result<Self> {
        thresholds.validate()?;
        Ok(Self {
            thresholds,
            compensator: DelayCompensator::new(),
            detector: ImbalanceDetector::with_transform(transform),
            machine: ModeStateMachine::new(),
            swap: ChannelSwap::default(),
            last_report: None,
        })
    }

    /// Run one tick on a block pair held by the caller.
    pub fn process(&mut self, pair: &mut BlockPair) -> TickReport {
        let BlockPair { i, q } = pair;
        self.process_blocks(i, q)
    }

    /// Run one tick on two channel blocks in place.
    pub fn process_blocks(&mut self, i: &mut SampleBlock, q: &mut SampleBlock) -> TickReport {
        let mode_applied = self.machine.mode();
        self.compensator.apply(mode_applied, i, q);

        let mut detection = None;
        let mut transition = Transition::default();
        if self.machine.is_enabled() {
            let d = self.detector.measure(i, q, &self.thresholds);
            self.last_report = Some(d.report);
            transition = self.machine.step(d.verdict, &self.thresholds);
            detection = Some(d);
        }

        let swapped = self.swap.apply(i, q);

        TickReport {
            mode_applied,
            detection,
            transition,
            swapped,
        }
    }

    /// Run one tick against a host: acquire, process, emit, release.
    ///
    /// If either channel's block is missing the tick is skipped and whatever
    /// was acquired is released untouched.
    pub fn update<H: BlockHost>(&mut self, host: &mut H) -> TickOutcome {
        let block_i = host.acquire(Channel::I);
        let block_q = host.acquire(Channel::Q);

        let (mut block_i, mut block_q) = match (block_i, block_q) {
            (Some(i), Some(q)) => (i, q),
            (block_i, block_q) => {
                debug!(
                    i_ready = block_i.is_some(),
                    q_ready = block_q.is_some(),
                    "incomplete block pair, skipping tick"
                );
                if let Some(block) = block_i {
                    host.release(block);
                }
                if let Some(block) = block_q {
                    host.release(block);
                }
                return TickOutcome::Skipped;
            }
        };

        let report = self.process_blocks(block_i.as_mut(), block_q.as_mut());

        host.emit(Channel::I, &block_i);
        host.emit(Channel::Q, &block_q);
        host.release(block_q);
        host.release(block_i);

        TickOutcome::Processed(report)
    }

    /// Restart auto-detection from `NoCorrection` with cleared streaks.
    pub fn start_auto_detection(&mut self) {
        self.machine.start();
        self.compensator.reset();
    }

    /// Stop auto-detection and revert to `NoCorrection`.
    pub fn stop_auto_detection(&mut self) {
        self.machine.stop();
        self.compensator.reset();
    }

    pub fn is_auto_detection_enabled(&self) -> bool {
        self.machine.is_enabled()
    }

    /// Force a correction mode; this always turns auto-detection off.
    pub fn set_correction(&mut self, mode: CorrectionMode) {
        self.machine.set_mode(mode);
    }

    pub fn correction(&self) -> CorrectionMode {
        self.machine.mode()
    }

    pub fn detection_state(&self) -> DetectionState {
        self.machine.state()
    }

    pub fn set_swap(&mut self, swap: bool) {
        if swap != self.swap.is_enabled() {
            info!(swap, "I/Q swap changed");
        }
        self.swap.set_enabled(swap);
    }

    pub fn swap_enabled(&self) -> bool {
        self.swap.is_enabled()
    }

    pub fn thresholds(&self) -> &DetectorThresholds {
        &self.thresholds
    }

    /// Replace the thresholds. Streaks and mode are kept.
    pub fn set_thresholds(&mut self, thresholds: DetectorThresholds) -> Result<()> {
        thresholds.validate()?;
        self.thresholds = thresholds;
        Ok(())
    }

    /// Most recent detector measurement, if detection has run
    pub fn last_report(&self) -> Option<&ImbalanceReport> {
        self.last_report.as_ref()
    }

    /// Sample the delayed channel will open its next block with
    pub fn carry(&self) -> Option<i16> {
        self.compensator.carry()
    }
}
