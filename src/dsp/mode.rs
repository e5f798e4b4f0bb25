//! Correction mode and its hysteresis state machine
//!
//! The state machine owns the active [`CorrectionMode`] and the detection
//! streaks. Sustained failures cycle the mode `DelayQ → NoCorrection → DelayI
//! → DelayQ`; sustained successes freeze detection on the current mode.

use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::config::{DetectorThresholds, GateMiss};
use crate::dsp::imbalance::Verdict;
use crate::error::Error;

/// Which channel, if any, is delayed by one sample.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum CorrectionMode {
    /// Delay the Q channel by one sample (-1)
    DelayQ,
    /// Pass both channels through (0)
    #[default]
    NoCorrection,
    /// Delay the I channel by one sample (+1)
    DelayI,
}

impl CorrectionMode {
    /// Signed representation: -1, 0 or +1
    pub fn as_i8(self) -> i8 {
        match self {
            CorrectionMode::DelayQ => -1,
            CorrectionMode::NoCorrection => 0,
            CorrectionMode::DelayI => 1,
        }
    }

    /// Next mode in the detection cycle, wrapping from `DelayI` to `DelayQ`
    pub fn next(self) -> Self {
        match self {
            CorrectionMode::DelayQ => CorrectionMode::NoCorrection,
            CorrectionMode::NoCorrection => CorrectionMode::DelayI,
            CorrectionMode::DelayI => CorrectionMode::DelayQ,
        }
    }
}

impl TryFrom<i8> for CorrectionMode {
    type Error = Error;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(CorrectionMode::DelayQ),
            0 => Ok(CorrectionMode::NoCorrection),
            1 => Ok(CorrectionMode::DelayI),
            other => Err(Error::config(format!(
                "correction mode must be -1, 0 or 1, got {other}"
            ))),
        }
    }
}

impl FromStr for CorrectionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "delay-q" | "-1" => Ok(CorrectionMode::DelayQ),
            "none" | "0" => Ok(CorrectionMode::NoCorrection),
            "delay-i" | "1" | "+1" => Ok(CorrectionMode::DelayI),
            _ => Err(Error::config(format!(
                "unknown correction mode '{s}' (expected delay-q, none or delay-i)"
            ))),
        }
    }
}

impl fmt::Display for CorrectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrectionMode::DelayQ => write!(f, "delay-q"),
            CorrectionMode::NoCorrection => write!(f, "none"),
            CorrectionMode::DelayI => write!(f, "delay-i"),
        }
    }
}

/// Auto-detection flag and hysteresis streaks.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DetectionState {
    pub enabled: bool,
    pub failure_streak: u32,
    pub success_streak: u32,
}

impl DetectionState {
    fn started() -> Self {
        Self {
            enabled: true,
            failure_streak: 0,
            success_streak: 0,
        }
    }
}

/// What a state machine step changed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Transition {
    /// New mode if the failure streak crossed its limit
    pub advanced_to: Option<CorrectionMode>,
    /// Set when the success streak crossed its limit and detection stopped
    pub froze: bool,
}

impl Transition {
    pub fn is_none(&self) -> bool {
        self.advanced_to.is_none() && !self.froze
    }
}

#[derive(Debug, Clone)]
pub struct ModeStateMachine {
    mode: CorrectionMode,
    state: DetectionState,
}

impl ModeStateMachine {
    /// A machine with detection running from `NoCorrection`
    pub fn new() -> Self {
        Self {
            mode: CorrectionMode::NoCorrection,
            state: DetectionState::started(),
        }
    }

    pub fn mode(&self) -> CorrectionMode {
        self.mode
    }

    pub fn state(&self) -> DetectionState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    /// Restart detection from `NoCorrection` with cleared streaks.
    pub fn start(&mut self) {
        self.mode = CorrectionMode::NoCorrection;
        self.state = DetectionState::started();
        info!("auto-detection started");
    }

    /// Stop detection and revert to `NoCorrection`.
    pub fn stop(&mut self) {
        self.mode = CorrectionMode::NoCorrection;
        self.state.enabled = false;
        info!("auto-detection stopped");
    }

    /// Force a mode. Manual override always disables detection.
    pub fn set_mode(&mut self, mode: CorrectionMode) {
        self.mode = mode;
        self.state.enabled = false;
        info!(%mode, "correction mode set manually");
    }

    /// Feed one tick's verdict (or its absence) into the machine.
    ///
    /// Does nothing while detection is disabled.
    pub fn step(&mut self, verdict: Option<Verdict>, thresholds: &DetectorThresholds) -> Transition {
        let mut transition = Transition::default();
        if !self.state.enabled {
            return transition;
        }

        match verdict {
            Some(Verdict::Acceptable) => {
                self.state.failure_streak = 0;
                self.state.success_streak = self.state.success_streak.saturating_add(1);
            }
            Some(Verdict::Unacceptable) => {
                self.state.failure_streak = self.state.failure_streak.saturating_add(1);
                self.state.success_streak = 0;
            }
            None => {
                if thresholds.gate_miss == GateMiss::CountSuccess {
                    self.state.success_streak = self.state.success_streak.saturating_add(1);
                }
            }
        }

        if self.state.failure_streak > thresholds.failure_limit {
            let from = self.mode;
            self.mode = self.mode.next();
            self.state.failure_streak = 0;
            self.state.success_streak = 0;
            transition.advanced_to = Some(self.mode);
            info!(%from, to = %self.mode, "imbalance persists, advancing correction mode");
        }

        if self.state.success_streak > thresholds.success_limit {
            self.state.enabled = false;
            transition.froze = true;
            info!(mode = %self.mode, "imbalance acceptable, freezing correction mode");
        }

        transition
    }
}

impl Default for ModeStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
