//! Detector configuration
//!
//! [`DetectorThresholds`] gathers every tunable of the imbalance detector and
//! of the hysteresis state machine. Defaults are suitable for a 128-sample
//! block at audio-rate quadrature input.

use crate::BLOCK_SIZE;
use crate::error::{Error, Result};

/// What a tick whose strength gate failed contributes to the streak counters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum GateMiss {
    /// A weak spectrum leaves both streaks untouched
    #[default]
    Ignore,
    /// A weak spectrum counts as a success; the failure streak is left as is
    CountSuccess,
}

/**
 * Thresholds for the imbalance detector and the mode state machine
 */
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorThresholds {
    /// Number of bins excluded on each side of DC
    pub guard_width: usize,
    /// Peak power must exceed this multiple of the average in-window power
    pub spectral_avg_multiplier: f32,
    /// Minimum peak-to-image power ratio for a block to be acceptable
    pub min_imbalance_ratio: f32,
    /// Consecutive failures tolerated before the correction mode advances
    pub failure_limit: u32,
    /// Consecutive successes after which detection freezes
    pub success_limit: u32,
    /// Treatment of ticks that fail the strength gate
    pub gate_miss: GateMiss,
}

impl Default for DetectorThresholds {
    fn default() -> Self {
        Self {
            guard_width: 5,
            spectral_avg_multiplier: 10.0,
            min_imbalance_ratio: 100.0,
            failure_limit: 10,
            success_limit: 100,
            gate_miss: GateMiss::Ignore,
        }
    }
}

impl DetectorThresholds {
    pub fn with_guard_width(mut self, guard_width: usize) -> Self {
        self.guard_width = guard_width;
        self
    }

    pub fn with_spectral_avg_multiplier(mut self, multiplier: f32) -> Self {
        self.spectral_avg_multiplier = multiplier;
        self
    }

    pub fn with_min_imbalance_ratio(mut self, ratio: f32) -> Self {
        self.min_imbalance_ratio = ratio;
        self
    }

    pub fn with_failure_limit(mut self, limit: u32) -> Self {
        self.failure_limit = limit;
        self
    }

    pub fn with_success_limit(mut self, limit: u32) -> Self {
        self.success_limit = limit;
        self
    }

    pub fn with_gate_miss(mut self, gate_miss: GateMiss) -> Self {
        self.gate_miss = gate_miss;
        self
    }

    /// Check that the thresholds describe a usable detector.
    ///
    /// The guard band must keep at least one bin on each side of DC out of the
    /// search window, otherwise the image of the strongest line falls outside
    /// the spectrum.
    pub fn validate(&self) -> Result<()> {
        if self.guard_width == 0 || self.guard_width >= BLOCK_SIZE / 2 {
            return Err(Error::config(format!(
                "guard width must be in 1..{}, got {}",
                BLOCK_SIZE / 2,
                self.guard_width
            )));
        }
        if !self.spectral_avg_multiplier.is_finite() || self.spectral_avg_multiplier < 0.0 {
            return Err(Error::config(format!(
                "spectral average multiplier must be finite and non-negative, got {}",
                self.spectral_avg_multiplier
            )));
        }
        if !self.min_imbalance_ratio.is_finite() || self.min_imbalance_ratio < 0.0 {
            return Err(Error::config(format!(
                "minimum imbalance ratio must be finite and non-negative, got {}",
                self.min_imbalance_ratio
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let thresholds = DetectorThresholds::default();
        assert!(thresholds.validate().is_ok());
        assert_eq!(thresholds.guard_width, 5);
        assert_eq!(thresholds.gate_miss, GateMiss::Ignore);
    }

    #[test]
    fn test_builder_setters() {
        let thresholds = DetectorThresholds::default()
            .with_guard_width(3)
            .with_spectral_avg_multiplier(4.0)
            .with_min_imbalance_ratio(50.0)
            .with_failure_limit(2)
            .with_success_limit(7)
            .with_gate_miss(GateMiss::CountSuccess);
        assert_eq!(thresholds.guard_width, 3);
        assert_eq!(thresholds.failure_limit, 2);
        assert_eq!(thresholds.success_limit, 7);
        assert_eq!(thresholds.gate_miss, GateMiss::CountSuccess);
        assert!(thresholds.validate().is_ok());
    }

    #[test]
    fn test_guard_width_bounds() {
        let zero = DetectorThresholds::default().with_guard_width(0);
        assert!(matches!(zero.validate(), Err(Error::Config(_))));

        let too_wide = DetectorThresholds::default().with_guard_width(BLOCK_SIZE / 2);
        assert!(too_wide.validate().is_err());

        let widest = DetectorThresholds::default().with_guard_width(BLOCK_SIZE / 2 - 1);
        assert!(widest.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_finite_ratios() {
        let nan = DetectorThresholds::default().with_min_imbalance_ratio(f32::NAN);
        assert!(nan.validate().is_err());

        let negative = DetectorThresholds::default().with_spectral_avg_multiplier(-1.0);
        assert!(negative.validate().is_err());
    }
}
