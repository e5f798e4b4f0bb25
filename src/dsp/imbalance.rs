//! Spectral I/Q imbalance detection
//!
//! A phase or timing error between the I and Q channels turns a clean complex
//! tone at bin `k` into a pair of lines at `k` and at its mirror `N - k`. With
//! the channels aligned, the mirror line is negligible and the power ratio
//! between the strongest line and its image is large; a one-sample skew drops
//! that ratio by orders of magnitude.
//!
//! The detector only passes judgement when the strongest line stands well
//! above the average power of the window, so noise and silence never move the
//! correction mode.

use num_complex::Complex;
use tracing::trace;

use crate::config::DetectorThresholds;
use crate::dsp::transform::{RustFftTransform, Transform};
use crate::error::Result;
use crate::{BLOCK_SIZE, FULL_SCALE, SampleBlock};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Image line is far enough below the strongest line
    Acceptable,
    /// Image line is too strong for the current correction
    Unacceptable,
}

impl Verdict {
    pub fn is_acceptable(self) -> bool {
        self == Verdict::Acceptable
    }
}

/// Measurements taken on one block pair.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ImbalanceReport {
    /// Bin of the strongest line outside the guard band
    pub max_line: usize,
    /// Power of the strongest line
    pub peak_power: f32,
    /// Mean power over the search window
    pub average_power: f32,
    /// Peak power divided by the power of the mirror bin
    pub imbalance_ratio: f32,
}

/// Outcome of one detector pass.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Detection {
    pub report: ImbalanceReport,
    /// `None` when the strongest line did not clear the strength gate
    pub verdict: Option<Verdict>,
}

pub struct ImbalanceDetector<T: Transform = RustFftTransform> {
    transform: T,
    spectrum: [Complex<f32>; BLOCK_SIZE],
    power: [f32; BLOCK_SIZE],
}

impl ImbalanceDetector<RustFftTransform> {
    pub fn new() -> Self {
        Self::with_transform(RustFftTransform::new())
    }
}

impl Default for ImbalanceDetector<RustFftTransform> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transform> ImbalanceDetector<T> {
    pub fn with_transform(transform: T) -> Self {
        Self {
            transform,
            spectrum: [Complex::new(0.0, 0.0); BLOCK_SIZE],
            power: [0.0; BLOCK_SIZE],
        }
    }

    /// Power spectrum computed by the last call to [`evaluate`](Self::evaluate).
    pub fn power_spectrum(&self) -> &[f32; BLOCK_SIZE] {
        &self.power
    }

    /// Measure the imbalance of an (already delay-corrected) block pair.
    ///
    /// Thresholds that fail [`DetectorThresholds::validate`] are rejected with
    /// [`Error::Config`](crate::Error::Config) before any work is done.
    pub fn evaluate(
        &mut self,
        i: &SampleBlock,
        q: &SampleBlock,
        thresholds: &DetectorThresholds,
    ) -> Result<Detection> {
        thresholds.validate()?;
        Ok(self.measure(i, q, thresholds))
    }

    /// `evaluate` for thresholds already known to be valid
    pub(crate) fn measure(
        &mut self,
        i: &SampleBlock,
        q: &SampleBlock,
        thresholds: &DetectorThresholds,
    ) -> Detection {
        for ((c, &si), &sq) in self.spectrum.iter_mut().zip(i.iter()).zip(q.iter()) {
            *c = Complex::new(si as f32 / FULL_SCALE, sq as f32 / FULL_SCALE);
        }

        self.transform.forward(&mut self.spectrum);

        for (p, c) in self.power.iter_mut().zip(self.spectrum.iter()) {
            *p = c.norm_sqr();
        }

        // Ignore spectral lines around DC
        let guard = thresholds.guard_width;
        let window = guard..BLOCK_SIZE - guard;
        let width = window.len() as f32;

        let mut max_line = guard;
        let mut peak_power = 0.0f32;
        let mut total_power = 0.0f32;
        for k in window {
            let p = self.power[k];
            total_power += p;
            if p > peak_power {
                peak_power = p;
                max_line = k;
            }
        }
        let average_power = total_power / width;

        let image_power = self.power[BLOCK_SIZE - max_line];
        let imbalance_ratio = peak_power / image_power;

        let report = ImbalanceReport {
            max_line,
            peak_power,
            average_power,
            imbalance_ratio,
        };

        if peak_power <= thresholds.spectral_avg_multiplier * average_power {
            trace!(
                max_line,
                peak_power,
                average_power,
                "no dominant line, withholding verdict"
            );
            return Detection {
                report,
                verdict: None,
            };
        }

        let verdict = if imbalance_ratio >= thresholds.min_imbalance_ratio {
            Verdict::Acceptable
        } else {
            Verdict::Unacceptable
        };
        trace!(
            max_line,
            peak_power,
            image_power,
            imbalance_ratio,
            ?verdict,
            "imbalance measured"
        );

        Detection {
            report,
            verdict: Some(verdict),
        }
    }
}
