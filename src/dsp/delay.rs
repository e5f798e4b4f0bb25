//! One-sample delay compensation
//!
//! Some I2S front ends come up with one channel a sample late. Delaying the
//! other channel by one sample lines the pair up again. Each block of the
//! delayed channel is shifted right by one position; the vacated first slot
//! takes the last sample of the previous block, held in a carry register.

use crate::dsp::mode::CorrectionMode;
use crate::{BLOCK_SIZE, SampleBlock};

/// Per-block sample shifter with its carry register.
///
/// The carry belongs to the channel currently being delayed. When the mode
/// changes to a different delayed channel, or comes back after a period of
/// `NoCorrection`, the first shifted block is seeded with zero.
#[derive(Debug, Clone, Default)]
pub struct DelayCompensator {
    carry: i16,
    owner: CorrectionMode,
}

impl DelayCompensator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample that will open the next shifted block, if a channel is delayed.
    pub fn carry(&self) -> Option<i16> {
        match self.owner {
            CorrectionMode::NoCorrection => None,
            _ => Some(self.carry),
        }
    }

    /// Drop the carried sample.
    pub fn reset(&mut self) {
        self.carry = 0;
        self.owner = CorrectionMode::NoCorrection;
    }

    /// Apply `mode` to one block pair in place.
    pub fn apply(&mut self, mode: CorrectionMode, i: &mut SampleBlock, q: &mut SampleBlock) {
        let block = match mode {
            CorrectionMode::DelayI => i,
            CorrectionMode::DelayQ => q,
            CorrectionMode::NoCorrection => {
                self.owner = CorrectionMode::NoCorrection;
                return;
            }
        };

        if self.owner != mode {
            self.carry = 0;
            self.owner = mode;
        }

        let last = block[BLOCK_SIZE - 1];
        block.copy_within(0..BLOCK_SIZE - 1, 1);
        block[0] = self.carry;
        self.carry = last;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(start: i16) -> SampleBlock {
        let mut block = [0; BLOCK_SIZE];
        for (k, s) in block.iter_mut().enumerate() {
            *s = start + k as i16;
        }
        block
    }

    #[test]
    fn test_no_correction_is_passthrough() {
        let mut comp = DelayCompensator::new();
        let mut i = ramp(0);
        let mut q = ramp(1000);
        comp.apply(CorrectionMode::NoCorrection, &mut i, &mut q);
        assert_eq!(i, ramp(0));
        assert_eq!(q, ramp(1000));
        assert_eq!(comp.carry(), None);
    }

    #[test]
    fn test_delay_i_shifts_and_carries() {
        let mut comp = DelayCompensator::new();
        let mut i = ramp(1);
        let mut q = ramp(1000);
        comp.apply(CorrectionMode::DelayI, &mut i, &mut q);

        assert_eq!(i[0], 0);
        for k in 1..BLOCK_SIZE {
            assert_eq!(i[k], k as i16);
        }
        assert_eq!(q, ramp(1000));
        assert_eq!(comp.carry(), Some(128));

        let mut i = ramp(129);
        let mut q = ramp(2000);
        comp.apply(CorrectionMode::DelayI, &mut i, &mut q);
        assert_eq!(i[0], 128);
        assert_eq!(i[BLOCK_SIZE - 1], 255);
        assert_eq!(comp.carry(), Some(256));
    }

    #[test]
    fn test_delay_q_fills_q_slot() {
        let mut comp = DelayCompensator::new();
        let mut i = ramp(0);
        let mut q = ramp(500);
        comp.apply(CorrectionMode::DelayQ, &mut i, &mut q);
        assert_eq!(i, ramp(0));
        assert_eq!(q[0], 0);
        assert_eq!(q[1], 500);

        let mut i = ramp(0);
        let mut q = ramp(628);
        comp.apply(CorrectionMode::DelayQ, &mut i, &mut q);
        assert_eq!(i, ramp(0));
        assert_eq!(q[0], 627);
        assert_eq!(q[1], 628);
    }

    #[test]
    fn test_switching_channel_reseeds_carry() {
        let mut comp = DelayCompensator::new();
        let mut i = ramp(10);
        let mut q = ramp(20);
        comp.apply(CorrectionMode::DelayI, &mut i, &mut q);
        assert_eq!(comp.carry(), Some(137));

        let mut i = ramp(10);
        let mut q = ramp(20);
        comp.apply(CorrectionMode::DelayQ, &mut i, &mut q);
        assert_eq!(q[0], 0);
        assert_eq!(comp.carry(), Some(147));
    }

    #[test]
    fn test_pause_reseeds_carry() {
        let mut comp = DelayCompensator::new();
        let (mut i, mut q) = (ramp(10), ramp(20));
        comp.apply(CorrectionMode::DelayI, &mut i, &mut q);
        let (mut i, mut q) = (ramp(10), ramp(20));
        comp.apply(CorrectionMode::NoCorrection, &mut i, &mut q);
        let (mut i, mut q) = (ramp(10), ramp(20));
        comp.apply(CorrectionMode::DelayI, &mut i, &mut q);
        assert_eq!(i[0], 0);
    }

    #[test]
    fn test_reset_drops_carry() {
        let mut comp = DelayCompensator::new();
        let (mut i, mut q) = (ramp(10), ramp(20));
        comp.apply(CorrectionMode::DelayQ, &mut i, &mut q);
        assert_eq!(comp.carry(), Some(20 + 127));

        comp.reset();
        assert_eq!(comp.carry(), None);

        let (mut i, mut q) = (ramp(10), ramp(20));
        comp.apply(CorrectionMode::DelayQ, &mut i, &mut q);
        assert_eq!(q[0], 0);
        assert_eq!(q[1], 20);
    }
}
