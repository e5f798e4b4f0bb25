#![doc = include_str!("../readme.md")]

pub mod config;
pub mod dsp;
pub mod error;
pub mod host;
pub mod iqread;
pub mod preprocessor;

pub use config::{DetectorThresholds, GateMiss};
pub use dsp::delay::DelayCompensator;
pub use dsp::imbalance::{Detection, ImbalanceDetector, ImbalanceReport, Verdict};
pub use dsp::mode::{CorrectionMode, DetectionState, ModeStateMachine, Transition};
pub use dsp::swap::ChannelSwap;
pub use dsp::transform::{Radix2Transform, RustFftTransform, Transform};
pub use error::{Error, Result};
pub use host::{BlockHost, QueueHost};
pub use iqread::{Cs16Reader, Cs16Writer, StreamHost, StreamSummary};
pub use preprocessor::{IqPreprocessor, TickOutcome, TickReport};

/// Number of samples per channel in one block tick
pub const BLOCK_SIZE: usize = 128;

/// Full-scale value used to normalize signed 16-bit samples
pub const FULL_SCALE: f32 = 32767.0;

/// One channel's worth of samples for a single tick
pub type SampleBlock = [i16; BLOCK_SIZE];

/**
 * Quadrature channel identifier
 */
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    /// In-phase (real) channel, host input/output 0
    I,
    /// Quadrature (imaginary) channel, host input/output 1
    Q,
}

impl Channel {
    /// Host-side port index for this channel
    pub fn index(self) -> usize {
        match self {
            Channel::I => 0,
            Channel::Q => 1,
        }
    }
}

/**
 * A complete I/Q block pair for one tick
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPair {
    pub i: SampleBlock,
    pub q: SampleBlock,
}

impl BlockPair {
    pub fn new(i: SampleBlock, q: SampleBlock) -> Self {
        Self { i, q }
    }

    /// A pair of silent blocks
    pub fn zeroed() -> Self {
        Self {
            i: [0; BLOCK_SIZE],
            q: [0; BLOCK_SIZE],
        }
    }

    /// Build a pair from a per-index generator returning `(i, q)`
    pub fn from_fn<F: FnMut(usize) -> (i16, i16)>(mut f: F) -> Self {
        let mut pair = Self::zeroed();
        for k in 0..BLOCK_SIZE {
            let (i, q) = f(k);
            pair.i[k] = i;
            pair.q[k] = q;
        }
        pair
    }

    /// Borrow one channel's block
    pub fn channel(&self, channel: Channel) -> &SampleBlock {
        match channel {
            Channel::I => &self.i,
            Channel::Q => &self.q,
        }
    }
}

impl Default for BlockPair {
    fn default() -> Self {
        Self::zeroed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_index() {
        assert_eq!(Channel::I.index(), 0);
        assert_eq!(Channel::Q.index(), 1);
    }

    #[test]
    fn test_block_pair_from_fn() {
        let pair = BlockPair::from_fn(|k| (k as i16, -(k as i16)));
        assert_eq!(pair.i[0], 0);
        assert_eq!(pair.i[BLOCK_SIZE - 1], 127);
        assert_eq!(pair.q[BLOCK_SIZE - 1], -127);
        assert_eq!(pair.channel(Channel::Q)[5], -5);
    }
}
