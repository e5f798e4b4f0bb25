//! Test helper utilities for generating synthetic I/Q block streams

#![allow(dead_code)]

use std::f32::consts::PI;

use iqprep::{BLOCK_SIZE, BlockPair};

/// Which channel, if any, lags the other by one sample
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Skew {
    Aligned,
    ILate,
    QLate,
}

/// Generate a continuous complex tone on an exact FFT bin, split into blocks
///
/// # Arguments
/// * `bin` - Tone frequency as a bin index of the 128-point spectrum
/// * `amplitude` - Peak amplitude in 16-bit sample units
/// * `ticks` - Number of block pairs to generate
/// * `skew` - Channel lag injected into the stream
pub fn tone_pairs(bin: usize, amplitude: f32, ticks: usize, skew: Skew) -> Vec<BlockPair> {
    let w = 2.0 * PI * bin as f32 / BLOCK_SIZE as f32;
    (0..ticks)
        .map(|tick| {
            BlockPair::from_fn(|k| {
                let n = (tick * BLOCK_SIZE + k) as f32;
                let (ti, tq) = match skew {
                    Skew::Aligned => (n, n),
                    Skew::ILate => (n - 1.0, n),
                    Skew::QLate => (n, n - 1.0),
                };
                (
                    (amplitude * (w * ti).cos()).round() as i16,
                    (amplitude * (w * tq).sin()).round() as i16,
                )
            })
        })
        .collect()
}

/// Generate block pairs whose samples count up across block boundaries
///
/// I carries `n`, Q carries `-n`, where `n` is the global sample index.
pub fn ramp_pairs(ticks: usize) -> Vec<BlockPair> {
    (0..ticks)
        .map(|tick| {
            BlockPair::from_fn(|k| {
                let n = (tick * BLOCK_SIZE + k) as i16;
                (n, -n)
            })
        })
        .collect()
}

/// Serialize block pairs as interleaved Cs16 little-endian bytes
pub fn to_cs16_bytes(pairs: &[BlockPair]) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(pairs.len() * BLOCK_SIZE * 4);
    for pair in pairs {
        for k in 0..BLOCK_SIZE {
            buffer.extend_from_slice(&pair.i[k].to_le_bytes());
            buffer.extend_from_slice(&pair.q[k].to_le_bytes());
        }
    }
    buffer
}

/// Flatten one channel of a block stream into a sample sequence
pub fn flatten_i(pairs: &[BlockPair]) -> Vec<i16> {
    pairs.iter().flat_map(|p| p.i.iter().copied()).collect()
}

pub fn flatten_q(pairs: &[BlockPair]) -> Vec<i16> {
    pairs.iter().flat_map(|p| p.q.iter().copied()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_pairs_are_continuous() {
        let pairs = tone_pairs(8, 1000.0, 2, Skew::Aligned);
        assert_eq!(pairs.len(), 2);
        // 8 cycles per block: each block starts at phase zero
        assert_eq!(pairs[0].i[0], 1000);
        assert_eq!(pairs[1].i[0], 1000);
        assert_eq!(pairs[0].q[0], 0);
    }

    #[test]
    fn test_q_late_shifts_q_only() {
        let aligned = tone_pairs(8, 1000.0, 1, Skew::Aligned);
        let late = tone_pairs(8, 1000.0, 1, Skew::QLate);
        assert_eq!(aligned[0].i, late[0].i);
        assert_eq!(late[0].q[1], aligned[0].q[0]);
    }

    #[test]
    fn test_ramp_pairs() {
        let pairs = ramp_pairs(2);
        assert_eq!(pairs[1].i[0], BLOCK_SIZE as i16);
        assert_eq!(pairs[1].q[1], -(BLOCK_SIZE as i16) - 1);
    }

    #[test]
    fn test_cs16_length() {
        let bytes = to_cs16_bytes(&ramp_pairs(3));
        assert_eq!(bytes.len(), 3 * BLOCK_SIZE * 4);
    }
}
