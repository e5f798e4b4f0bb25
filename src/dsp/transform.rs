//! Length-128 complex forward transforms
//!
//! The imbalance detector only needs an in-place forward DFT of one block.
//! [`RustFftTransform`] plans it once with `rustfft`; [`Radix2Transform`] is a
//! self-contained decimation-in-time FFT with precomputed twiddles, for hosts
//! that want no planner in the signal path.

use std::f32::consts::PI;
use std::sync::Arc;

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::BLOCK_SIZE;

const LOG2_BLOCK: usize = BLOCK_SIZE.trailing_zeros() as usize;

/// In-place forward complex DFT over one block.
pub trait Transform {
    fn forward(&mut self, buffer: &mut [Complex<f32>; BLOCK_SIZE]);
}

/// Forward FFT planned once by `rustfft`, with a scratch buffer sized at
/// construction.
pub struct RustFftTransform {
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl RustFftTransform {
    pub fn new() -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(BLOCK_SIZE);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        Self { fft, scratch }
    }
}

impl Default for RustFftTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for RustFftTransform {
    fn forward(&mut self, buffer: &mut [Complex<f32>; BLOCK_SIZE]) {
        self.fft
            .process_with_scratch(buffer.as_mut_slice(), &mut self.scratch);
    }
}

/// Radix-2 in-place FFT with a fixed twiddle table.
pub struct Radix2Transform {
    /// omega[s] = exp(-2πi s / N) for s < N/2
    omega: [Complex<f32>; BLOCK_SIZE / 2],
}

impl Radix2Transform {
    pub fn new() -> Self {
        let mut omega = [Complex::new(0.0, 0.0); BLOCK_SIZE / 2];
        for (s, w) in omega.iter_mut().enumerate() {
            let angle = -2.0 * PI * s as f32 / BLOCK_SIZE as f32;
            *w = Complex::new(angle.cos(), angle.sin());
        }
        Self { omega }
    }
}

impl Default for Radix2Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for Radix2Transform {
    fn forward(&mut self, data: &mut [Complex<f32>; BLOCK_SIZE]) {
        let n = BLOCK_SIZE;

        for k in 0..n {
            let r = reverse_bits(k, LOG2_BLOCK);
            if r > k {
                data.swap(k, r);
            }
        }

        let mut m = 2;
        let mut m2 = 1;
        let mut r = n;

        for _ in 0..LOG2_BLOCK {
            let mut w = 0;
            r >>= 1;

            for j in 0..m2 {
                let o = self.omega[w];

                let mut k = 0;
                while k < n {
                    let t = o * data[k + j + m2];
                    data[k + j + m2] = data[k + j] - t;
                    data[k + j] += t;
                    k += m;
                }

                w += r;
            }

            m2 = m;
            m <<= 1;
        }
    }
}

fn reverse_bits(mut n: usize, bits: usize) -> usize {
    let mut result = 0;
    for _ in 0..bits {
        result = (result << 1) | (n & 1);
        n >>= 1;
    }
    result
}
