//! I/Q channel swap
//!
//! Front ends wired with Q on input 0 and I on input 1 can be fixed in
//! software by exchanging the two blocks after correction and detection.

use crate::SampleBlock;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ChannelSwap {
    enabled: bool,
}

impl ChannelSwap {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Exchange the two blocks if enabled. Returns whether a swap happened.
    pub fn apply(&self, i: &mut SampleBlock, q: &mut SampleBlock) -> bool {
        if self.enabled {
            std::mem::swap(i, q);
        }
        self.enabled
    }
}
