//! Host streaming framework boundary
//!
//! The preprocessor does not own its sample buffers. Each tick it borrows one
//! writable block per channel from a [`BlockHost`], hands the processed blocks
//! downstream with [`emit`](BlockHost::emit), and gives every acquired block
//! back with [`release`](BlockHost::release), including on the early return
//! taken when only one channel delivered.

use std::collections::VecDeque;

use crate::{BlockPair, Channel, SampleBlock};

/// Capabilities the preprocessor needs from the host framework.
pub trait BlockHost {
    /// Writable block handle owned by the host
    type Block: AsRef<SampleBlock> + AsMut<SampleBlock>;

    /// Obtain this tick's block for `channel`, or `None` if it did not arrive.
    fn acquire(&mut self, channel: Channel) -> Option<Self::Block>;

    /// Return ownership of a block obtained from [`acquire`](Self::acquire).
    fn release(&mut self, block: Self::Block);

    /// Pass a processed block downstream on `channel`.
    fn emit(&mut self, channel: Channel, block: &Self::Block);
}

/**
 * In-memory host backed by per-channel queues
 *
 * Blocks pushed on a channel are handed out one per `acquire`. Emitted blocks
 * are recorded per channel, and acquire/release calls are counted so that a
 * leaked block shows up as a non-zero [`outstanding`](QueueHost::outstanding).
 */
#[derive(Debug, Default)]
pub struct QueueHost {
    pending_i: VecDeque<SampleBlock>,
    pending_q: VecDeque<SampleBlock>,
    emitted_i: Vec<SampleBlock>,
    emitted_q: Vec<SampleBlock>,
    acquired: usize,
    released: usize,
}

impl QueueHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one block on a channel
    pub fn push(&mut self, channel: Channel, block: SampleBlock) {
        match channel {
            Channel::I => self.pending_i.push_back(block),
            Channel::Q => self.pending_q.push_back(block),
        }
    }

    /// Queue a full pair
    pub fn push_pair(&mut self, pair: &BlockPair) {
        self.pending_i.push_back(pair.i);
        self.pending_q.push_back(pair.q);
    }

    /// Blocks emitted so far on a channel, oldest first
    pub fn emitted(&self, channel: Channel) -> &[SampleBlock] {
        match channel {
            Channel::I => &self.emitted_i,
            Channel::Q => &self.emitted_q,
        }
    }

    /// Emitted blocks paired up tick by tick
    pub fn emitted_pairs(&self) -> Vec<BlockPair> {
        self.emitted_i
            .iter()
            .zip(self.emitted_q.iter())
            .map(|(i, q)| BlockPair::new(*i, *q))
            .collect()
    }

    pub fn acquired(&self) -> usize {
        self.acquired
    }

    pub fn released(&self) -> usize {
        self.released
    }

    /// Blocks acquired but not yet released
    pub fn outstanding(&self) -> usize {
        self.acquired - self.released
    }

    /// True once both channel queues are drained
    pub fn is_empty(&self) -> bool {
        self.pending_i.is_empty() && self.pending_q.is_empty()
    }
}

impl BlockHost for QueueHost {
    type Block = Box<SampleBlock>;

    fn acquire(&mut self, channel: Channel) -> Option<Self::Block> {
        let block = match channel {
            Channel::I => self.pending_i.pop_front(),
            Channel::Q => self.pending_q.pop_front(),
        }?;
        self.acquired += 1;
        Some(Box::new(block))
    }

    fn release(&mut self, _block: Self::Block) {
        self.released += 1;
    }

    fn emit(&mut self, channel: Channel, block: &Self::Block) {
        match channel {
            Channel::I => self.emitted_i.push(**block),
            Channel::Q => self.emitted_q.push(**block),
        }
    }
}
