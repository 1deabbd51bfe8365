//! Interrupt-side handle of the audio pipeline.
//!
//! Runs from `DMA_IRQ_1`. For every channel whose completion flag is raised,
//! in chain order:
//!
//! 1. acknowledge the flag, so the interrupt does not re-enter for it;
//! 2. re-arm the channel's descriptor (same source, full count) without
//!    triggering it, ready for when its partner chains back to it;
//! 3. release the channel's buffer to the producer.
//!
//! Never touches sample data and never blocks.

use platform::dma::{ChainCompletion, ChannelSet};

use super::buffer_pool::{BufferIndex, BufferPool};

/// Completion interrupt handler bound to one pool and one engine.
///
/// Holds only the [`ChainCompletion`] role: it cannot start the chain.
pub struct CompletionHandler<'a, C, const FRAMES: usize> {
    pool: &'a BufferPool<FRAMES>,
    dma: C,
    words: u32,
}

impl<'a, C: ChainCompletion, const FRAMES: usize> CompletionHandler<'a, C, FRAMES> {
    pub(crate) fn new(pool: &'a BufferPool<FRAMES>, dma: C, words: u32) -> Self {
        Self { pool, dma, words }
    }

    /// Service every pending completion. Returns the channels serviced;
    /// empty for a spurious entry.
    pub fn on_interrupt(&mut self) -> ChannelSet {
        let pending = self.dma.pending();
        if pending.is_empty() {
            #[cfg(feature = "defmt")]
            defmt::debug!("audio: spurious DMA_IRQ_1");
            return pending;
        }
        for channel in pending.iter() {
            let index = BufferIndex::from(channel);
            self.dma.acknowledge(channel);
            self.dma.rearm(channel, self.pool.descriptor(index, self.words));
            self.pool.release_buffer(index);
        }
        pending
    }

    /// Frames every re-armed transfer carries.
    pub fn transfer_words(&self) -> u32 {
        self.words
    }
}
