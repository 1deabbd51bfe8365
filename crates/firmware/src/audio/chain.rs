//! One-time setup of the transfer chain.
//!
//! Stops both channels and clears any completion flag an earlier session
//! left behind, silences both buffers, programs channel A (buffer 0, chains to B) and
//! channel B (buffer 1, chains to A), enables both completion interrupts,
//! then splits the engine into the producer and interrupt handles. Nothing
//! is started here: the producer starts channel A once pre-roll is done.

use platform::audio_config::AudioConfig;
use platform::dma::{ChainChannel, ChainConfigure, SplitChain};

use super::buffer_pool::{BufferIndex, BufferPool};
use super::completion::CompletionHandler;
use super::producer::Producer;

/// The two runtime handles of one audio session.
pub struct AudioOutput<'a, D: SplitChain, const FRAMES: usize> {
    /// Handle for the frame loop.
    pub producer: Producer<'a, D::Trigger, FRAMES>,
    /// Handle for the completion interrupt.
    pub completion: CompletionHandler<'a, D::Completion, FRAMES>,
}

/// Configure `dma` over `pool` and return the session handles.
///
/// The pool is borrowed mutably for the whole session, so initialising again
/// (e.g. after an external watchdog detects a stall) requires both handles
/// of the previous session to have been dropped first.
pub fn init<'a, D, const FRAMES: usize>(
    pool: &'a mut BufferPool<FRAMES>,
    mut dma: D,
    config: &AudioConfig,
) -> AudioOutput<'a, D, FRAMES>
where
    D: ChainConfigure + SplitChain,
{
    for channel in ChainChannel::ALL {
        dma.reset(channel);
    }
    pool.reset();
    let pool: &'a BufferPool<FRAMES> = pool;

    let frames = config.transfer_frames(FRAMES);
    let words = u32::try_from(frames).unwrap_or(u32::MAX);

    for channel in ChainChannel::ALL {
        let descriptor = pool.descriptor(BufferIndex::from(channel), words);
        dma.configure(channel, descriptor, channel.partner());
    }
    for channel in ChainChannel::ALL {
        dma.enable_completion_irq(channel);
    }

    #[cfg(feature = "defmt")]
    defmt::info!(
        "audio: chain configured, {=u32} Hz, {=usize} frames/transfer, attenuation {=u8}",
        config.sample_rate.get(),
        frames,
        config.attenuation.get()
    );

    let (trigger, completion) = dma.split();
    AudioOutput {
        producer: Producer::new(pool, trigger, frames, config.attenuation),
        completion: CompletionHandler::new(pool, completion, words),
    }
}
