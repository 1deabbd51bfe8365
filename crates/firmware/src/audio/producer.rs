//! Producer-side handle of the audio pipeline.
//!
//! Used once per game frame by the sequential frame loop. Each write claims a
//! buffer (blocking while both are in flight), copies the frames with the
//! current attenuation, pads the rest of the transfer with silence, fences,
//! and on the second pre-roll fill starts channel A.
//!
//! Every transfer the chain performs has the same length, fixed at `init`.
//! Short writes are therefore padded rather than shortening the descriptor.

use core::sync::atomic::{fence, Ordering};

use platform::audio::StereoFrame;
use platform::audio_types::Attenuation;
use platform::dma::{ChainChannel, ChainTrigger};

use super::buffer_pool::BufferPool;
use super::error::AudioError;
use super::state::{PlaybackState, Transition};
use super::wait::{Spin, WaitStrategy};

/// Producer handle bound to one pool and one engine.
///
/// Holds only the [`ChainTrigger`] role: it cannot touch descriptors.
pub struct Producer<'a, T, const FRAMES: usize> {
    pool: &'a BufferPool<FRAMES>,
    trigger: T,
    state: PlaybackState,
    attenuation: Attenuation,
    transfer_frames: usize,
}

impl<'a, T: ChainTrigger, const FRAMES: usize> Producer<'a, T, FRAMES> {
    pub(crate) fn new(
        pool: &'a BufferPool<FRAMES>,
        trigger: T,
        transfer_frames: usize,
        attenuation: Attenuation,
    ) -> Self {
        Self {
            pool,
            trigger,
            state: PlaybackState::NotStarted,
            attenuation,
            transfer_frames: transfer_frames.clamp(1, FRAMES),
        }
    }

    /// Queue `count` frames for playback, spinning until a buffer is free.
    ///
    /// `count` is clamped to the transfer length and zero is promoted to one.
    /// Frames beyond `frames.len()` play as silence, as does the padding up
    /// to the transfer length.
    pub fn write(&mut self, frames: &[StereoFrame], count: usize) {
        if let Err(_err) = self.try_write(frames, count, Spin) {
            #[cfg(feature = "defmt")]
            defmt::error!("audio: unbounded write failed: {}", _err);
        }
    }

    /// [`write`](Self::write) a whole transfer.
    pub fn write_all(&mut self, frames: &[StereoFrame]) {
        self.write(frames, self.transfer_frames);
    }

    /// [`write`](Self::write) with an explicit wait strategy.
    ///
    /// On [`AudioError::Stalled`] nothing was written and the playback state
    /// is unchanged.
    pub fn try_write<W: WaitStrategy>(
        &mut self,
        frames: &[StereoFrame],
        count: usize,
        wait: W,
    ) -> Result<(), AudioError> {
        let count = count.clamp(1, self.transfer_frames);
        let mut claim = self.pool.claim_buffer(self.state.claim_policy(), wait)?;

        let mut slots = claim.words_mut().iter_mut().take(self.transfer_frames);
        let supplied = frames.iter().take(count);
        if self.attenuation.is_full() {
            for (frame, slot) in supplied.zip(slots.by_ref()) {
                *slot = frame.to_word();
            }
        } else {
            let attenuation = self.attenuation;
            for (frame, slot) in supplied.zip(slots.by_ref()) {
                *slot = frame.attenuated(attenuation).to_word();
            }
        }
        for slot in slots {
            *slot = 0;
        }

        // Sample stores must be visible before the chain can stream them.
        fence(Ordering::SeqCst);

        #[cfg(feature = "defmt")]
        defmt::trace!("audio: filled buffer {}", claim.index());

        if let Transition::StartChain = self.state.after_fill() {
            #[cfg(feature = "defmt")]
            defmt::info!(
                "audio: pre-roll complete, starting chain ({=usize} frames/transfer)",
                self.transfer_frames
            );
            self.trigger.start(ChainChannel::A);
        }
        Ok(())
    }

    /// Set the attenuation used by the next write.
    pub fn set_attenuation(&mut self, attenuation: Attenuation) {
        self.attenuation = attenuation;
    }

    /// One step louder (saturates at full volume).
    pub fn increase_volume(&mut self) {
        self.attenuation = self.attenuation.louder();
    }

    /// One step quieter (saturates at near-silence).
    pub fn decrease_volume(&mut self) {
        self.attenuation = self.attenuation.quieter();
    }

    /// Current attenuation.
    pub fn attenuation(&self) -> Attenuation {
        self.attenuation
    }

    /// Current playback state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Frames every transfer carries.
    pub fn transfer_frames(&self) -> usize {
        self.transfer_frames
    }

    /// Buffers released by the completion handler so far (wraps).
    pub fn progress(&self) -> u32 {
        self.pool.progress()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::audio::buffer_pool::{BufferIndex, OwnershipMask};
    use crate::audio::wait::BoundedSpin;
    use platform::mocks::MockDma;

    fn frames(pairs: &[(i16, i16)]) -> Vec<StereoFrame> {
        pairs.iter().map(|&(l, r)| StereoFrame::new(l, r)).collect()
    }

    #[test]
    fn first_write_does_not_start_chain() {
        let pool = BufferPool::<4>::new();
        let dma = MockDma::new();
        let mut producer = Producer::new(&pool, dma.clone(), 4, Attenuation::FULL);

        producer.write(&frames(&[(1, -1)]), 1);
        assert_eq!(producer.state(), PlaybackState::Priming(1));
        assert!(dma.starts().is_empty());
        assert_eq!(
            pool.ownership(),
            OwnershipMask::ALL_FREE.with_busy(BufferIndex::Zero)
        );
    }

    #[test]
    fn second_write_starts_channel_a_only() {
        let pool = BufferPool::<4>::new();
        let dma = MockDma::new();
        let mut producer = Producer::new(&pool, dma.clone(), 4, Attenuation::FULL);

        producer.write(&[], 0);
        producer.write(&[], 0);
        assert_eq!(producer.state(), PlaybackState::Running);
        assert_eq!(dma.starts(), [ChainChannel::A]);
        assert_eq!(pool.ownership(), OwnershipMask::ALL_BUSY);
    }

    #[test]
    fn stalled_write_leaves_state_untouched() {
        let pool = BufferPool::<4>::new();
        let dma = MockDma::new();
        let mut producer = Producer::new(&pool, dma.clone(), 4, Attenuation::FULL);
        producer.write_all(&[]);
        producer.write_all(&[]);

        let err = producer
            .try_write(&frames(&[(9, 9)]), 1, BoundedSpin::new(10))
            .unwrap_err();
        assert_eq!(err, AudioError::Stalled { attempts: 11 });
        assert_eq!(producer.state(), PlaybackState::Running);
        assert_eq!(dma.starts(), [ChainChannel::A]);
    }

    #[test]
    fn volume_steps_clamp() {
        let pool = BufferPool::<4>::new();
        let mut producer = Producer::new(&pool, MockDma::new(), 4, Attenuation::new(1));

        producer.increase_volume();
        producer.increase_volume();
        assert_eq!(producer.attenuation(), Attenuation::FULL);
        for _ in 0..20 {
            producer.decrease_volume();
        }
        assert_eq!(producer.attenuation(), Attenuation::MAX);
    }

    #[test]
    fn transfer_length_is_clamped_to_capacity() {
        let pool = BufferPool::<4>::new();
        assert_eq!(
            Producer::new(&pool, MockDma::new(), 99, Attenuation::FULL).transfer_frames(),
            4
        );
        assert_eq!(
            Producer::new(&pool, MockDma::new(), 0, Attenuation::FULL).transfer_frames(),
            1
        );
    }
}
