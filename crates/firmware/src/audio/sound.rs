//! Per-game-frame sound device.
//!
//! Once per game frame (12.5 Hz) the frame loop calls
//! [`SoundDevice::fill_and_submit`]: pull one frame's worth of mono samples
//! from the game's mixer, duplicate each to both channels, and hand the
//! result to the producer. At 44.1 kHz that is 3528 samples per frame.

use platform::audio::{SampleSource, StereoFrame};
use platform::audio_types::Attenuation;
use platform::dma::ChainTrigger;

use super::error::AudioError;
use super::producer::Producer;
use super::state::PlaybackState;
use super::wait::{Spin, WaitStrategy};

/// The game's sound output: a sample source feeding a producer.
///
/// `SAMPLES` is the number of mono samples generated per game frame; the
/// scratch buffer holds exactly one frame's worth of stereo frames. Samples
/// beyond the producer's transfer length are generated but not played.
pub struct SoundDevice<'a, S, T, const FRAMES: usize, const SAMPLES: usize> {
    producer: Producer<'a, T, FRAMES>,
    source: S,
    scratch: &'a mut [StereoFrame; SAMPLES],
    paused: bool,
}

impl<'a, S, T, const FRAMES: usize, const SAMPLES: usize> SoundDevice<'a, S, T, FRAMES, SAMPLES>
where
    S: SampleSource,
    T: ChainTrigger,
{
    /// Wrap a producer and source. Starts unpaused.
    pub fn new(
        producer: Producer<'a, T, FRAMES>,
        source: S,
        scratch: &'a mut [StereoFrame; SAMPLES],
    ) -> Self {
        Self {
            producer,
            source,
            scratch,
            paused: false,
        }
    }

    /// Generate one game frame of audio and queue it. No-op while paused.
    ///
    /// Blocks while both transfer buffers are in flight.
    pub fn fill_and_submit(&mut self) {
        if let Err(_err) = self.try_fill_and_submit(Spin) {
            #[cfg(feature = "defmt")]
            defmt::error!("audio: unbounded fill failed: {}", _err);
        }
    }

    /// [`fill_and_submit`](Self::fill_and_submit) with an explicit wait
    /// strategy for the buffer claim.
    ///
    /// The source is pulled before the claim, so on [`AudioError::Stalled`]
    /// the frame's samples are lost but the game's mixer stays in step.
    pub fn try_fill_and_submit<W: WaitStrategy>(&mut self, wait: W) -> Result<(), AudioError> {
        if self.paused {
            return Ok(());
        }
        for frame in self.scratch.iter_mut() {
            *frame = StereoFrame::mono(self.source.next_sample());
        }
        self.producer.try_write(self.scratch.as_slice(), SAMPLES, wait)
    }

    /// Pause or resume output. While paused the source is not pulled and
    /// nothing is written, so the chain drains to the last buffers queued.
    pub fn pause(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// `true` while paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// One step louder.
    pub fn louder(&mut self) {
        self.producer.increase_volume();
    }

    /// One step quieter.
    pub fn quieter(&mut self) {
        self.producer.decrease_volume();
    }

    /// Set the attenuation directly.
    pub fn set_attenuation(&mut self, attenuation: Attenuation) {
        self.producer.set_attenuation(attenuation);
    }

    /// Current attenuation.
    pub fn attenuation(&self) -> Attenuation {
        self.producer.attenuation()
    }

    /// Playback state of the underlying producer.
    pub fn state(&self) -> PlaybackState {
        self.producer.state()
    }

    /// The sample source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The underlying producer (e.g. for its progress count).
    pub fn producer(&self) -> &Producer<'a, T, FRAMES> {
        &self.producer
    }
}
