//! Stereo frames and the pull-style sample source.
//!
//! The PIO I2S program shifts each 32-bit FIFO word out MSB first, with the
//! word-select line low for the first 16 bits. A [`StereoFrame`] therefore
//! packs `left` into the high half-word and `right` into the low half-word.

use crate::audio_types::Attenuation;

/// One interleaved stereo frame: a left and a right signed 16-bit sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(C)]
pub struct StereoFrame {
    /// Left channel sample.
    pub left: i16,
    /// Right channel sample.
    pub right: i16,
}

impl StereoFrame {
    /// Digital silence.
    pub const SILENCE: Self = Self { left: 0, right: 0 };

    /// Build a frame from explicit left and right samples.
    #[must_use]
    pub const fn new(left: i16, right: i16) -> Self {
        Self { left, right }
    }

    /// Duplicate a mono sample to both channels.
    #[must_use]
    pub const fn mono(sample: i16) -> Self {
        Self {
            left: sample,
            right: sample,
        }
    }

    /// Pack into the 32-bit word the peripheral FIFO consumes.
    #[must_use]
    #[allow(clippy::cast_sign_loss)] // bit-level reinterpretation of i16 as u16
    #[allow(clippy::arithmetic_side_effects)] // constant 16-bit shift of a u32
    pub const fn to_word(self) -> u32 {
        ((self.left as u16 as u32) << 16) | (self.right as u16 as u32)
    }

    /// Unpack a peripheral word back into a frame.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)] // half-word extraction
    #[allow(clippy::arithmetic_side_effects)] // constant 16-bit shift of a u32
    pub const fn from_word(word: u32) -> Self {
        Self {
            left: (word >> 16) as u16 as i16,
            right: word as u16 as i16,
        }
    }

    /// Apply the same attenuation to both channels.
    #[must_use]
    pub const fn attenuated(self, attenuation: Attenuation) -> Self {
        Self {
            left: attenuation.apply(self.left),
            right: attenuation.apply(self.right),
        }
    }
}

/// Pull-style generator of mono samples (the game's sound mixer).
///
/// Called once per output sample from the producer context; must not block.
pub trait SampleSource {
    /// Produce the next mono sample.
    fn next_sample(&mut self) -> i16;
}

impl<F> SampleSource for F
where
    F: FnMut() -> i16,
{
    fn next_sample(&mut self) -> i16 {
        self()
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[test]
    fn left_occupies_high_half_word() {
        let word = StereoFrame::new(1, -1).to_word();
        assert_eq!(word, 0x0001_FFFF);
    }

    #[test]
    fn word_packing_is_reversible_for_extremes() {
        for frame in [
            StereoFrame::new(i16::MIN, i16::MAX),
            StereoFrame::new(-2, 2),
            StereoFrame::SILENCE,
        ] {
            assert_eq!(StereoFrame::from_word(frame.to_word()), frame);
        }
    }

    #[test]
    fn closures_are_sample_sources() {
        let mut n = 0i16;
        let mut source = move || {
            n += 1;
            n
        };
        assert_eq!(source.next_sample(), 1);
        assert_eq!(source.next_sample(), 2);
    }

    #[test]
    fn attenuated_shifts_both_channels() {
        let frame = StereoFrame::new(-8, 8).attenuated(Attenuation::new(2));
        assert_eq!(frame, StereoFrame::new(-2, 2));
    }
}
