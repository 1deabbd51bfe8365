//! Audio output configuration for the Digger RP2350 boards.
//!
//! # I2S over PIO
//!
//! The streaming serial interface is a PIO state machine running a 16-bit
//! stereo I2S program. Three consecutive-ish GPIOs are used:
//!
//! | Signal        | M1  | M2  |
//! |---------------|-----|-----|
//! | DATA          | 26  | 9   |
//! | BCLK          | 27  | 10  |
//! | LRCLK (WS)    | 28  | 11  |
//!
//! BCLK and LRCLK are driven by side-set and must be adjacent, so only the
//! clock base is configurable; LRCLK is always `clock_base + 1`.

use crate::audio_types::{Attenuation, SampleRateHz};

/// Default output rate, matching the game's SDL build.
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 44_100;

/// Largest transfer the static DMA buffers can hold, in stereo frames.
///
/// One game frame at 12.5 Hz is 3528 frames; 4096 leaves headroom.
pub const MAX_FRAMES_PER_TRANSFER: usize = 4096;

/// Mono samples the game produces per frame: 44 100 Hz / 12.5 Hz.
pub const SAMPLES_PER_GAME_FRAME: usize = 3528;

/// I2S pin assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2sPins {
    /// Serial data output GPIO.
    pub data: u8,
    /// Bit clock GPIO; LRCLK is the next GPIO.
    pub clock_base: u8,
}

impl I2sPins {
    /// Word-select (LRCLK) GPIO.
    #[must_use]
    pub const fn lr_clock(self) -> u8 {
        self.clock_base.saturating_add(1)
    }
}

/// Board GPIO layout variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BoardVariant {
    /// M1 layout (HDMI on 6–13, PS/2 on 0–1, I2S on 26–28).
    #[default]
    M1,
    /// M2 layout (HDMI on 12–19, PS/2 on 2–3, I2S on 9–11).
    M2,
}

impl BoardVariant {
    /// I2S pins for this layout.
    #[must_use]
    pub const fn i2s_pins(self) -> I2sPins {
        match self {
            Self::M1 => I2sPins {
                data: 26,
                clock_base: 27,
            },
            Self::M2 => I2sPins {
                data: 9,
                clock_base: 10,
            },
        }
    }
}

/// Audio output configuration.
///
/// Set once at initialisation. Only the attenuation changes afterwards, and
/// that lives in the producer, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AudioConfig {
    /// Output sample rate.
    pub sample_rate: SampleRateHz,
    /// Requested stereo frames per DMA transfer (clamped at init).
    pub frames_per_transfer: usize,
    /// I2S pin assignment.
    pub pins: I2sPins,
    /// Initial attenuation.
    pub attenuation: Attenuation,
}

impl AudioConfig {
    /// Default configuration for a board layout.
    #[must_use]
    pub fn for_board(board: BoardVariant) -> Self {
        Self {
            pins: board.i2s_pins(),
            ..Self::default()
        }
    }

    /// Frames every transfer will carry for a buffer of `capacity` frames.
    ///
    /// Zero is promoted to one and anything above `capacity` is clamped.
    #[must_use]
    pub fn transfer_frames(&self, capacity: usize) -> usize {
        self.frames_per_transfer.min(capacity).max(1)
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: SampleRateHz::CD,
            frames_per_transfer: MAX_FRAMES_PER_TRANSFER,
            pins: BoardVariant::M1.i2s_pins(),
            attenuation: Attenuation::FULL,
        }
    }
}
