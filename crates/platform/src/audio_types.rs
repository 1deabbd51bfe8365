//! Audio domain newtypes for compile-time safety.
//!
//! These zero-cost abstractions prevent common errors:
//! - `Attenuation`: right-shift volume level, clamped to 0–16
//! - `SampleRateHz`: validates 8000–192000 Hz range (PIO divider must stay >= 1)

// ── Error type ───────────────────────────────────────────────────────────────

/// Error returned when a value is out of the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfRangeError {
    /// The value that was out of range.
    pub value: u32,
    /// The inclusive minimum allowed value.
    pub min: u32,
    /// The inclusive maximum allowed value.
    pub max: u32,
}

impl core::fmt::Display for OutOfRangeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "value {} outside valid range {}..={}",
            self.value, self.min, self.max
        )
    }
}

#[cfg(any(test, feature = "std"))]
impl std::error::Error for OutOfRangeError {}

// ── Attenuation ──────────────────────────────────────────────────────────────

/// Output attenuation as an arithmetic right-shift amount.
///
/// `0` is full volume; every step halves the amplitude. `16` shifts a 16-bit
/// sample completely out, leaving `0` for non-negative samples and `-1` for
/// negative ones (near-silence).
///
/// Wraps a `u8` with the invariant `0 <= value <= 16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct Attenuation(u8);

impl Attenuation {
    /// No attenuation: samples pass through unchanged.
    pub const FULL: Self = Self(0);

    /// Maximum attenuation: a full 16-bit shift.
    pub const MAX: Self = Self(16);

    /// Create an `Attenuation`, clamping values above 16 to 16.
    #[must_use]
    pub const fn new(level: u8) -> Self {
        if level > Self::MAX.0 {
            Self::MAX
        } else {
            Self(level)
        }
    }

    /// Create an `Attenuation`, returning an error if `level > 16`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `level > 16`.
    pub fn try_new(level: u8) -> Result<Self, OutOfRangeError> {
        if level > Self::MAX.0 {
            Err(OutOfRangeError {
                value: u32::from(level),
                min: 0,
                max: u32::from(Self::MAX.0),
            })
        } else {
            Ok(Self(level))
        }
    }

    /// Return the shift amount (0–16).
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// One step louder (smaller shift), saturating at [`Attenuation::FULL`].
    #[must_use]
    pub const fn louder(self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    /// One step quieter (larger shift), saturating at [`Attenuation::MAX`].
    #[must_use]
    pub const fn quieter(self) -> Self {
        Self::new(self.0.saturating_add(1))
    }

    /// `true` when samples are copied verbatim.
    #[must_use]
    pub const fn is_full(self) -> bool {
        self.0 == 0
    }

    /// Attenuate one sample by arithmetic right shift (sign-preserving).
    ///
    /// The shift happens in `i32` so that level 16 is well defined.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Safety: |sample >> n| <= |sample| fits i16
    #[allow(clippy::arithmetic_side_effects)] // shift amount <= 16 < 32
    pub const fn apply(self, sample: i16) -> i16 {
        ((sample as i32) >> self.0) as i16
    }
}

// ── SampleRateHz ─────────────────────────────────────────────────────────────

/// Sample rate in Hz, validated to the range the PIO I2S program can pace.
///
/// Valid range: 8000–192000 Hz. The upper bound keeps the PIO clock divider
/// above 1 at the board's 252 MHz system clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct SampleRateHz(u32);

impl SampleRateHz {
    /// Minimum supported sample rate: 8000 Hz.
    pub const MIN_HZ: u32 = 8_000;

    /// Maximum supported sample rate: 192000 Hz.
    pub const MAX_HZ: u32 = 192_000;

    /// 44.1 kHz, the rate the game's sound generator was written for.
    pub const CD: Self = Self(44_100);

    /// Create a `SampleRateHz`, returning an error if out of 8000–192000 Hz.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `hz < 8000` or `hz > 192000`.
    pub fn new(hz: u32) -> Result<Self, OutOfRangeError> {
        if (Self::MIN_HZ..=Self::MAX_HZ).contains(&hz) {
            Ok(Self(hz))
        } else {
            Err(OutOfRangeError {
                value: hz,
                min: Self::MIN_HZ,
                max: Self::MAX_HZ,
            })
        }
    }

    /// Return the sample rate in Hz.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for SampleRateHz {
    fn default() -> Self {
        Self::CD
    }
}
