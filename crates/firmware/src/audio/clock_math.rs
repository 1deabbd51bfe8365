//! PIO clock divider calculation for the I2S transmitter.
//!
//! The I2S program spends two PIO cycles per bit and shifts 32 bits per
//! stereo frame (16 left, 16 right), so one frame costs 64 PIO cycles.
//!
//! # Divider Formula
//!
//!   PIO_CLK = SYS_CLK / DIV
//!   fs      = PIO_CLK / 64
//!   DIV     = SYS_CLK / (64 x fs)
//!
//! The PIO divider is 16.8 fixed point. Scaling by 256 for the fraction:
//!
//!   DIV_8_8 = SYS_CLK x 256 / (64 x fs) = SYS_CLK x 4 / fs
//!
//! # Worked Example (252 MHz, 44.1 kHz)
//!
//!   DIV_8_8  = 252 000 000 x 4 / 44 100 = 22 857   (truncated from 22 857.14)
//!   integer  = 22 857 >> 8   = 89
//!   fraction = 22 857 & 0xff = 73
//!   actual fs = 252 000 000 x 4 / 22 857 = 44 100.27 Hz  (+6 ppm, inaudible)
//!
//! The intermediate `SYS_CLK x 4` overflows `u32` above ~1.07 GHz, so the
//! computation runs in `u64`.

use platform::audio_types::SampleRateHz;
pub use platform::config::SYS_CLOCK_HZ;

/// PIO cycles per stereo frame: 32 bits x 2 instructions per bit.
pub const PIO_CYCLES_PER_FRAME: u32 = 64;

/// Largest integer part the PIO `CLKDIV.INT` field holds.
pub const MAX_DIVIDER_INTEGER: u32 = u16::MAX as u32;

/// PIO state machine clock divider in 16.8 fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PioClockDivider {
    /// Integer part (`CLKDIV.INT`).
    pub integer: u16,
    /// Fractional part in 1/256 steps (`CLKDIV.FRAC`).
    pub fraction: u8,
}

impl PioClockDivider {
    /// Raw 8-bit-fraction fixed-point value (`integer << 8 | fraction`).
    #[allow(clippy::arithmetic_side_effects)] // 16-bit value shifted by 8 fits u32
    pub const fn to_bits(self) -> u32 {
        ((self.integer as u32) << 8) | self.fraction as u32
    }

    /// Sample rate this divider actually produces at `sys_clk_hz`, in mHz.
    #[allow(clippy::arithmetic_side_effects)] // u32 x 4000 fits u64; divisor checked non-zero
    pub fn effective_rate_millihz(self, sys_clk_hz: u32) -> u64 {
        let bits = u64::from(self.to_bits());
        if bits == 0 {
            return 0;
        }
        (u64::from(sys_clk_hz) * 4 * 1000) / bits
    }
}

/// Divider that paces the I2S program at `sample_rate` from `sys_clk_hz`.
///
/// Returns `None` when the divider would fall below 1.0 (the PIO cannot run
/// faster than the system clock) or overflow the 16-bit integer field.
#[allow(clippy::arithmetic_side_effects)] // u64 product of two u32s cannot overflow; divisor >= 8000
pub fn pio_clock_divider(sys_clk_hz: u32, sample_rate: SampleRateHz) -> Option<PioClockDivider> {
    let div = u64::from(sys_clk_hz) * 4 / u64::from(sample_rate.get());
    let integer = div >> 8;
    if integer == 0 || integer > u64::from(MAX_DIVIDER_INTEGER) {
        return None;
    }
    Some(PioClockDivider {
        integer: integer as u16,
        fraction: (div & 0xff) as u8,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    fn rate(hz: u32) -> SampleRateHz {
        SampleRateHz::new(hz).unwrap()
    }

    /// Pins the board's default divider at 44.1 kHz.
    #[test]
    fn divider_at_44k1_on_252mhz() {
        let div = pio_clock_divider(SYS_CLOCK_HZ, SampleRateHz::CD).unwrap();
        assert_eq!(div, PioClockDivider { integer: 89, fraction: 73 });
        assert_eq!(div.to_bits(), 22_857);
    }

    /// Effective rate stays within 10 ppm of the target.
    #[test]
    fn effective_rate_within_10_ppm() {
        let div = pio_clock_divider(SYS_CLOCK_HZ, SampleRateHz::CD).unwrap();
        let actual = div.effective_rate_millihz(SYS_CLOCK_HZ);
        assert_eq!(actual, 44_100_275);
        let target = 44_100_000u64;
        let error_ppm = (actual.abs_diff(target) * 1_000_000) / target;
        assert!(error_ppm <= 10, "error {error_ppm} ppm");
    }

    #[test]
    fn every_supported_rate_has_a_divider_at_board_clock() {
        for hz in [8_000, 11_025, 22_050, 44_100, 48_000, 96_000, 192_000] {
            let div = pio_clock_divider(SYS_CLOCK_HZ, rate(hz));
            assert!(div.is_some(), "{hz} Hz has no divider");
        }
    }

    #[test]
    fn divider_below_one_is_rejected() {
        // 1 MHz system clock cannot pace 192 kHz x 64 cycles.
        assert_eq!(pio_clock_divider(1_000_000, rate(192_000)), None);
    }

    #[test]
    fn integer_divider_for_exact_multiple() {
        // 64 x 48 kHz x 40 = 122.88 MHz: divider is exactly 40.
        let div = pio_clock_divider(122_880_000, rate(48_000)).unwrap();
        assert_eq!(div, PioClockDivider { integer: 40, fraction: 0 });
    }
}
