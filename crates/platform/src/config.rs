//! Application configuration and constants
//!
//! Central identity and board clocking values. Everything that logs a banner
//! or derives a clock divider reads these rather than hardcoding values.

/// The application name
pub const APP_NAME: &str = "Digger";

/// Target platform of this port
pub const APP_TARGET: &str = "RP2350";

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// System clock the board runs at (overclocked, core voltage 1.50 V).
pub const SYS_CLOCK_HZ: u32 = 252_000_000;

/// Game frame rate in millihertz (12.5 Hz, the DOS timer tick the game logic assumes).
pub const GAME_FRAME_RATE_MHZ: u32 = 12_500;

/// Game frame period in microseconds.
pub const GAME_FRAME_PERIOD_US: u64 = 80_000;
