//! Digger RP2350 board-support firmware: audio output pipeline
//!
//! A chained double-buffer DMA engine feeding a PIO I2S transmitter. The
//! game's per-frame sound routine is the producer; the DMA completion
//! interrupt hands buffers back.
//!
//! # Architecture
//!
//! ```text
//! Frame loop (main.rs, 12.5 Hz)
//!         ↓
//! SoundDevice (fill_and_submit: mono source → stereo frames)
//!         ↓
//! Producer ──claim──▶ BufferPool ◀──release── CompletionHandler (DMA_IRQ_1)
//!         ↓ start (once)                              ↑ acknowledge / re-arm
//! Transfer chain: channel A ⇄ channel B  ──▶  PIO0 SM0 TX FIFO
//! ```
//!
//! # Features
//!
//! - `hardware` - Build for the RP2350 target (embassy-rp, PIO, defmt)
//! - `std` - Enable standard library (host tools and tests)
//!
//! # Examples
//!
//! ## Hardware Target
//!
//! ```bash
//! cargo build --release --target thumbv8m.main-none-eabihf --features hardware
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
// unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)] // common in Rust crates; not a real issue
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
// Pedantic lints too noisy for firmware application code:
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]

pub mod audio;

// Re-export key types
pub use audio::{
    init, AudioError, AudioOutput, BufferIndex, BufferPool, CompletionHandler, PlaybackState,
    Producer, SoundDevice,
};
