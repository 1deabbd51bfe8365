//! Hardware Abstraction Layer (HAL) for the Digger RP2350 port
//!
//! This crate provides the trait seams and domain types shared by the
//! firmware and its host tests, so the audio pipeline can be exercised
//! without physical hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Game loop (external: game logic, frame timer, video core)
//!         ↓
//! Firmware audio pipeline (firmware crate)
//!         ↓
//! Platform HAL (this crate - trait seams, newtypes, board constants)
//!         ↓
//! Hardware Layer (embassy-rp PAC: DMA, PIO)
//! ```
//!
//! # Seams
//!
//! - [`dma`] - chained two-channel DMA, split into configure / trigger /
//!   completion roles so each execution context only holds what it may touch
//! - [`audio`] - stereo frames and the pull-style [`SampleSource`]
//! - [`audio_config`] - sample rate, transfer length, pins, attenuation
//!
//! # Features
//!
//! - `std`: host builds, enables [`mocks`]
//! - `defmt`: `defmt::Format` derives for hardware logging

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors — callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod audio;
pub mod audio_config;
pub mod audio_types;
pub mod config;
pub mod dma;
pub mod dma_safety;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

// Re-export main high-level types
pub use audio::{SampleSource, StereoFrame};
pub use audio_config::{AudioConfig, BoardVariant, I2sPins};
pub use audio_types::{Attenuation, OutOfRangeError, SampleRateHz};

// Re-export DMA types
pub use dma::{
    ChainChannel, ChainCompletion, ChainConfigure, ChainTrigger, ChannelSet, SplitChain,
    TransferDescriptor,
};
