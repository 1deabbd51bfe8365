//! Audio subsystem — chained double-buffer DMA output
//!
//! Vertically sliced: one file per concern of the pipeline.
//!
//! # Structure
//!
//! - `buffer_pool` — the two transfer buffers and their ownership mask
//! - `state` — pre-roll / running state machine and the claim policy it implies
//! - `wait` — how a blocked claim waits (`Spin` default, `BoundedSpin`)
//! - `completion` — interrupt-side handle: acknowledge, re-arm, release
//! - `producer` — producer-side handle: claim, copy, pad, start the chain
//! - `chain` — one-time setup that wires both handles to one pool
//! - `stall` — no-progress detector for an external health check
//! - `clock_math` — PIO clock divider for a target sample rate
//! - `sound` — the per-game-frame fill-and-submit device
//! - `rp2350` — register-level backend (hardware only)
//!
//! # Dependency Injection
//!
//! The pipeline is generic over the [`platform::dma`] role traits. Concrete
//! engines are injected at the call site:
//!
//! ```rust,ignore
//! // Hardware:
//! let output = init(pool, Rp2350Dma::new(p.DMA_CH10, p.DMA_CH11, &i2s), &config);
//! // Tests:
//! let output = init(&mut pool, MockDma::new(), &config);
//! ```

pub mod buffer_pool;
pub mod chain;
pub mod clock_math;
pub mod completion;
pub mod error;
pub mod producer;
pub mod sound;
pub mod stall;
pub mod state;
pub mod wait;

#[cfg(feature = "hardware")]
pub mod rp2350;

pub use buffer_pool::{BufferIndex, BufferPool, ClaimPolicy, OwnershipMask, BUFFER_COUNT};
pub use chain::{init, AudioOutput};
pub use completion::CompletionHandler;
pub use error::AudioError;
pub use producer::Producer;
pub use sound::SoundDevice;
pub use stall::{Health, StallMonitor};
pub use state::{PlaybackState, Transition};
pub use wait::{BoundedSpin, Spin, WaitStrategy};

#[cfg(feature = "hardware")]
pub use rp2350::{I2sOutput, Rp2350Completion, Rp2350Dma, Rp2350Trigger};
