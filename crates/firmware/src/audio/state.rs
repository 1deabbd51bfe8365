//! Playback state machine: pre-roll, then steady state.
//!
//! ```text
//! NotStarted ──fill──▶ Priming(1) ──fill──▶ Running ──fill──▶ Running …
//!                                     │
//!                                     └─ start channel A (exactly once)
//! ```
//!
//! `Priming(k)` counts buffers filled so far. While priming, buffers are
//! filled strictly in index order so the chain plays them back in the order
//! they were written. The state only moves forward; a fresh `init` is the
//! only way back to `NotStarted`.

use super::buffer_pool::{BufferIndex, ClaimPolicy, BUFFER_COUNT};

/// Where playback is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackState {
    /// Nothing written yet.
    #[default]
    NotStarted,
    /// This many buffers pre-filled; chain not started.
    Priming(u8),
    /// Chain started; buffers recycle through the completion handler.
    Running,
}

/// What the producer must do after a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    /// Nothing.
    Stay,
    /// Pre-roll complete: start channel A now.
    StartChain,
}

impl PlaybackState {
    /// Claim policy for the next fill.
    pub const fn claim_policy(self) -> ClaimPolicy {
        match self {
            Self::NotStarted => ClaimPolicy::InOrder(BufferIndex::Zero),
            Self::Priming(filled) => match BufferIndex::new(filled as usize) {
                Some(next) => ClaimPolicy::InOrder(next),
                None => ClaimPolicy::LowestFree,
            },
            Self::Running => ClaimPolicy::LowestFree,
        }
    }

    /// Advance after a buffer has been filled and fenced.
    pub fn after_fill(&mut self) -> Transition {
        let filled = match *self {
            Self::Running => return Transition::Stay,
            Self::NotStarted => 1,
            Self::Priming(filled) => filled.saturating_add(1),
        };
        if usize::from(filled) >= BUFFER_COUNT {
            *self = Self::Running;
            Transition::StartChain
        } else {
            *self = Self::Priming(filled);
            Transition::Stay
        }
    }

    /// `true` once the chain has been started.
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}
