//! Chain stall detection for an external health check.
//!
//! # Background
//!
//! The producer's claim has no timeout: if the PIO stops pulling from its
//! FIFO, or `DMA_IRQ_1` never fires, both buffers stay chain-owned and the
//! next write spins forever. The audio core itself does not try to recover.
//!
//! **Recovery procedure** (owned by the caller):
//! 1. Periodically feed [`StallMonitor::observe`] the pool's progress count
//!    (`Producer::progress`), from a context that is not blocked on a write.
//! 2. On [`Health::Stalled`], drop both session handles.
//! 3. Re-run `init` on the same pool: it silences the buffers, re-programs
//!    both channels, and starts over from pre-roll.
//! 4. Call [`StallMonitor::on_recovered`].
//!
//! # Usage Pattern
//!
//! ```rust,ignore
//! let mut monitor = StallMonitor::new(3);
//!
//! loop {
//!     ticker.next().await;
//!     if let Health::Stalled { idle_checks } = monitor.observe(producer.progress()) {
//!         // tear down and re-init the session, then:
//!         monitor.on_recovered();
//!     }
//! }
//! ```

// ─── Health ──────────────────────────────────────────────────────────────────

/// Verdict of one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Health {
    /// Completions are arriving (or too few idle checks to tell).
    Healthy,
    /// No completion for at least the configured number of checks.
    Stalled {
        /// Consecutive checks without progress. Saturates at 255.
        idle_checks: u8,
    },
}

// ─── StallMonitor ────────────────────────────────────────────────────────────

/// Counts consecutive observations with no new buffer completion.
///
/// Only meaningful once the chain is running: before pre-roll completes
/// there are no completions to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StallMonitor {
    threshold: u8,
    last_progress: Option<u32>,
    idle_checks: u8,
}

impl StallMonitor {
    /// Report a stall after `threshold` idle observations (minimum 1).
    pub const fn new(threshold: u8) -> Self {
        Self {
            threshold: if threshold == 0 { 1 } else { threshold },
            last_progress: None,
            idle_checks: 0,
        }
    }

    /// Record the current progress count and return the verdict.
    pub fn observe(&mut self, progress: u32) -> Health {
        if self.last_progress == Some(progress) {
            self.idle_checks = self.idle_checks.saturating_add(1);
        } else {
            self.last_progress = Some(progress);
            self.idle_checks = 0;
        }
        self.health()
    }

    /// Verdict of the last observation.
    pub fn health(&self) -> Health {
        if self.idle_checks >= self.threshold {
            Health::Stalled {
                idle_checks: self.idle_checks,
            }
        } else {
            Health::Healthy
        }
    }

    /// `true` if the last observation reported a stall.
    pub fn needs_recovery(&self) -> bool {
        matches!(self.health(), Health::Stalled { .. })
    }

    /// Call after re-initialising the session. Forgets the old progress
    /// count, since `init` resets it to zero.
    pub fn on_recovered(&mut self) {
        self.last_progress = None;
        self.idle_checks = 0;
    }
}

impl Default for StallMonitor {
    fn default() -> Self {
        Self::new(3)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
