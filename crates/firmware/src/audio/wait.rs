//! How a producer waits while no buffer is free.
//!
//! The bare-metal default is a tight spin: the chain drains one buffer per
//! transfer period, so a correctly running pipeline never spins for long.
//! Everything that waits goes through [`WaitStrategy`], so a different
//! primitive (WFE, a bounded spin feeding a watchdog) drops in without
//! touching the producer.

use core::ops::ControlFlow;

/// Called between failed claim attempts.
pub trait WaitStrategy {
    /// Pause before the next attempt, or [`ControlFlow::Break`] to give up.
    fn relax(&mut self) -> ControlFlow<()>;
}

impl<W: WaitStrategy + ?Sized> WaitStrategy for &mut W {
    fn relax(&mut self) -> ControlFlow<()> {
        (**self).relax()
    }
}

/// Spin forever. The default for [`Producer::write`](super::Producer::write).
#[derive(Debug, Clone, Copy, Default)]
pub struct Spin;

impl WaitStrategy for Spin {
    fn relax(&mut self) -> ControlFlow<()> {
        core::hint::spin_loop();
        ControlFlow::Continue(())
    }
}

/// Spin at most `limit` times, then give up.
#[derive(Debug, Clone, Copy)]
pub struct BoundedSpin {
    remaining: u32,
}

impl BoundedSpin {
    /// Allow `limit` waits before breaking.
    pub const fn new(limit: u32) -> Self {
        Self { remaining: limit }
    }
}

impl WaitStrategy for BoundedSpin {
    fn relax(&mut self) -> ControlFlow<()> {
        match self.remaining.checked_sub(1) {
            Some(remaining) => {
                self.remaining = remaining;
                core::hint::spin_loop();
                ControlFlow::Continue(())
            }
            None => ControlFlow::Break(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spin_never_breaks() {
        let mut spin = Spin;
        for _ in 0..1_000 {
            assert_eq!(spin.relax(), ControlFlow::Continue(()));
        }
    }

    #[test]
    fn bounded_spin_breaks_after_limit() {
        let mut wait = BoundedSpin::new(2);
        assert_eq!(wait.relax(), ControlFlow::Continue(()));
        assert_eq!(wait.relax(), ControlFlow::Continue(()));
        assert_eq!(wait.relax(), ControlFlow::Break(()));
        assert_eq!(wait.relax(), ControlFlow::Break(()));
    }

    #[test]
    fn borrowed_strategy_keeps_its_budget() {
        let mut wait = BoundedSpin::new(1);
        assert_eq!((&mut wait).relax(), ControlFlow::Continue(()));
        assert_eq!((&mut wait).relax(), ControlFlow::Break(()));
    }
}
