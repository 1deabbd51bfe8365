//! The two transfer buffers and the ownership mask that arbitrates them.
//!
//! # Ownership protocol
//!
//! Each buffer is owned by exactly one side at any instant:
//!
//! | Mask bit | Owner     | Who flips it                                   |
//! |----------|-----------|------------------------------------------------|
//! | `1`      | producer  | a claim sets it to `0`                         |
//! | `0`      | DMA chain | the completion handler's release sets it to `1` |
//!
//! The mask is only read-modified-written inside `critical_section::with`,
//! which on the RP2350 masks interrupts on the calling core, so a release
//! from `DMA_IRQ_1` can never interleave with a claim.
//!
//! Claim and release are crate-private: the producer is the only claimer and
//! the completion handler the only releaser.

use core::cell::{Cell, UnsafeCell};
use core::ops::ControlFlow;
use core::sync::atomic::{AtomicU32, Ordering};

use critical_section::Mutex;
use platform::dma::{ChainChannel, TransferDescriptor};

use super::error::AudioError;
use super::wait::WaitStrategy;

/// Number of transfer buffers (ping-pong pair).
pub const BUFFER_COUNT: usize = 2;

// ─── BufferIndex ─────────────────────────────────────────────────────────────

/// Identity of one of the two transfer buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferIndex {
    /// Buffer 0, streamed by channel A.
    Zero,
    /// Buffer 1, streamed by channel B.
    One,
}

impl BufferIndex {
    /// Both buffers in index order.
    pub const ALL: [Self; BUFFER_COUNT] = [Self::Zero, Self::One];

    /// Buffer at position `index`, if it exists.
    pub const fn new(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Zero),
            1 => Some(Self::One),
            _ => None,
        }
    }

    /// Position of this buffer (0 or 1).
    pub const fn get(self) -> usize {
        match self {
            Self::Zero => 0,
            Self::One => 1,
        }
    }

    /// Channel that streams this buffer.
    pub const fn channel(self) -> ChainChannel {
        match self {
            Self::Zero => ChainChannel::A,
            Self::One => ChainChannel::B,
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Zero => 0b01,
            Self::One => 0b10,
        }
    }
}

impl From<ChainChannel> for BufferIndex {
    fn from(channel: ChainChannel) -> Self {
        match channel {
            ChainChannel::A => Self::Zero,
            ChainChannel::B => Self::One,
        }
    }
}

// ─── OwnershipMask ───────────────────────────────────────────────────────────

/// One bit per buffer; `1` means free for the producer to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OwnershipMask(u8);

impl OwnershipMask {
    /// Both buffers free (state after initialisation).
    pub const ALL_FREE: Self = Self(0b11);

    /// Both buffers owned by the chain.
    pub const ALL_BUSY: Self = Self(0);

    /// `true` if `index` is free for the producer.
    pub const fn is_free(self, index: BufferIndex) -> bool {
        self.0 & index.bit() != 0
    }

    /// Lowest-index free buffer.
    pub const fn lowest_free(self) -> Option<BufferIndex> {
        if self.is_free(BufferIndex::Zero) {
            Some(BufferIndex::Zero)
        } else if self.is_free(BufferIndex::One) {
            Some(BufferIndex::One)
        } else {
            None
        }
    }

    /// Mask with `index` handed to the chain.
    pub const fn with_busy(self, index: BufferIndex) -> Self {
        Self(self.0 & !index.bit())
    }

    /// Mask with `index` handed back to the producer.
    pub const fn with_free(self, index: BufferIndex) -> Self {
        Self(self.0 | index.bit())
    }
}

// ─── ClaimPolicy ─────────────────────────────────────────────────────────────

/// Which buffer a claim may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClaimPolicy {
    /// Pre-roll: only this buffer, whatever else is free.
    InOrder(BufferIndex),
    /// Steady state: any free buffer, lowest index first.
    LowestFree,
}

impl ClaimPolicy {
    /// Buffer this policy picks from `mask`, if any.
    pub const fn select(self, mask: OwnershipMask) -> Option<BufferIndex> {
        match self {
            Self::InOrder(index) => {
                if mask.is_free(index) {
                    Some(index)
                } else {
                    None
                }
            }
            Self::LowestFree => mask.lowest_free(),
        }
    }
}

// ─── BufferPool ──────────────────────────────────────────────────────────────

/// Two fixed transfer buffers of `FRAMES` packed stereo words each.
///
/// Lives for the whole program (a `StaticCell` on hardware). Buffer contents
/// are reachable only through a claim token, so only the side holding the
/// mask bit can touch them.
pub struct BufferPool<const FRAMES: usize> {
    buffers: [UnsafeCell<[u32; FRAMES]>; BUFFER_COUNT],
    free: Mutex<Cell<OwnershipMask>>,
    completions: AtomicU32,
}

// SAFETY: buffer contents are only accessed through `Claim`, which exists
// only while the producer holds that buffer's mask bit, and the mask itself
// is only accessed inside a critical section. The DMA engine reads a buffer
// only after the producer has given it up.
unsafe impl<const FRAMES: usize> Sync for BufferPool<FRAMES> {}

impl<const FRAMES: usize> BufferPool<FRAMES> {
    const NON_EMPTY: () = assert!(FRAMES > 0, "a transfer buffer needs at least one frame");

    /// Both buffers silent, both free.
    #[allow(clippy::let_unit_value)]
    pub const fn new() -> Self {
        let () = Self::NON_EMPTY;
        Self {
            buffers: [UnsafeCell::new([0; FRAMES]), UnsafeCell::new([0; FRAMES])],
            free: Mutex::new(Cell::new(OwnershipMask::ALL_FREE)),
            completions: AtomicU32::new(0),
        }
    }

    /// Back to the post-construction state: silence, both free, no progress.
    ///
    /// Taking `&mut self` proves no claim or handler is alive.
    pub fn reset(&mut self) {
        for buffer in &mut self.buffers {
            buffer.get_mut().fill(0);
        }
        self.free = Mutex::new(Cell::new(OwnershipMask::ALL_FREE));
        *self.completions.get_mut() = 0;
    }

    /// Frames per buffer.
    pub const fn capacity(&self) -> usize {
        FRAMES
    }

    /// Snapshot of the ownership mask.
    pub fn ownership(&self) -> OwnershipMask {
        critical_section::with(|cs| self.free.borrow(cs).get())
    }

    /// Completions observed since the last reset (wraps).
    pub fn progress(&self) -> u32 {
        self.completions.load(Ordering::Relaxed)
    }

    /// Descriptor streaming `words` frames from `index`.
    pub fn descriptor(&self, index: BufferIndex, words: u32) -> TransferDescriptor {
        TransferDescriptor {
            source: self.cell(index).get() as usize,
            words,
        }
    }

    fn cell(&self, index: BufferIndex) -> &UnsafeCell<[u32; FRAMES]> {
        let [zero, one] = &self.buffers;
        match index {
            BufferIndex::Zero => zero,
            BufferIndex::One => one,
        }
    }

    /// Take a buffer for filling, waiting according to `wait` while none
    /// matching `policy` is free.
    ///
    /// The check and the mark-busy happen in one critical section; the wait
    /// happens outside it so the completion interrupt can run.
    pub(crate) fn claim_buffer<W: WaitStrategy>(
        &self,
        policy: ClaimPolicy,
        mut wait: W,
    ) -> Result<Claim<'_, FRAMES>, AudioError> {
        let mut attempts: u32 = 0;
        loop {
            let claimed = critical_section::with(|cs| {
                let free = self.free.borrow(cs);
                let index = policy.select(free.get())?;
                free.set(free.get().with_busy(index));
                Some(index)
            });
            if let Some(index) = claimed {
                return Ok(Claim { pool: self, index });
            }
            attempts = attempts.saturating_add(1);
            if let ControlFlow::Break(()) = wait.relax() {
                #[cfg(feature = "defmt")]
                defmt::warn!("audio: claim gave up after {=u32} attempts", attempts);
                return Err(AudioError::Stalled { attempts });
            }
        }
    }

    /// Hand `index` back to the producer.
    ///
    /// Returns `false`, leaving the mask untouched, if it was already free.
    pub(crate) fn release_buffer(&self, index: BufferIndex) -> bool {
        let released = critical_section::with(|cs| {
            let free = self.free.borrow(cs);
            let mask = free.get();
            if mask.is_free(index) {
                false
            } else {
                free.set(mask.with_free(index));
                true
            }
        });
        if released {
            // Wrapping is fine: the stall monitor only compares for equality.
            self.completions.fetch_add(1, Ordering::Relaxed);
        } else {
            #[cfg(feature = "defmt")]
            defmt::warn!("audio: double release of buffer {} ignored", index);
        }
        released
    }
}

impl<const FRAMES: usize> Default for BufferPool<FRAMES> {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Claim ───────────────────────────────────────────────────────────────────

/// Write access to a buffer whose mask bit the producer currently holds.
///
/// Dropping a claim does not release the buffer: only a completion does.
pub(crate) struct Claim<'p, const FRAMES: usize> {
    pool: &'p BufferPool<FRAMES>,
    index: BufferIndex,
}

impl<const FRAMES: usize> Claim<'_, FRAMES> {
    pub(crate) fn index(&self) -> BufferIndex {
        self.index
    }

    pub(crate) fn words_mut(&mut self) -> &mut [u32; FRAMES] {
        // SAFETY: this claim exists only while the producer holds the mask
        // bit for `index`, so neither the DMA chain nor another claim can be
        // accessing the buffer. `&mut self` prevents aliasing through the
        // claim itself.
        unsafe { &mut *self.pool.cell(self.index).get() }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use crate::audio::wait::{BoundedSpin, Spin};

    #[test]
    fn new_pool_is_silent_and_free() {
        let pool = BufferPool::<4>::new();
        assert_eq!(pool.ownership(), OwnershipMask::ALL_FREE);
        assert_eq!(pool.progress(), 0);
        assert_eq!(pool.capacity(), 4);
    }

    #[test]
    fn in_order_claim_ignores_other_free_buffers() {
        let pool = BufferPool::<4>::new();
        let claim = pool
            .claim_buffer(ClaimPolicy::InOrder(BufferIndex::One), Spin)
            .unwrap();
        assert_eq!(claim.index(), BufferIndex::One);
        assert_eq!(
            pool.ownership(),
            OwnershipMask::ALL_FREE.with_busy(BufferIndex::One)
        );
    }

    #[test]
    fn lowest_free_prefers_index_zero() {
        let pool = BufferPool::<4>::new();
        let first = pool.claim_buffer(ClaimPolicy::LowestFree, Spin).unwrap();
        let second = pool.claim_buffer(ClaimPolicy::LowestFree, Spin).unwrap();
        assert_eq!(first.index(), BufferIndex::Zero);
        assert_eq!(second.index(), BufferIndex::One);
        assert_eq!(pool.ownership(), OwnershipMask::ALL_BUSY);
    }

    #[test]
    fn claim_on_busy_pool_stalls_with_bounded_wait() {
        let pool = BufferPool::<4>::new();
        pool.claim_buffer(ClaimPolicy::LowestFree, Spin).unwrap();
        pool.claim_buffer(ClaimPolicy::LowestFree, Spin).unwrap();

        let err = pool
            .claim_buffer(ClaimPolicy::LowestFree, BoundedSpin::new(3))
            .err()
            .unwrap();
        assert_eq!(err, AudioError::Stalled { attempts: 4 });
        assert_eq!(pool.ownership(), OwnershipMask::ALL_BUSY);
    }

    #[test]
    fn double_release_is_rejected() {
        let pool = BufferPool::<4>::new();
        assert!(!pool.release_buffer(BufferIndex::Zero));
        assert_eq!(pool.progress(), 0);

        pool.claim_buffer(ClaimPolicy::LowestFree, Spin).unwrap();
        assert!(pool.release_buffer(BufferIndex::Zero));
        assert!(!pool.release_buffer(BufferIndex::Zero));
        assert_eq!(pool.progress(), 1);
    }

    #[test]
    fn reset_silences_and_frees() {
        let mut pool = BufferPool::<2>::new();
        {
            let mut claim = pool.claim_buffer(ClaimPolicy::LowestFree, Spin).unwrap();
            claim.words_mut().fill(0xDEAD_BEEF);
        }
        assert!(pool.release_buffer(BufferIndex::Zero));
        pool.claim_buffer(ClaimPolicy::LowestFree, Spin).unwrap();

        pool.reset();
        assert_eq!(pool.ownership(), OwnershipMask::ALL_FREE);
        assert_eq!(pool.progress(), 0);
        let mut claim = pool.claim_buffer(ClaimPolicy::LowestFree, Spin).unwrap();
        assert_eq!(claim.words_mut(), &[0, 0]);
    }

    #[test]
    fn descriptors_point_at_distinct_word_aligned_buffers() {
        let pool = BufferPool::<8>::new();
        let zero = pool.descriptor(BufferIndex::Zero, 8);
        let one = pool.descriptor(BufferIndex::One, 8);
        assert_ne!(zero.source, one.source);
        assert_eq!(zero.source % 4, 0);
        assert_eq!(one.source % 4, 0);
        assert_eq!(zero.source.abs_diff(one.source), 8 * 4);
    }

    #[test]
    fn index_and_channel_agree() {
        for index in BufferIndex::ALL {
            assert_eq!(BufferIndex::from(index.channel()), index);
            assert_eq!(BufferIndex::new(index.get()), Some(index));
        }
        assert_eq!(BufferIndex::new(2), None);
    }

    mod schedule {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone, Copy)]
        enum Op {
            Claim,
            Release(bool),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![Just(Op::Claim), any::<bool>().prop_map(Op::Release)]
        }

        proptest! {
            /// No buffer is claimed twice without a release in between, and
            /// a release never lands on an already-free buffer.
            #[test]
            fn claims_and_releases_stay_exclusive(ops in proptest::collection::vec(op(), 0..64)) {
                let pool = BufferPool::<1>::new();
                let mut held = [false; BUFFER_COUNT];

                for op in ops {
                    match op {
                        Op::Claim => {
                            match pool.claim_buffer(ClaimPolicy::LowestFree, BoundedSpin::new(0)) {
                                Ok(claim) => {
                                    let i = claim.index().get();
                                    prop_assert!(!held[i], "buffer {} claimed twice", i);
                                    held[i] = true;
                                }
                                Err(_) => {
                                    prop_assert!(held.iter().all(|h| *h));
                                }
                            }
                        }
                        Op::Release(second) => {
                            let index = if second { BufferIndex::One } else { BufferIndex::Zero };
                            let released = pool.release_buffer(index);
                            prop_assert_eq!(released, held[index.get()]);
                            held[index.get()] = false;
                        }
                    }
                    let free = pool.ownership();
                    for index in BufferIndex::ALL {
                        prop_assert_eq!(free.is_free(index), !held[index.get()]);
                    }
                }
            }
        }
    }
}
