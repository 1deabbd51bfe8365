//! Mock implementations for testing
//!
//! Host doubles for the transfer-chain role traits and the sample source.
//! [`MockDma`] is a cheap clonable handle: split it into trigger and
//! completion roles and keep one more clone in the test to drive completions
//! and inspect what the code under test did.

#![cfg(any(test, feature = "std"))]

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::vec::Vec;

use crate::audio::StereoFrame;
use crate::dma::{
    ChainChannel, ChainCompletion, ChainConfigure, ChainTrigger, ChannelSet, SplitChain,
    TransferDescriptor,
};

/// One call made against the mock engine, in call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaEvent {
    /// `ChainConfigure::reset`
    Reset(ChainChannel),
    /// `ChainConfigure::configure`
    Configure {
        /// Channel programmed
        channel: ChainChannel,
        /// Descriptor installed
        descriptor: TransferDescriptor,
        /// Chain-to partner
        chain_to: ChainChannel,
    },
    /// `ChainConfigure::enable_completion_irq`
    EnableIrq(ChainChannel),
    /// `ChainTrigger::start`
    Start(ChainChannel),
    /// `ChainCompletion::acknowledge`
    Acknowledge(ChainChannel),
    /// `ChainCompletion::rearm`
    Rearm {
        /// Channel re-armed
        channel: ChainChannel,
        /// Descriptor reloaded
        descriptor: TransferDescriptor,
    },
}

#[derive(Debug, Default, Clone, Copy)]
struct PerChannel<T> {
    a: T,
    b: T,
}

impl<T> PerChannel<T> {
    fn get(&self, channel: ChainChannel) -> &T {
        match channel {
            ChainChannel::A => &self.a,
            ChainChannel::B => &self.b,
        }
    }

    fn get_mut(&mut self, channel: ChainChannel) -> &mut T {
        match channel {
            ChainChannel::A => &mut self.a,
            ChainChannel::B => &mut self.b,
        }
    }
}

#[derive(Debug, Default)]
struct MockDmaState {
    events: Vec<DmaEvent>,
    descriptors: PerChannel<Option<TransferDescriptor>>,
    chain_to: PerChannel<Option<ChainChannel>>,
    irq_enabled: ChannelSet,
    pending: ChannelSet,
    active: Option<ChainChannel>,
    transmitted: Vec<(ChainChannel, Vec<StereoFrame>)>,
}

/// Recording DMA chain double.
#[derive(Debug, Clone, Default)]
pub struct MockDma {
    state: Arc<Mutex<MockDmaState>>,
}

impl MockDma {
    /// Create a fresh, unconfigured engine.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockDmaState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every call made so far, in order.
    pub fn events(&self) -> Vec<DmaEvent> {
        self.lock().events.clone()
    }

    /// Channels started by software, in order.
    pub fn starts(&self) -> Vec<ChainChannel> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                DmaEvent::Start(channel) => Some(*channel),
                _ => None,
            })
            .collect()
    }

    /// Descriptor currently installed on `channel`.
    pub fn descriptor(&self, channel: ChainChannel) -> Option<TransferDescriptor> {
        *self.lock().descriptors.get(channel)
    }

    /// Chain link configured on `channel`.
    pub fn chain_target(&self, channel: ChainChannel) -> Option<ChainChannel> {
        *self.lock().chain_to.get(channel)
    }

    /// Channels whose completion interrupt has been enabled.
    pub fn irq_enabled(&self) -> ChannelSet {
        self.lock().irq_enabled
    }

    /// Raise `channel`'s completion flag without streaming anything.
    ///
    /// Models a completion the handler has not serviced yet, or a spurious
    /// one when the handler is invoked on an otherwise empty set.
    pub fn complete(&self, channel: ChainChannel) {
        self.lock().pending.insert(channel);
    }

    /// Stream `channel`'s buffer to the "peripheral", then raise its flag.
    ///
    /// Returns the frames read through the installed descriptor.
    ///
    /// # Safety
    ///
    /// The descriptor installed on `channel` must point at `words` readable,
    /// aligned `u32`s that nothing writes for the duration of the call (the
    /// buffer must be hardware-owned).
    pub unsafe fn transmit(&self, channel: ChainChannel) -> Vec<StereoFrame> {
        let mut state = self.lock();
        let frames = match *state.descriptors.get(channel) {
            Some(descriptor) => {
                // SAFETY: upheld by the caller per this function's contract.
                let words = unsafe {
                    core::slice::from_raw_parts(
                        descriptor.source as *const u32,
                        descriptor.words as usize,
                    )
                };
                words.iter().copied().map(StereoFrame::from_word).collect()
            }
            None => Vec::new(),
        };
        state.transmitted.push((channel, frames.clone()));
        state.pending.insert(channel);
        state.active = *state.chain_to.get(channel);
        frames
    }

    /// Stream whichever channel the chain is currently on.
    ///
    /// Returns `None` before the chain has been started.
    ///
    /// # Safety
    ///
    /// Same contract as [`transmit`](Self::transmit) for the active channel.
    pub unsafe fn transmit_next(&self) -> Option<(ChainChannel, Vec<StereoFrame>)> {
        let channel = self.lock().active?;
        // SAFETY: forwarded from this function's contract.
        let frames = unsafe { self.transmit(channel) };
        Some((channel, frames))
    }

    /// Everything streamed so far, as `(channel, frames)` pairs.
    pub fn transmitted(&self) -> Vec<(ChainChannel, Vec<StereoFrame>)> {
        self.lock().transmitted.clone()
    }
}

impl ChainConfigure for MockDma {
    fn reset(&mut self, channel: ChainChannel) {
        let mut state = self.lock();
        state.pending = state.pending.iter().filter(|c| *c != channel).collect();
        if state.active == Some(channel) {
            state.active = None;
        }
        state.events.push(DmaEvent::Reset(channel));
    }

    fn configure(
        &mut self,
        channel: ChainChannel,
        descriptor: TransferDescriptor,
        chain_to: ChainChannel,
    ) {
        let mut state = self.lock();
        *state.descriptors.get_mut(channel) = Some(descriptor);
        *state.chain_to.get_mut(channel) = Some(chain_to);
        state.events.push(DmaEvent::Configure {
            channel,
            descriptor,
            chain_to,
        });
    }

    fn enable_completion_irq(&mut self, channel: ChainChannel) {
        let mut state = self.lock();
        state.irq_enabled.insert(channel);
        state.events.push(DmaEvent::EnableIrq(channel));
    }
}

impl ChainTrigger for MockDma {
    fn start(&mut self, channel: ChainChannel) {
        let mut state = self.lock();
        state.active = Some(channel);
        state.events.push(DmaEvent::Start(channel));
    }
}

impl ChainCompletion for MockDma {
    fn pending(&mut self) -> ChannelSet {
        let state = self.lock();
        state
            .pending
            .iter()
            .filter(|channel| state.irq_enabled.contains(*channel))
            .collect()
    }

    fn acknowledge(&mut self, channel: ChainChannel) {
        let mut state = self.lock();
        state.pending = state.pending.iter().filter(|c| *c != channel).collect();
        state.events.push(DmaEvent::Acknowledge(channel));
    }

    fn rearm(&mut self, channel: ChainChannel, descriptor: TransferDescriptor) {
        let mut state = self.lock();
        *state.descriptors.get_mut(channel) = Some(descriptor);
        state.events.push(DmaEvent::Rearm {
            channel,
            descriptor,
        });
    }
}

impl SplitChain for MockDma {
    type Trigger = MockDma;
    type Completion = MockDma;

    fn split(self) -> (Self::Trigger, Self::Completion) {
        (self.clone(), self)
    }
}

/// Sample source replaying a fixed sequence, wrapping at the end.
#[derive(Debug, Clone)]
pub struct MockSampleSource {
    samples: Vec<i16>,
    position: usize,
    calls: usize,
}

impl MockSampleSource {
    /// Replay `samples` forever (silence if empty).
    pub fn new(samples: &[i16]) -> Self {
        Self {
            samples: samples.to_vec(),
            position: 0,
            calls: 0,
        }
    }

    /// Number of samples pulled so far.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl crate::audio::SampleSource for MockSampleSource {
    fn next_sample(&mut self) -> i16 {
        self.calls = self.calls.saturating_add(1);
        let sample = self.samples.get(self.position).copied().unwrap_or(0);
        self.position = match self.position.checked_add(1) {
            Some(next) if next < self.samples.len() => next,
            _ => 0,
        };
        sample
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::audio::SampleSource;

    #[test]
    fn pending_only_reports_irq_enabled_channels() {
        let mut dma = MockDma::new();
        dma.complete(ChainChannel::A);
        assert!(dma.pending().is_empty());
        dma.enable_completion_irq(ChainChannel::A);
        assert!(dma.pending().contains(ChainChannel::A));
        dma.acknowledge(ChainChannel::A);
        assert!(dma.pending().is_empty());
    }

    #[test]
    fn reset_clears_pending_flag_and_stops_channel() {
        let mut dma = MockDma::new();
        dma.enable_completion_irq(ChainChannel::A);
        dma.enable_completion_irq(ChainChannel::B);
        dma.start(ChainChannel::A);
        dma.complete(ChainChannel::A);
        dma.complete(ChainChannel::B);

        dma.reset(ChainChannel::A);
        assert_eq!(dma.pending(), ChannelSet::EMPTY.with(ChainChannel::B));
        // SAFETY: no channel is active, so nothing is read.
        assert!(unsafe { dma.transmit_next() }.is_none());
    }

    #[test]
    fn transmit_reads_through_descriptor_and_follows_chain() {
        let buffer: [u32; 2] = [
            StereoFrame::new(1, -1).to_word(),
            StereoFrame::new(2, -2).to_word(),
        ];
        let mut dma = MockDma::new();
        let descriptor = TransferDescriptor {
            source: buffer.as_ptr() as usize,
            words: 2,
        };
        dma.configure(ChainChannel::A, descriptor, ChainChannel::B);
        dma.start(ChainChannel::A);

        // SAFETY: `buffer` outlives the call and is not written.
        let (channel, frames) = unsafe { dma.transmit_next() }.unwrap();
        assert_eq!(channel, ChainChannel::A);
        assert_eq!(frames, [StereoFrame::new(1, -1), StereoFrame::new(2, -2)]);
        assert_eq!(dma.starts(), [ChainChannel::A]);
    }

    #[test]
    fn split_handles_share_state() {
        let observer = MockDma::new();
        let (mut trigger, mut completion) = observer.clone().split();

        trigger.start(ChainChannel::A);
        assert_eq!(observer.starts(), [ChainChannel::A]);

        let mut config = observer.clone();
        config.enable_completion_irq(ChainChannel::B);
        observer.complete(ChainChannel::B);
        assert!(completion.pending().contains(ChainChannel::B));
    }

    #[test]
    fn events_are_logged_in_call_order() {
        let mut dma = MockDma::new();
        let descriptor = TransferDescriptor {
            source: 0x2000_0000,
            words: 4,
        };
        dma.configure(ChainChannel::A, descriptor, ChainChannel::B);
        dma.enable_completion_irq(ChainChannel::A);
        dma.acknowledge(ChainChannel::A);
        dma.rearm(ChainChannel::A, descriptor);

        assert_eq!(
            dma.events(),
            [
                DmaEvent::Configure {
                    channel: ChainChannel::A,
                    descriptor,
                    chain_to: ChainChannel::B,
                },
                DmaEvent::EnableIrq(ChainChannel::A),
                DmaEvent::Acknowledge(ChainChannel::A),
                DmaEvent::Rearm {
                    channel: ChainChannel::A,
                    descriptor,
                },
            ]
        );
        assert_eq!(dma.chain_target(ChainChannel::A), Some(ChainChannel::B));
    }

    #[test]
    fn sample_source_wraps() {
        let mut source = MockSampleSource::new(&[1, 2]);
        let pulled: Vec<i16> = (0..5).map(|_| source.next_sample()).collect();
        assert_eq!(pulled, [1, 2, 1, 2, 1]);
        assert_eq!(source.calls(), 5);
    }
}
