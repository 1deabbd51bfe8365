//! DMA abstraction layer for the chained ping-pong transfer engine.
//!
//! Two channels replay fixed source/count descriptors into the I2S FIFO and
//! trigger each other on completion (A → B → A …). The hardware is split into
//! role handles so the type system keeps each execution context to its own
//! capabilities:
//!
//! | Role                | Held by              | May do                              |
//! |---------------------|----------------------|-------------------------------------|
//! | [`ChainConfigure`]  | initialisation       | abort, program descriptors, IRQs    |
//! | [`ChainTrigger`]    | producer             | start a channel                     |
//! | [`ChainCompletion`] | completion interrupt | read/clear flags, re-arm descriptor |
//!
//! [`SplitChain`] turns a configured engine into the trigger/completion pair.

/// One of the two channels of the transfer chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChainChannel {
    /// Plays buffer 0; started by software exactly once.
    A,
    /// Plays buffer 1; only ever triggered by A's completion.
    B,
}

impl ChainChannel {
    /// Both channels in chain order.
    pub const ALL: [Self; 2] = [Self::A, Self::B];

    /// The channel this one chains to on completion.
    #[must_use]
    pub const fn partner(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::A => 0b01,
            Self::B => 0b10,
        }
    }
}

/// Set of chain channels, e.g. those flagged by one completion interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelSet(u8);

impl ChannelSet {
    /// No channel.
    pub const EMPTY: Self = Self(0);

    /// Both channels.
    pub const BOTH: Self = Self(0b11);

    /// Add a channel.
    pub fn insert(&mut self, channel: ChainChannel) {
        self.0 |= channel.bit();
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub const fn with(self, channel: ChainChannel) -> Self {
        Self(self.0 | channel.bit())
    }

    /// `true` if `channel` is in the set.
    #[must_use]
    pub const fn contains(self, channel: ChainChannel) -> bool {
        self.0 & channel.bit() != 0
    }

    /// `true` if no channel is in the set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Channels in the set, A before B.
    pub fn iter(self) -> impl Iterator<Item = ChainChannel> {
        ChainChannel::ALL
            .into_iter()
            .filter(move |channel| self.contains(*channel))
    }
}

impl FromIterator<ChainChannel> for ChannelSet {
    fn from_iter<I: IntoIterator<Item = ChainChannel>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

/// What a channel replays every cycle: source address and word count.
///
/// The destination (peripheral FIFO) and pacing are fixed at configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferDescriptor {
    /// Address of the first 32-bit word to stream.
    pub source: usize,
    /// Number of 32-bit words (stereo frames) per transfer.
    pub words: u32,
}

/// One-time configuration of the transfer chain.
pub trait ChainConfigure {
    /// Stop `channel` if it is still running and clear its completion flag.
    ///
    /// Called before [`configure`](Self::configure) so nothing from a
    /// previous session survives into the new one.
    fn reset(&mut self, channel: ChainChannel);

    /// Program `channel` to stream `descriptor` into the peripheral FIFO,
    /// paced by the peripheral's data request, chaining to `chain_to` on
    /// completion. Must not start the channel.
    fn configure(
        &mut self,
        channel: ChainChannel,
        descriptor: TransferDescriptor,
        chain_to: ChainChannel,
    );

    /// Route `channel`'s completion to the audio interrupt line.
    fn enable_completion_irq(&mut self, channel: ChainChannel);
}

/// Producer-side capability: kick off the chain.
pub trait ChainTrigger {
    /// Start `channel` immediately.
    fn start(&mut self, channel: ChainChannel);
}

/// Interrupt-side capability: observe completions and re-arm descriptors.
pub trait ChainCompletion {
    /// Channels whose completion flag is raised on the audio interrupt line.
    fn pending(&mut self) -> ChannelSet;

    /// Clear `channel`'s completion flag.
    fn acknowledge(&mut self, channel: ChainChannel);

    /// Reload `channel`'s source and count without triggering it.
    fn rearm(&mut self, channel: ChainChannel, descriptor: TransferDescriptor);
}

/// Split a configured engine into its two runtime role handles.
pub trait SplitChain {
    /// Handle given to the producer.
    type Trigger: ChainTrigger;
    /// Handle given to the completion interrupt.
    type Completion: ChainCompletion;

    /// Consume the engine, yielding the role handles.
    fn split(self) -> (Self::Trigger, Self::Completion);
}
