//! RP2350 back end: PIO0 I2S transmitter and the DMA channel pair.
//!
//! # Hardware
//!
//! - PIO0 SM0 runs a 16-bit stereo I2S program. DATA is an `out` pin,
//!   BCLK/LRCLK are side-set (BCLK = side bit 0, LRCLK = side bit 1).
//! - DMA channels 10 and 11 stream 32-bit words into the SM0 TX FIFO, paced
//!   by `DREQ_PIO0_TX0`, and chain to each other.
//! - Completions are routed to `DMA_IRQ_1`. `DMA_IRQ_0` belongs to
//!   embassy-rp's own DMA driver, which enables every channel on `INTE0`
//!   during `embassy_rp::init`; channels 10/11 are removed from it so its
//!   handler never clears our raw flags.
//!
//! Register access goes through `embassy_rp::pac` (feature `unstable-pac`):
//! embassy-rp's safe DMA API only exposes one-shot transfers, not chains.

use embassy_rp::pac;
use embassy_rp::pac::dma::regs::{ChanAbort, CtrlTrig};
use embassy_rp::pac::dma::vals::{DataSize, TreqSel};
use embassy_rp::peripherals::{DMA_CH10, DMA_CH11, PIO0};
use embassy_rp::pio::{
    Common, Config, Direction, FifoJoin, PioPin, ShiftConfig, ShiftDirection, StateMachine,
};
use embassy_rp::Peripheral;
use fixed::types::extra::U8;
use fixed::FixedU32;

use platform::audio_types::SampleRateHz;
use platform::dma::{
    ChainChannel, ChainCompletion, ChainConfigure, ChainTrigger, ChannelSet, SplitChain,
    TransferDescriptor,
};
use platform::dma_safety::{AUDIO_DMA_CHANNEL_A, AUDIO_DMA_CHANNEL_B, AUDIO_DMA_IRQ_INDEX};

use super::clock_math::{pio_clock_divider, PioClockDivider};

/// `DREQ_PIO0_TX0`: data request of PIO0 SM0's TX FIFO.
pub const DREQ_PIO0_TX0: u8 = 0;

const IRQ_LINE: usize = AUDIO_DMA_IRQ_INDEX;

fn channel_number(channel: ChainChannel) -> u8 {
    match channel {
        ChainChannel::A => AUDIO_DMA_CHANNEL_A,
        ChainChannel::B => AUDIO_DMA_CHANNEL_B,
    }
}

#[allow(clippy::arithmetic_side_effects)] // channel numbers are < 16
fn channel_mask(channel: ChainChannel) -> u32 {
    1 << channel_number(channel)
}

fn regs(channel: ChainChannel) -> pac::dma::Channel {
    pac::DMA.ch(usize::from(channel_number(channel)))
}

#[allow(clippy::cast_possible_truncation)] // RP2350 addresses are 32-bit
fn write_descriptor(regs: pac::dma::Channel, descriptor: TransferDescriptor) {
    regs.read_addr().write_value(descriptor.source as u32);
    regs.trans_count().write(|w| {
        w.set_mode(0.into());
        w.set_count(descriptor.words);
    });
}

// ─── I2S transmitter ─────────────────────────────────────────────────────────

/// PIO0 SM0 running the I2S program, enabled and waiting for FIFO data.
pub struct I2sOutput<'d> {
    _sm: StateMachine<'d, PIO0, 0>,
    divider: PioClockDivider,
}

impl<'d> I2sOutput<'d> {
    /// Load the I2S program, configure SM0 for `sample_rate` at the current
    /// system clock, and enable it.
    ///
    /// Returns `None` if no PIO divider can produce `sample_rate`.
    pub fn new(
        common: &mut Common<'d, PIO0>,
        mut sm: StateMachine<'d, PIO0, 0>,
        data: impl Peripheral<P = impl PioPin + 'd> + 'd,
        bit_clock: impl Peripheral<P = impl PioPin + 'd> + 'd,
        lr_clock: impl Peripheral<P = impl PioPin + 'd> + 'd,
        sample_rate: SampleRateHz,
    ) -> Option<Self> {
        let divider = pio_clock_divider(embassy_rp::clocks::clk_sys_freq(), sample_rate)?;

        // side 0bWB: W = word select (LRCLK), B = bit clock.
        let program = pio_proc::pio_asm!(
            ".side_set 2",
            "    set x, 14          side 0b01",
            "left_data:",
            "    out pins, 1        side 0b00",
            "    jmp x-- left_data  side 0b01",
            "    out pins, 1        side 0b10",
            "    set x, 14          side 0b11",
            "right_data:",
            "    out pins, 1        side 0b10",
            "    jmp x-- right_data side 0b11",
            "    out pins, 1        side 0b00",
        );

        let data = common.make_pio_pin(data);
        let bit_clock = common.make_pio_pin(bit_clock);
        let lr_clock = common.make_pio_pin(lr_clock);
        let loaded = common.load_program(&program.program);

        let mut cfg = Config::default();
        cfg.use_program(&loaded, &[&bit_clock, &lr_clock]);
        cfg.set_out_pins(&[&data]);
        cfg.clock_divider = FixedU32::<U8>::from_bits(divider.to_bits());
        // Left sample sits in the high half-word, so it is shifted out first.
        cfg.shift_out = ShiftConfig {
            threshold: 32,
            direction: ShiftDirection::Left,
            auto_fill: true,
        };
        cfg.fifo_join = FifoJoin::TxOnly;
        sm.set_config(&cfg);
        sm.set_pin_dirs(Direction::Out, &[&data, &bit_clock, &lr_clock]);
        sm.set_enable(true);

        #[cfg(feature = "defmt")]
        defmt::info!(
            "i2s: PIO0 SM0 at {=u32} Hz, divider {=u16}+{=u8}/256",
            sample_rate.get(),
            divider.integer,
            divider.fraction
        );

        Some(Self { _sm: sm, divider })
    }

    /// Address of SM0's TX FIFO, the DMA write target.
    #[allow(clippy::cast_possible_truncation)] // RP2350 addresses are 32-bit
    pub fn tx_fifo_addr(&self) -> u32 {
        pac::PIO0.txf(0).as_ptr() as u32
    }

    /// Data request line pacing the DMA channels.
    pub fn dreq(&self) -> u8 {
        DREQ_PIO0_TX0
    }

    /// Divider the state machine runs at.
    pub fn divider(&self) -> PioClockDivider {
        self.divider
    }
}

// ─── DMA chain ───────────────────────────────────────────────────────────────

/// Channels 10 and 11 as a [`ChainConfigure`] engine.
///
/// Holding the embassy-rp channel singletons keeps every other driver off
/// these two channels.
pub struct Rp2350Dma<'d> {
    _a: DMA_CH10,
    _b: DMA_CH11,
    dreq: u8,
    fifo_addr: u32,
    _i2s: core::marker::PhantomData<&'d ()>,
}

impl<'d> Rp2350Dma<'d> {
    /// Take channels 10/11 to stream into `i2s`'s TX FIFO, paced by its DREQ.
    pub fn new(a: DMA_CH10, b: DMA_CH11, i2s: &I2sOutput<'d>) -> Self {
        Self {
            _a: a,
            _b: b,
            dreq: i2s.dreq(),
            fifo_addr: i2s.tx_fifo_addr(),
            _i2s: core::marker::PhantomData,
        }
    }
}

impl ChainConfigure for Rp2350Dma<'_> {
    fn reset(&mut self, channel: ChainChannel) {
        let regs = regs(channel);
        let mask = channel_mask(channel);

        // Drop EN first so an abort of the partner cannot chain back into us.
        let mut ctrl = regs.ctrl_trig().read();
        ctrl.set_en(false);
        regs.al1_ctrl().write_value(ctrl.0);

        // CHAN_ABORT is write-one-to-abort.
        pac::DMA.chan_abort().write_value(ChanAbort(mask));
        while regs.ctrl_trig().read().busy() {
            core::hint::spin_loop();
        }
        pac::DMA.ints(IRQ_LINE).write_value(mask);
    }

    fn configure(
        &mut self,
        channel: ChainChannel,
        descriptor: TransferDescriptor,
        chain_to: ChainChannel,
    ) {
        let regs = regs(channel);
        regs.write_addr().write_value(self.fifo_addr);
        write_descriptor(regs, descriptor);

        let mut ctrl = CtrlTrig(0);
        ctrl.set_treq_sel(TreqSel::from(self.dreq));
        ctrl.set_data_size(DataSize::SIZE_WORD);
        ctrl.set_incr_read(true);
        ctrl.set_incr_write(false);
        ctrl.set_chain_to(channel_number(chain_to));
        ctrl.set_en(true);
        // AL1_CTRL is the non-triggering alias of CTRL_TRIG.
        regs.al1_ctrl().write_value(ctrl.0);
    }

    fn enable_completion_irq(&mut self, channel: ChainChannel) {
        let mask = channel_mask(channel);
        pac::DMA.inte(0).modify(|w| *w &= !mask);
        pac::DMA.inte(IRQ_LINE).modify(|w| *w |= mask);
    }
}

impl SplitChain for Rp2350Dma<'_> {
    type Trigger = Rp2350Trigger;
    type Completion = Rp2350Completion;

    fn split(self) -> (Self::Trigger, Self::Completion) {
        (Rp2350Trigger { _private: () }, Rp2350Completion { _private: () })
    }
}

/// Producer-side handle of channels 10/11.
pub struct Rp2350Trigger {
    _private: (),
}

impl ChainTrigger for Rp2350Trigger {
    fn start(&mut self, channel: ChainChannel) {
        // Rewriting CTRL_TRIG with its own value triggers the channel.
        let regs = regs(channel);
        let ctrl = regs.ctrl_trig().read();
        regs.ctrl_trig().write_value(ctrl);
    }
}

/// Interrupt-side handle of channels 10/11.
pub struct Rp2350Completion {
    _private: (),
}

impl ChainCompletion for Rp2350Completion {
    fn pending(&mut self) -> ChannelSet {
        let flags = pac::DMA.ints(IRQ_LINE).read();
        ChainChannel::ALL
            .into_iter()
            .filter(|channel| flags & channel_mask(*channel) != 0)
            .collect()
    }

    fn acknowledge(&mut self, channel: ChainChannel) {
        // INTS is write-one-to-clear.
        pac::DMA.ints(IRQ_LINE).write_value(channel_mask(channel));
    }

    fn rearm(&mut self, channel: ChainChannel, descriptor: TransferDescriptor) {
        write_descriptor(regs(channel), descriptor);
    }
}
