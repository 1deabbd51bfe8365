//! Digger RP2350 firmware - main entry point
//!
//! Hardware-only entry point. Brings up the audio pipeline and runs the
//! fixed-period game frame loop that drives it. Game logic, video and input
//! live elsewhere; the loop here only feeds the sound device.

#![no_std]
#![no_main]

use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

use embassy_executor::Spawner;
use embassy_rp::block::ImageDef;
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::{InterruptHandler, Pio};
use embassy_time::{Duration, Ticker};
use static_cell::{ConstStaticCell, StaticCell};

use firmware::audio::{
    init, BoundedSpin, BufferIndex, BufferPool, CompletionHandler, Health, I2sOutput, PlaybackState,
    Rp2350Completion, Rp2350Dma, SoundDevice, StallMonitor,
};
use platform::audio_config::{AudioConfig, BoardVariant, SAMPLES_PER_GAME_FRAME};
use platform::config::{APP_NAME, APP_TARGET, APP_VERSION, GAME_FRAME_PERIOD_US};
use platform::dma_safety::{
    is_audio_dma_source, AUDIO_DMA_BUFFER_BYTES, AUDIO_DMA_BUFFER_FRAMES, AUDIO_DMA_IRQ_PRIORITY,
};
use platform::StereoFrame;

use {defmt_rtt as _, panic_probe as _};

#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

embassy_rp::bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => InterruptHandler<PIO0>;
});

#[cfg(not(feature = "board-m2"))]
const BOARD: BoardVariant = BoardVariant::M1;
#[cfg(feature = "board-m2")]
const BOARD: BoardVariant = BoardVariant::M2;

/// Claim attempts before a frame is dropped: several game frames of spinning.
const CLAIM_SPIN_LIMIT: u32 = 4_000_000;

type AudioIrq = CompletionHandler<'static, Rp2350Completion, AUDIO_DMA_BUFFER_FRAMES>;

static POOL: ConstStaticCell<BufferPool<AUDIO_DMA_BUFFER_FRAMES>> =
    ConstStaticCell::new(BufferPool::new());

static SCRATCH: ConstStaticCell<[StereoFrame; SAMPLES_PER_GAME_FRAME]> =
    ConstStaticCell::new([StereoFrame::SILENCE; SAMPLES_PER_GAME_FRAME]);

static AUDIO_IRQ: StaticCell<AudioIrq> = StaticCell::new();

/// Published once by `main` before `DMA_IRQ_1` is unmasked; only the
/// interrupt dereferences it afterwards.
static AUDIO_IRQ_HANDLER: AtomicPtr<AudioIrq> = AtomicPtr::new(ptr::null_mut());

#[interrupt]
fn DMA_IRQ_1() {
    let handler = AUDIO_IRQ_HANDLER.load(Ordering::Acquire);
    // SAFETY: the pointer is null or comes from `AUDIO_IRQ.init`, whose
    // exclusive `'static` borrow was given up when it was stored. This interrupt does not
    // preempt itself, so the exclusive borrow is unique. The ownership mask
    // takes its own critical section inside `release_buffer`.
    if let Some(handler) = unsafe { handler.as_mut() } {
        handler.on_interrupt();
    }
}

/// Test tone until the game's mixer is wired in: a 441 Hz square wave,
/// a quarter second on, then silence, every two seconds.
#[allow(clippy::arithmetic_side_effects)] // constant non-zero divisors; counter wraps by modulo
fn chime() -> impl FnMut() -> i16 {
    const PERIOD: u32 = 88_200;
    const ON: u32 = 11_025;
    const HALF_WAVE: u32 = 50;
    const AMPLITUDE: i16 = 4_000;

    let mut t: u32 = 0;
    move || {
        t = (t + 1) % PERIOD;
        match (t < ON, (t / HALF_WAVE) % 2 == 0) {
            (false, _) => 0,
            (true, true) => AMPLITUDE,
            (true, false) => -AMPLITUDE,
        }
    }
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    defmt::info!("{=str} firmware v{=str} ({=str})", APP_NAME, APP_VERSION, APP_TARGET);

    let p = embassy_rp::init(Default::default());
    let config = AudioConfig {
        frames_per_transfer: SAMPLES_PER_GAME_FRAME,
        ..AudioConfig::for_board(BOARD)
    };
    defmt::info!("board {}, i2s pins {}", BOARD, config.pins);

    // Step 1: PIO0 SM0 I2S transmitter.
    let Pio {
        mut common, sm0, ..
    } = Pio::new(p.PIO0, Irqs);
    #[cfg(not(feature = "board-m2"))]
    let i2s = I2sOutput::new(&mut common, sm0, p.PIN_26, p.PIN_27, p.PIN_28, config.sample_rate);
    #[cfg(feature = "board-m2")]
    let i2s = I2sOutput::new(&mut common, sm0, p.PIN_9, p.PIN_10, p.PIN_11, config.sample_rate);
    let Some(i2s) = i2s else {
        defmt::error!(
            "no PIO divider for {=u32} Hz at this system clock; audio disabled",
            config.sample_rate.get()
        );
        return;
    };

    // Step 2: DMA chain over the static pool. Nothing streams until the
    // second frame has been queued.
    let pool = POOL.take();
    for index in BufferIndex::ALL {
        let source = pool.descriptor(index, 0).source;
        if !is_audio_dma_source(source, AUDIO_DMA_BUFFER_BYTES) {
            defmt::error!("audio buffer {} at {=usize:#x} is not in SRAM", index, source);
            return;
        }
    }
    let dma = Rp2350Dma::new(p.DMA_CH10, p.DMA_CH11, &i2s);
    let output = init(pool, dma, &config);

    // Step 3: hand the completion side to DMA_IRQ_1, then unmask it.
    let handler: *mut AudioIrq = AUDIO_IRQ.init(output.completion);
    AUDIO_IRQ_HANDLER.store(handler, Ordering::Release);
    interrupt::DMA_IRQ_1.set_priority(Priority::from(AUDIO_DMA_IRQ_PRIORITY));
    // SAFETY: the handler is published above and only touches the pool
    // through the completion role.
    unsafe { interrupt::DMA_IRQ_1.enable() };

    // Step 4: game frame loop.
    let mut device = SoundDevice::new(output.producer, chime(), SCRATCH.take());
    let mut monitor = StallMonitor::default();
    let mut ticker = Ticker::every(Duration::from_micros(GAME_FRAME_PERIOD_US));
    loop {
        if let Err(err) = device.try_fill_and_submit(BoundedSpin::new(CLAIM_SPIN_LIMIT)) {
            defmt::warn!("audio: frame dropped: {}", err);
        }

        if device.state() == PlaybackState::Running {
            if let Health::Stalled { idle_checks } = monitor.observe(device.producer().progress())
            {
                // TODO: rebuild Rp2350Dma from the split handles so the
                // session can be torn down and re-run through init.
                defmt::error!(
                    "audio: no buffer completed for {=u8} frames",
                    idle_checks
                );
            }
        }

        ticker.next().await;
    }
}
