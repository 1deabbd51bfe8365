//! DMA resource budget and buffer sizing constants for RP2350.
//!
//! ## DMA Accessibility on RP2350
//!
//! | Memory Region  | Base Address | Size   | DMA | Use case |
//! |----------------|-------------|--------|-----|----------|
//! | SRAM0–7        | 0x2000_0000 | 512 KB | YES | Audio ping-pong buffers, framebuffer |
//! | SRAM8/9        | 0x2008_0000 | 8 KB   | YES | Core stacks |
//! | XIP flash      | 0x1000_0000 | 4 MB   | read only | Never a DMA *source* for audio (cache misses stall the FIFO) |
//!
//! ## Channel and interrupt ownership
//!
//! The video driver on the second core claims DMA channels dynamically from
//! the low end and owns `DMA_IRQ_0` with an exclusive handler. Audio uses two
//! fixed high channels and `DMA_IRQ_1` so neither side can starve the other.

// ── Memory region addresses ──────────────────────────────────────────────────

/// Base address of striped main SRAM (SRAM0–7).
pub const SRAM_BASE: u32 = 0x2000_0000;

/// Size of striped main SRAM in bytes (512 KB).
pub const SRAM_SIZE_BYTES: usize = 512 * 1024;

/// `true` if `[addr, addr + len)` lies entirely in main SRAM and `addr` is
/// word aligned: the only placement the audio chain may stream from.
#[allow(clippy::arithmetic_side_effects)] // modulo by a non-zero constant
pub fn is_audio_dma_source(addr: usize, len: usize) -> bool {
    let base = SRAM_BASE as usize;
    let Some(end) = addr.checked_add(len) else {
        return false;
    };
    addr % AUDIO_DMA_BUFFER_ALIGN == 0
        && addr >= base
        && end <= base.saturating_add(SRAM_SIZE_BYTES)
}

// ── Channel / IRQ allocation ─────────────────────────────────────────────────

/// DMA channel that plays buffer 0 and is started by software.
pub const AUDIO_DMA_CHANNEL_A: u8 = 10;

/// DMA channel that plays buffer 1; triggered only by channel A.
pub const AUDIO_DMA_CHANNEL_B: u8 = 11;

/// DMA interrupt line index used for audio completions (`DMA_IRQ_1`).
pub const AUDIO_DMA_IRQ_INDEX: usize = 1;

/// NVIC priority of the audio completion interrupt (mid-range, below video).
pub const AUDIO_DMA_IRQ_PRIORITY: u8 = 0x80;

// ── Audio DMA constants ──────────────────────────────────────────────────────

/// Number of hardware buffers in the ping-pong chain.
pub const AUDIO_DMA_BUFFER_COUNT: usize = 2;

/// Stereo frames per buffer (one 32-bit word per frame).
///
/// At 44.1 kHz, 4096 frames = ~92.9 ms per buffer, enough for one game frame
/// (3528 frames at 12.5 Hz).
pub const AUDIO_DMA_BUFFER_FRAMES: usize = crate::audio_config::MAX_FRAMES_PER_TRANSFER;

/// Size of one audio DMA buffer in bytes (16-bit stereo packed into 32 bits).
pub const AUDIO_DMA_BUFFER_BYTES: usize = AUDIO_DMA_BUFFER_FRAMES * 4;

/// Required alignment of each buffer: the DMA reads whole words.
pub const AUDIO_DMA_BUFFER_ALIGN: usize = 4;

/// Size of the HDMI framebuffer sharing SRAM: 320 x 240 at 8bpp (palette).
pub const FRAMEBUFFER_SIZE_BYTES: usize = 320 * 240;
