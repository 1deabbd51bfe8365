//! Audio integration tests — the full producer / chain / interrupt loop.
// Integration test file: expect/unwrap/panic are intentional test mechanisms.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
)]
//!
//! `MockDma` plays the role of the hardware: `transmit` streams a channel's
//! buffer and raises its completion flag, and the test then runs the
//! completion handler as the interrupt would. Threads model the interrupt
//! preempting a producer blocked in `write`.
//!
//! Run with: cargo test -p digger-firmware --test integration_audio

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use firmware::audio::{init, AudioOutput, BufferPool, PlaybackState};
use platform::audio_config::AudioConfig;
use platform::dma::ChainChannel;
use platform::mocks::MockDma;
use platform::StereoFrame;

fn config(frames: usize) -> AudioConfig {
    AudioConfig {
        frames_per_transfer: frames,
        ..AudioConfig::default()
    }
}

fn frames(pairs: &[(i16, i16)]) -> Vec<StereoFrame> {
    pairs.iter().map(|&(l, r)| StereoFrame::new(l, r)).collect()
}

/// Two frames per transfer: pre-roll both buffers, start, then a third
/// write waits for the first completion and lands in buffer 0, padded.
#[test]
fn third_write_blocks_until_first_completion() {
    let mut pool = BufferPool::<2>::new();
    let dma = MockDma::new();
    let AudioOutput {
        mut producer,
        mut completion,
    } = init(&mut pool, dma.clone(), &config(2));

    producer.write(&frames(&[(1, -1), (2, -2)]), 2);
    assert_eq!(producer.state(), PlaybackState::Priming(1));
    assert!(dma.starts().is_empty());

    producer.write(&frames(&[(3, -3), (4, -4)]), 2);
    assert_eq!(producer.state(), PlaybackState::Running);
    assert_eq!(dma.starts(), [ChainChannel::A]);

    thread::scope(|s| {
        let writer = s.spawn(move || {
            producer.write(&frames(&[(5, -5)]), 1);
            producer
        });

        // Both buffers are in flight: the writer must still be spinning.
        thread::sleep(Duration::from_millis(50));
        assert!(!writer.is_finished(), "write returned with no buffer free");

        // SAFETY: buffer 0 is chain-owned and the writer is blocked.
        let played = unsafe { dma.transmit(ChainChannel::A) };
        assert_eq!(played, frames(&[(1, -1), (2, -2)]));
        completion.on_interrupt();

        let producer = writer.join().unwrap();
        assert_eq!(producer.progress(), 1);
    });

    // SAFETY: buffer 1 was filled during pre-roll and never released.
    let played = unsafe { dma.transmit(ChainChannel::B) };
    assert_eq!(played, frames(&[(3, -3), (4, -4)]));
    completion.on_interrupt();

    // SAFETY: the third write has returned; buffer 0 is chain-owned again.
    let played = unsafe { dma.transmit(ChainChannel::A) };
    assert_eq!(played, frames(&[(5, -5), (0, 0)]));
}

/// Software starts channel A exactly once; every later transfer is chained.
#[test]
fn chain_is_started_once_and_alternates() {
    let mut pool = BufferPool::<4>::new();
    let dma = MockDma::new();
    let AudioOutput {
        mut producer,
        mut completion,
    } = init(&mut pool, dma.clone(), &config(4));

    for n in 0..8i16 {
        producer.write(&[StereoFrame::mono(n)], 1);
        if producer.state() == PlaybackState::Running {
            // SAFETY: the active channel's buffer was filled by the write above
            // or during pre-roll, and is chain-owned until on_interrupt runs.
            let (_, played) = unsafe { dma.transmit_next() }.unwrap();
            assert_eq!(played[0].left, n - 1);
            completion.on_interrupt();
        }
    }

    assert_eq!(dma.starts(), [ChainChannel::A]);
    let order: Vec<_> = dma.transmitted().into_iter().map(|(ch, _)| ch).collect();
    assert_eq!(
        order,
        [
            ChainChannel::A,
            ChainChannel::B,
            ChainChannel::A,
            ChainChannel::B,
            ChainChannel::A,
            ChainChannel::B,
            ChainChannel::A,
        ]
    );
}

/// A producer writing continuously against a consumer that streams at its
/// own pace never deadlocks, and every frame arrives once, in order.
///
/// The consumer keeps the producer one buffer ahead: transfer `k` is streamed
/// only once write `k + 1` has returned (or the producer is done), so at most
/// one buffer is ever free and the chain never runs dry.
#[test]
fn producer_and_interrupt_stay_live_across_threads() {
    const WRITES: usize = 200;

    let mut pool = BufferPool::<8>::new();
    let dma = MockDma::new();
    let AudioOutput {
        mut producer,
        mut completion,
    } = init(&mut pool, dma.clone(), &config(8));
    let (written_tx, written_rx) = mpsc::channel::<usize>();

    thread::scope(|s| {
        s.spawn(move || {
            for n in 0..WRITES {
                let sample = n as i16;
                producer.write(&[StereoFrame::new(sample, -sample)], 1);
                written_tx.send(n + 1).unwrap();
            }
        });

        let hardware = dma.clone();
        s.spawn(move || {
            let mut written = 0;
            let mut streamed = 0;
            while streamed < WRITES {
                let ready = if written == WRITES {
                    WRITES
                } else {
                    written.saturating_sub(1)
                };
                while streamed < ready {
                    // SAFETY: writes `streamed` and `streamed + 1` have
                    // returned, so both buffers are chain-owned and the
                    // producer is blocked until the handler below runs.
                    let next = unsafe { hardware.transmit_next() };
                    assert!(next.is_some(), "chain stopped after {streamed} transfers");
                    completion.on_interrupt();
                    streamed += 1;
                }
                if streamed < WRITES {
                    written = written_rx.recv().unwrap();
                }
            }
        });
    });

    let played = dma.transmitted();
    assert_eq!(played.len(), WRITES);
    for (n, (channel, transfer)) in played.iter().enumerate() {
        let expected = if n % 2 == 0 {
            ChainChannel::A
        } else {
            ChainChannel::B
        };
        assert_eq!(*channel, expected);
        assert_eq!(transfer.len(), 8);
        assert_eq!(transfer[0], StereoFrame::new(n as i16, -(n as i16)));
        assert!(transfer[1..].iter().all(|f| *f == StereoFrame::SILENCE));
    }
}

/// Once the chain has drained both buffers, the lowest-free policy refills
/// buffer 0 twice in a row, so channel B replays its previous contents.
#[test]
fn underrun_makes_channel_b_replay_its_last_buffer() {
    let mut pool = BufferPool::<1>::new();
    let dma = MockDma::new();
    let AudioOutput {
        mut producer,
        mut completion,
    } = init(&mut pool, dma.clone(), &config(1));

    producer.write(&[StereoFrame::mono(0)], 1);
    producer.write(&[StereoFrame::mono(1)], 1);
    assert_eq!(producer.state(), PlaybackState::Running);

    // Both pre-rolled buffers play out before the producer catches up.
    // SAFETY: single-threaded; nothing writes a buffer while it streams.
    assert_eq!(unsafe { dma.transmit(ChainChannel::A) }, [StereoFrame::mono(0)]);
    completion.on_interrupt();
    // SAFETY: as above.
    assert_eq!(unsafe { dma.transmit(ChainChannel::B) }, [StereoFrame::mono(1)]);
    completion.on_interrupt();

    producer.write(&[StereoFrame::mono(2)], 1);
    // SAFETY: as above.
    assert_eq!(unsafe { dma.transmit(ChainChannel::A) }, [StereoFrame::mono(2)]);
    completion.on_interrupt();

    // Buffer 1 is still free, but buffer 0 is the lowest free index.
    producer.write(&[StereoFrame::mono(3)], 1);
    // SAFETY: as above.
    assert_eq!(unsafe { dma.transmit(ChainChannel::B) }, [StereoFrame::mono(1)]);
    completion.on_interrupt();
    // SAFETY: as above.
    assert_eq!(unsafe { dma.transmit(ChainChannel::A) }, [StereoFrame::mono(3)]);
}

/// Re-running init after a session silences the pool and starts from
/// pre-roll again.
#[test]
fn reinit_restarts_from_preroll() {
    let mut pool = BufferPool::<2>::new();
    {
        let AudioOutput { mut producer, .. } = init(&mut pool, MockDma::new(), &config(2));
        producer.write(&frames(&[(9, 9)]), 1);
        producer.write(&frames(&[(9, 9)]), 1);
        assert_eq!(producer.state(), PlaybackState::Running);
    }

    let dma = MockDma::new();
    let AudioOutput { mut producer, .. } = init(&mut pool, dma.clone(), &config(2));
    assert_eq!(producer.state(), PlaybackState::NotStarted);
    producer.write(&frames(&[(1, 1)]), 1);
    assert_eq!(producer.state(), PlaybackState::Priming(1));
    assert!(dma.starts().is_empty());
}
