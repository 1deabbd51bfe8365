//! Audio pipeline error type.

/// Errors the audio pipeline can report.
///
/// The default write path never produces one: with the unbounded
/// [`Spin`](super::Spin) wait a claim can only stall, not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AudioError {
    /// Both buffers stayed hardware-owned for as long as the wait strategy
    /// was willing to wait. The completion interrupt is not firing.
    Stalled {
        /// Failed claim attempts before giving up.
        attempts: u32,
    },
}

impl core::fmt::Display for AudioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Stalled { attempts } => write!(
                f,
                "audio chain stalled: no buffer released after {attempts} claim attempts"
            ),
        }
    }
}

#[cfg(any(test, feature = "std"))]
impl std::error::Error for AudioError {}
