//! Millisecond clock shared by the renderer, producers and the sync estimator
//!
//! Timestamps are 32-bit wrapping milliseconds, the unit the AirPlay
//! receiver uses for play times. Differences are always taken with
//! [`ms_between`] so a wrap of the counter does not produce a bogus jump.

use std::time::Instant;

/// Source of the pipeline's wall clock
pub trait Clock: Send + Sync {
    /// Current time in wrapping milliseconds
    fn now_ms(&self) -> u32;
}

/// Monotonic clock counting milliseconds since construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    /// Reference time
    epoch: Instant,
}

impl SystemClock {
    /// Create a new clock starting at zero
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[allow(clippy::cast_possible_truncation)]
    fn now_ms(&self) -> u32 {
        // Truncation is the wrap
        self.epoch.elapsed().as_millis() as u32
    }
}

/// Signed milliseconds from `earlier` to `later`
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn ms_between(later: u32, earlier: u32) -> i64 {
    i64::from(later.wrapping_sub(earlier) as i32)
}

/// Convert a frame count to milliseconds at `sample_rate`
#[must_use]
pub fn frames_to_ms(frames: i64, sample_rate: u32) -> i64 {
    if sample_rate == 0 {
        return 0;
    }
    frames.saturating_mul(1000) / i64::from(sample_rate)
}

/// Convert a millisecond magnitude to a rounded frame count at `sample_rate`
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn ms_to_frames(ms: f64, sample_rate: u32) -> u32 {
    (ms.abs() * f64::from(sample_rate) / 1000.0).round() as u32
}
