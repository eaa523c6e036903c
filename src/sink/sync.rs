//! AirPlay playback clock synchronization
//!
//! The renderer and the AirPlay sender run on independent clocks. Every
//! TIMING event the estimator measures how far real playback is from where
//! the sender wants it, averages the error over a short window, and asks
//! the renderer to skip or pause frames when the average leaves the
//! tolerance band.
//!
//! Right after a stream starts the estimator runs in *quick mode*: it
//! checks that playback began on schedule using a two-sample window, and
//! only switches to the five-sample steady window once that window has
//! wrapped with a mean inside the band.

use tracing::{debug, info};

use crate::audio::clock::{frames_to_ms, ms_between, ms_to_frames};
use crate::error::{Result, SinkError};

/// Steady-state averaging window
pub const SYNC_WINDOW: usize = 5;

/// Averaging window while converging after a stream start
pub const QUICK_WINDOW: usize = 2;

/// Circular history of drift samples (ms)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncWindow {
    errors: [i64; SYNC_WINDOW],
    index: usize,
    quick: bool,
}

impl SyncWindow {
    /// Create an empty window in quick mode
    #[must_use]
    pub fn new() -> Self {
        Self {
            errors: [0; SYNC_WINDOW],
            index: 0,
            quick: true,
        }
    }

    /// Empty the window and re-arm quick mode
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Zero the samples, keeping position and mode
    pub fn clear_errors(&mut self) {
        self.errors = [0; SYNC_WINDOW];
    }

    /// Number of samples averaged in the current mode
    #[must_use]
    pub fn size(&self) -> usize {
        if self.quick { QUICK_WINDOW } else { SYNC_WINDOW }
    }

    /// Whether the window is still converging
    #[must_use]
    pub fn is_quick(&self) -> bool {
        self.quick
    }

    /// Slot the next sample goes into
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// All stored samples
    #[must_use]
    pub fn errors(&self) -> &[i64; SYNC_WINDOW] {
        &self.errors
    }

    /// Store a sample, advance, and return the mean over the active window
    #[allow(clippy::cast_precision_loss)]
    pub fn push(&mut self, error_ms: i64) -> f64 {
        let size = self.size();
        // quick mode is only left at index 0, so the index is always in range
        let slot = self.index % size;
        self.errors[slot] = error_ms;
        self.index = (slot + 1) % size;

        let sum: i64 = self.errors[..size].iter().sum();
        sum as f64 / size as f64
    }

    /// Leave quick mode if the window just wrapped and has converged
    fn settle(&mut self, mean: f64, threshold: f64) -> bool {
        if self.quick && self.index == 0 && mean.abs() < threshold {
            self.quick = false;
            return true;
        }
        false
    }
}

impl Default for SyncWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// Renderer-facing frame correction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    /// Drop this many frames (playback is behind the sender)
    Skip(u32),
    /// Hold for this many frames (playback is ahead of the sender)
    Pause(u32),
}

/// Inputs of one measurement, captured under the buffer lock
#[derive(Debug, Clone, Copy, Default)]
pub struct TimingSnapshot {
    /// Current time (ms)
    pub now: u32,
    /// Renderer's last heartbeat (ms)
    pub updated: u32,
    /// Renderer is at or past running
    pub rendering: bool,
    /// Frames queued in the device
    pub device_frames: u64,
    /// Frames in the renderer's processing stage
    pub frames_in_process: u64,
    /// Device-reported played frames
    pub frames_played_dmp: u64,
    /// Frames buffered ahead of the most recently queued block
    pub frames_ahead: u64,
    /// Sender play time of the most recently queued block (ms)
    pub playtime: u32,
}

/// Result of one measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Drift of this sample (ms)
    pub error_ms: i64,
    /// Window mean after this sample (ms)
    pub mean_ms: f64,
    /// Correction to apply, if the mean left the tolerance band
    pub correction: Option<Correction>,
}

/// Drift estimator for one AirPlay stream
#[derive(Debug, Clone)]
pub struct SyncEstimator {
    window: SyncWindow,
    enabled: bool,
    sample_rate: u32,
    threshold_ms: f64,
    start_time: u32,
}

impl SyncEstimator {
    /// Create an estimator for a stream at `sample_rate`
    #[must_use]
    pub fn new(sample_rate: u32, threshold_ms: u32) -> Self {
        Self {
            window: SyncWindow::new(),
            enabled: false,
            sample_rate,
            threshold_ms: f64::from(threshold_ms),
            start_time: 0,
        }
    }

    /// Start a new stream: empty window, quick mode armed
    pub fn reset(&mut self, enabled: bool) {
        self.window.reset();
        self.enabled = enabled;
    }

    /// Record the sender's target start time (ms)
    pub fn set_start_time(&mut self, start_time: u32) {
        self.start_time = start_time;
    }

    /// Whether measurements are enabled for this output
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The error history
    #[must_use]
    pub fn window(&self) -> &SyncWindow {
        &self.window
    }

    /// Mutable access to the error history
    pub fn window_mut(&mut self) -> &mut SyncWindow {
        &mut self.window
    }

    /// Take one drift measurement
    ///
    /// # Errors
    ///
    /// Returns `SyncUnavailable` if sync is disabled or the renderer is not
    /// running, and `InsufficientData` until a device buffer's worth of
    /// frames has been played. The window is untouched in both cases.
    pub fn measure(&mut self, snap: &TimingSnapshot) -> Result<Measurement> {
        if !self.enabled {
            return Err(SinkError::SyncUnavailable {
                reason: "sync disabled on this output",
            });
        }
        if !snap.rendering {
            return Err(SinkError::SyncUnavailable {
                reason: "renderer not running",
            });
        }
        if snap.frames_played_dmp < snap.device_frames {
            return Err(SinkError::InsufficientData {
                played: snap.frames_played_dmp,
                required: snap.device_frames,
            });
        }

        let since_heartbeat = ms_between(snap.now, snap.updated);

        let error_ms = if self.window.is_quick() {
            // how many ms have we really played
            let played_frames = i64::try_from(snap.frames_played_dmp - snap.device_frames)
                .unwrap_or(i64::MAX);
            let played = since_heartbeat + frames_to_ms(played_frames, self.sample_rate);
            let desired = ms_between(snap.now, self.start_time);
            info!(
                "backend played {}, desired {}, (delta:{})",
                played,
                desired,
                played - desired
            );
            played - desired
        } else {
            // in how many ms will the most recent block play
            let queued = snap
                .frames_ahead
                .saturating_add(snap.device_frames)
                .saturating_add(snap.frames_in_process);
            let local = frames_to_ms(i64::try_from(queued).unwrap_or(i64::MAX), self.sample_rate)
                - since_heartbeat;
            let remote = ms_between(snap.playtime, snap.now);
            info!(
                "head local:{}, remote:{} (delta:{})",
                local,
                remote,
                remote - local
            );
            debug!(
                "ahead:{}, devframes:{}, inproc:{}",
                snap.frames_ahead, snap.device_frames, snap.frames_in_process
            );
            remote - local
        };

        let mean_ms = self.window.push(error_ms);

        // need a full quick window in band before trusting the steady one
        if self.window.settle(mean_ms, self.threshold_ms) {
            debug!("sync converged, leaving quick mode");
        }

        let correction = if mean_ms < -self.threshold_ms {
            Some(Correction::Skip(ms_to_frames(mean_ms, self.sample_rate)))
        } else if mean_ms > self.threshold_ms {
            Some(Correction::Pause(ms_to_frames(mean_ms, self.sample_rate)))
        } else {
            None
        };

        if correction.is_some() {
            // samples taken before a correction must not feed the next mean
            self.window.clear_errors();
        }

        Ok(Measurement {
            error_ms,
            mean_ms,
            correction,
        })
    }
}
