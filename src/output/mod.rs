//! Output state shared between producers and the renderer
//!
//! The renderer owns the playback loop; producers mutate [`OutputState`]
//! under the buffer lock to attach, start, stop, or correct it. Everything
//! in [`Output`] lives behind that single lock.

pub mod volume;


use std::fmt;

use tracing::debug;

use crate::audio::buffer::OutputBuffer;
use crate::audio::clock::ms_between;

pub use volume::{DeviceVolume, VolumeControl, volume_curve};

/// Playback mode of the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// No producer attached
    #[default]
    Off,
    /// Producer attached, not rendering
    Stopped,
    /// Actively rendering
    Running,
    /// Renderer must drop `skip_frames` frames, then return to running
    SkipFrames,
    /// Renderer must hold for `pause_frames` frames, then return to running
    PauseFrames,
    /// Renderer must not emit samples before `start_at`
    StartAt,
}

impl OutputMode {
    /// Is the renderer at or past running (including corrections and a
    /// pending deferred start)?
    #[must_use]
    pub fn is_rendering(self) -> bool {
        matches!(
            self,
            OutputMode::Running
                | OutputMode::SkipFrames
                | OutputMode::PauseFrames
                | OutputMode::StartAt
        )
    }

    /// Is a frame correction pending?
    #[must_use]
    pub fn is_correcting(self) -> bool {
        matches!(self, OutputMode::SkipFrames | OutputMode::PauseFrames)
    }
}

/// External producer that may own the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternalSource {
    /// Bluetooth A2DP sink
    Bluetooth,
    /// AirPlay (RAOP) receiver
    AirPlay,
}

impl fmt::Display for ExternalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalSource::Bluetooth => write!(f, "Bluetooth"),
            ExternalSource::AirPlay => write!(f, "AirPlay"),
        }
    }
}

/// Renderer-visible output state
#[derive(Debug, Clone, Default)]
pub struct OutputState {
    /// Current playback mode
    pub mode: OutputMode,
    /// Producer owning the output, if any
    pub external: Option<ExternalSource>,
    /// Sample rate currently rendered
    pub current_sample_rate: u32,
    /// Sample rate to switch to on the next render cycle
    pub next_sample_rate: u32,
    /// Frames handed to the device but not yet confirmed played
    pub device_frames: u64,
    /// Frames in the renderer's processing stage
    pub frames_in_process: u64,
    /// Frames played since the last start
    pub frames_played: u64,
    /// Device-reported played-frame counter
    pub frames_played_dmp: u64,
    /// Frames to drop for a pending skip correction
    pub skip_frames: u32,
    /// Frames to hold for a pending pause correction
    pub pause_frames: u32,
    /// Deferred start time (ms)
    pub start_at: u32,
    /// Time of the renderer's last heartbeat (ms)
    pub updated: u32,
}

impl OutputState {
    /// Producer owning the output other than `source`, if any
    #[must_use]
    pub fn foreign_owner(&self, source: ExternalSource) -> Option<ExternalSource> {
        self.external.filter(|owner| *owner != source)
    }

    /// Take ownership for `source`, attached but not rendering
    pub fn claim(&mut self, source: ExternalSource) {
        self.external = Some(source);
        self.mode = OutputMode::Stopped;
    }

    /// Drop ownership and switch the renderer off
    pub fn release(&mut self) {
        self.external = None;
        self.mode = OutputMode::Off;
    }

    /// Set current and next sample rate together
    pub fn set_sample_rate(&mut self, rate: u32) {
        self.current_sample_rate = rate;
        self.next_sample_rate = rate;
    }

    /// Discard any pending skip/pause correction
    pub fn clear_correction(&mut self) {
        self.skip_frames = 0;
        self.pause_frames = 0;
        if self.mode.is_correcting() {
            self.mode = OutputMode::Running;
        }
    }
}

/// Progress published by the renderer each cycle
#[derive(Debug, Clone, Copy, Default)]
pub struct RendererReport {
    /// Frames queued in the device
    pub device_frames: u64,
    /// Frames being processed by the renderer
    pub frames_in_process: u64,
    /// Frames played since start
    pub frames_played: u64,
    /// Device-reported played frames
    pub frames_played_dmp: u64,
    /// Heartbeat timestamp (ms)
    pub updated: u32,
}

/// Everything guarded by the buffer lock
#[derive(Debug)]
pub struct Output {
    /// Renderer-visible state
    pub state: OutputState,
    /// Frames awaiting render
    pub buffer: OutputBuffer,
}

impl Output {
    /// Create an idle output with a buffer of `capacity` bytes
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            state: OutputState::default(),
            buffer: OutputBuffer::new(capacity),
        }
    }

    /// Record a renderer heartbeat
    pub fn apply_report(&mut self, report: RendererReport) {
        self.state.device_frames = report.device_frames;
        self.state.frames_in_process = report.frames_in_process;
        self.state.frames_played = report.frames_played;
        self.state.frames_played_dmp = report.frames_played_dmp;
        self.state.updated = report.updated;
    }

    /// Leave the deferred-start state once `now` reaches `start_at`
    ///
    /// Returns true if the renderer may emit samples.
    pub fn start_if_due(&mut self, now: u32) -> bool {
        match self.state.mode {
            OutputMode::StartAt if ms_between(now, self.state.start_at) >= 0 => {
                debug!("deferred start reached at {}", now);
                self.state.mode = OutputMode::Running;
                true
            }
            OutputMode::StartAt => false,
            mode => mode.is_rendering(),
        }
    }

    /// Drop the pending skip correction from the buffer
    ///
    /// Returns the frames actually discarded and puts the renderer back
    /// into running.
    pub fn consume_skip(&mut self, bytes_per_frame: usize) -> u32 {
        if self.state.mode != OutputMode::SkipFrames {
            return 0;
        }
        let wanted = self.state.skip_frames as usize * bytes_per_frame;
        let skipped = self.buffer.skip(wanted) / bytes_per_frame;
        self.state.skip_frames = 0;
        self.state.mode = OutputMode::Running;
        u32::try_from(skipped).unwrap_or(u32::MAX)
    }

    /// Take the pending pause correction
    ///
    /// Returns the frames of silence the renderer must insert and puts it
    /// back into running.
    pub fn consume_pause(&mut self) -> u32 {
        if self.state.mode != OutputMode::PauseFrames {
            return 0;
        }
        let frames = self.state.pause_frames;
        self.state.pause_frames = 0;
        self.state.mode = OutputMode::Running;
        frames
    }
}
