//! AirPlay (RAOP) sink handler
//!
//! Besides driving the output state, this handler owns the drift estimator
//! of the current stream. The estimator and the rest of the per-stream
//! session are only touched from command dispatch, after the decode lock
//! and before the buffer lock. The data path records the play time and
//! length of each block in atomics and never takes the session lock.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::audio::clock::ms_between;
use crate::error::{Result, SinkError};
use crate::output::{DeviceVolume, ExternalSource, Output, OutputMode};
use crate::pipeline::Pipeline;

use super::events::{EventCallback, SinkEvent};
use super::sync::{Correction, SyncEstimator, TimingSnapshot};

const SOURCE: ExternalSource = ExternalSource::AirPlay;

/// Events delivered by the AirPlay receiver
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RaopEvent {
    /// Session set up; the buffer may be enlarged
    Setup,
    /// Stream starting
    Stream,
    /// Start rendering at the given time (ms)
    Play {
        /// Sender's target start time
        start_at: u32,
    },
    /// Session ended
    Stop,
    /// Discard buffered audio
    Flush,
    /// Linear volume (0.0 to 1.0)
    Volume(f32),
    /// Take a drift measurement
    Timing,
}

/// Per-stream state private to the AirPlay handler
#[derive(Debug)]
struct RaopSession {
    /// Last event was PLAY
    playing: bool,
    /// A flush announced the coming stop
    expect_stop: bool,
    /// Drift estimator
    sync: SyncEstimator,
}

/// Translates AirPlay receiver events into output transitions
pub struct AirPlaySink {
    pipeline: Arc<Pipeline>,
    session: Mutex<RaopSession>,
    /// Sender play time of the last queued block (ms)
    playtime: AtomicU32,
    /// Length of the last queued block in output bytes
    block_len: AtomicUsize,
    events: Option<EventCallback>,
}

impl AirPlaySink {
    /// Create a handler for `pipeline`
    #[must_use]
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        let config = pipeline.config();
        let sync = SyncEstimator::new(config.raop_sample_rate, config.sync_threshold_ms);
        Self {
            pipeline,
            session: Mutex::new(RaopSession {
                playing: false,
                expect_stop: false,
                sync,
            }),
            playtime: AtomicU32::new(0),
            block_len: AtomicUsize::new(0),
            events: None,
        }
    }

    /// Set event callback
    #[must_use]
    pub fn with_events(mut self, callback: EventCallback) -> Self {
        self.events = Some(callback);
        self
    }

    /// Handle an event from the AirPlay receiver
    ///
    /// # Errors
    ///
    /// Returns `DecoderActive` or `OwnershipConflict` if the output belongs
    /// to someone else. A `Timing` event returns `SyncUnavailable` or
    /// `InsufficientData` when the measurement was skipped. The output is
    /// unchanged in all error cases.
    pub fn handle_event(&self, event: RaopEvent) -> Result<()> {
        let decode = self.pipeline.lock_decode();

        if !decode.is_stopped() {
            warn!("Cannot use Airplay sink while the local decoder is active");
            return Err(SinkError::DecoderActive { sink: SOURCE });
        }

        let emitted = match event {
            RaopEvent::Volume(level) => {
                info!("Volume[0..1] {:.4}", level);
                let volume = DeviceVolume::from_linear(level);
                self.pipeline.set_volume(volume);
                Some(SinkEvent::VolumeChanged {
                    sink: SOURCE,
                    volume,
                })
            }
            event => {
                let mut session = self.lock_session();
                let mut output = self.pipeline.lock_output();
                let emitted = self.apply(&mut session, &mut output, event);
                drop(output);
                drop(session);
                emitted?
            }
        };
        drop(decode);

        if let (Some(event), Some(callback)) = (emitted, &self.events) {
            callback(event);
        }
        Ok(())
    }

    /// Handle audio from the AirPlay receiver
    ///
    /// `playtime` is the sender's intended play time of this block (ms).
    /// Returns the number of bytes enqueued.
    pub fn handle_data(&self, data: &[u8], playtime: u32) -> usize {
        self.record_block(data.len(), playtime);
        self.pipeline.write_pcm(SOURCE, data)
    }

    /// Async variant of [`handle_data`](Self::handle_data)
    #[cfg(feature = "tokio-runtime")]
    pub async fn handle_data_async(&self, data: &[u8], playtime: u32) -> usize {
        self.record_block(data.len(), playtime);
        self.pipeline.write_pcm_async(SOURCE, data).await
    }

    /// Whether drift measurement is enabled for the current stream
    #[must_use]
    pub fn sync_enabled(&self) -> bool {
        self.lock_session().sync.is_enabled()
    }

    /// Whether the estimator is still in quick mode
    #[must_use]
    pub fn sync_converging(&self) -> bool {
        self.lock_session().sync.window().is_quick()
    }

    /// Copy of the drift history
    #[must_use]
    pub fn sync_errors(&self) -> [i64; super::sync::SYNC_WINDOW] {
        *self.lock_session().sync.window().errors()
    }

    fn record_block(&self, len: usize, playtime: u32) {
        let expansion = self.pipeline.config().sample_width.expansion();
        self.playtime.store(playtime, Ordering::Release);
        self.block_len.store(len * expansion, Ordering::Release);
    }

    fn lock_session(&self) -> MutexGuard<'_, RaopSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(
        &self,
        session: &mut RaopSession,
        output: &mut Output,
        event: RaopEvent,
    ) -> Result<Option<SinkEvent>> {
        if let Some(owner) = output.state.foreign_owner(SOURCE) {
            return Err(SinkError::OwnershipConflict {
                requested: SOURCE,
                owner,
            });
        }

        let emitted = match event {
            RaopEvent::Timing => self.on_timing(session, output)?,
            RaopEvent::Setup => {
                // RTP processing needs a fair bit of room
                output.buffer.resize(self.pipeline.config().raop_buffer_size());
                info!("resizing buffer {}", output.buffer.capacity());
                None
            }
            RaopEvent::Stream => {
                info!("Stream");
                let config = self.pipeline.config();
                session.playing = false;
                session.expect_stop = false;
                session.sync.reset(config.sync_allowed());
                output.state.clear_correction();
                output.state.claim(SOURCE);
                output.state.set_sample_rate(config.raop_sample_rate);
                Some(SinkEvent::Claimed { sink: SOURCE })
            }
            RaopEvent::Stop => {
                info!("Stop");
                let expected = std::mem::take(&mut session.expect_stop);
                session.playing = false;
                session.sync.window_mut().reset();
                output.state.clear_correction();
                output.state.release();
                output.state.frames_played = 0;
                Some(SinkEvent::Released {
                    sink: SOURCE,
                    expected,
                })
            }
            RaopEvent::Flush => {
                info!("Flush");
                session.expect_stop = true;
                session.playing = false;
                session.sync.window_mut().reset();
                output.buffer.flush();
                output.state.clear_correction();
                output.state.mode = OutputMode::Stopped;
                output.state.frames_played = 0;
                Some(SinkEvent::PlaybackStopped {
                    sink: SOURCE,
                    flushed: true,
                })
            }
            RaopEvent::Play { start_at } => {
                info!("Play");
                let started = !session.playing;
                if started {
                    output.state.mode = OutputMode::StartAt;
                    output.state.start_at = start_at;
                    session.sync.set_start_time(start_at);
                    info!(
                        "Starting at {} (in {} ms)",
                        start_at,
                        ms_between(start_at, self.pipeline.now_ms())
                    );
                }
                session.playing = true;
                started.then_some(SinkEvent::PlaybackStarted {
                    sink: SOURCE,
                    start_at: Some(start_at),
                })
            }
            RaopEvent::Volume(_) => None,
        };

        Ok(emitted)
    }

    fn on_timing(&self, session: &mut RaopSession, output: &mut Output) -> Result<Option<SinkEvent>> {
        let width = self.pipeline.config().sample_width;
        let block_len = self.block_len.load(Ordering::Acquire);
        let state = &output.state;

        let snapshot = TimingSnapshot {
            now: self.pipeline.now_ms(),
            updated: state.updated,
            rendering: state.mode.is_rendering(),
            device_frames: state.device_frames,
            frames_in_process: state.frames_in_process,
            frames_played_dmp: state.frames_played_dmp,
            frames_ahead: width.bytes_to_frames(output.buffer.used().saturating_sub(block_len)),
            playtime: self.playtime.load(Ordering::Acquire),
        };

        let measurement = session.sync.measure(&snapshot)?;

        let Some(correction) = measurement.correction else {
            return Ok(None);
        };

        match correction {
            Correction::Skip(frames) => {
                output.state.skip_frames = frames;
                output.state.mode = OutputMode::SkipFrames;
                info!("skipping {} frames", frames);
            }
            Correction::Pause(frames) => {
                output.state.pause_frames = frames;
                output.state.mode = OutputMode::PauseFrames;
                info!("pausing for {} frames", frames);
            }
        }

        Ok(Some(SinkEvent::SyncCorrected {
            error_ms: measurement.mean_ms,
            correction,
        }))
    }
}
