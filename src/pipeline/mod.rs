//! Shared output pipeline
//!
//! The pipeline is the context object every producer handler and the
//! renderer share. It owns the two locks of the output path:
//!
//! - the **decode lock** guards the local decoder state and serialises
//!   producer command handling against it;
//! - the **buffer lock** guards the output buffer cursors together with the
//!   renderer-visible [`OutputState`](crate::output::OutputState).
//!
//! When both are needed the decode lock is always taken first and released
//! last. The data path takes only the buffer lock, for one bounded copy at a
//! time.


use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use tracing::{debug, trace};

use crate::audio::clock::Clock;
use crate::audio::convert::copy_native;
use crate::audio::format::INPUT_BYTES_PER_SAMPLE;
use crate::config::SinkConfig;
use crate::decode::{DecodeGate, DecodeState};
use crate::error::{Result, SinkError};
use crate::output::{DeviceVolume, ExternalSource, Output, RendererReport, VolumeControl};

/// One bounded copy into the output buffer
#[derive(Debug, Clone, Copy)]
struct Chunk {
    /// Input bytes taken
    consumed: usize,
    /// Output bytes enqueued
    produced: usize,
    /// No room left for another sample
    full: bool,
}

/// Output pipeline shared by producers and the renderer
pub struct Pipeline {
    /// Configuration
    config: SinkConfig,
    /// Decode lock
    decode: Mutex<DecodeState>,
    /// Advisory mirror of `decode`
    gate: DecodeGate,
    /// Buffer lock
    output: Mutex<Output>,
    /// Wall clock
    clock: Arc<dyn Clock>,
    /// Device volume setter
    volume: Arc<dyn VolumeControl>,
}

impl Pipeline {
    /// Create a pipeline with an idle output and a stopped decoder
    #[must_use]
    pub fn new(config: SinkConfig, clock: Arc<dyn Clock>, volume: Arc<dyn VolumeControl>) -> Self {
        let output = Output::new(config.buffer_size);
        Self {
            config,
            decode: Mutex::new(DecodeState::Stopped),
            gate: DecodeGate::default(),
            output: Mutex::new(output),
            clock,
            volume,
        }
    }

    /// Get configuration
    #[must_use]
    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    /// Current wall clock time (ms)
    #[must_use]
    pub fn now_ms(&self) -> u32 {
        self.clock.now_ms()
    }

    /// Acquire the decode lock
    pub fn lock_decode(&self) -> MutexGuard<'_, DecodeState> {
        self.decode.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire the buffer lock
    ///
    /// Never call while holding this guard and then take the decode lock.
    pub fn lock_output(&self) -> MutexGuard<'_, Output> {
        self.output.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish the local decoder's run state
    pub fn set_decode_state(&self, state: DecodeState) {
        let mut decode = self.lock_decode();
        *decode = state;
        self.gate.publish(state);
        trace!("decode state {:?}", state);
    }

    /// Local decoder's run state
    #[must_use]
    pub fn decode_state(&self) -> DecodeState {
        *self.lock_decode()
    }

    /// Record a renderer heartbeat
    pub fn report(&self, report: RendererReport) {
        self.lock_output().apply_report(report);
    }

    /// Forward a volume pair to the device
    pub fn set_volume(&self, volume: DeviceVolume) {
        volume.apply(self.volume.as_ref());
    }

    /// Write PCM from an external producer into the output buffer
    ///
    /// Blocks, sleeping for the configured backpressure interval whenever
    /// the buffer is full, until every byte is enqueued. Data is discarded
    /// if the local decoder is active or another producer owns the output;
    /// the gate is re-checked before every chunk. Returns the number of
    /// bytes enqueued, which is the input length times the sample-width
    /// expansion when nothing was discarded.
    pub fn write_pcm(&self, source: ExternalSource, data: &[u8]) -> usize {
        let mut data = self.usable(data);
        let mut enqueued = 0;

        while !data.is_empty() {
            match self.write_chunk(source, data) {
                Ok(chunk) => {
                    enqueued += chunk.produced;
                    data = &data[chunk.consumed..];

                    // allow the renderer to drain
                    if !data.is_empty() && chunk.full {
                        thread::sleep(self.config.backpressure_interval());
                    }
                }
                Err(e) => {
                    debug!("dropping {} bytes: {}", data.len(), e);
                    break;
                }
            }
        }

        enqueued
    }

    /// Async variant of [`write_pcm`](Self::write_pcm)
    ///
    /// Backpressure sleeps on the tokio timer instead of blocking the
    /// runtime thread.
    #[cfg(feature = "tokio-runtime")]
    pub async fn write_pcm_async(&self, source: ExternalSource, data: &[u8]) -> usize {
        let mut data = self.usable(data);
        let mut enqueued = 0;

        while !data.is_empty() {
            match self.write_chunk(source, data) {
                Ok(chunk) => {
                    enqueued += chunk.produced;
                    data = &data[chunk.consumed..];

                    if !data.is_empty() && chunk.full {
                        tokio::time::sleep(self.config.backpressure_interval()).await;
                    }
                }
                Err(e) => {
                    debug!("dropping {} bytes: {}", data.len(), e);
                    break;
                }
            }
        }

        enqueued
    }

    /// Trim a trailing partial sample that can never be widened
    fn usable<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        if self.config.sample_width.expansion() == 1 {
            return data;
        }
        let whole = data.len() - data.len() % INPUT_BYTES_PER_SAMPLE;
        if whole != data.len() {
            trace!("ignoring trailing partial sample");
        }
        &data[..whole]
    }

    fn write_chunk(&self, source: ExternalSource, data: &[u8]) -> Result<Chunk> {
        if !self.gate.is_open() {
            return Err(SinkError::DecoderActive { sink: source });
        }

        let width = self.config.sample_width;
        let granularity = width.write_granularity();

        let mut output = self.lock_output();
        if let Some(owner) = output.state.foreign_owner(source) {
            return Err(SinkError::OwnershipConflict {
                requested: source,
                owner,
            });
        }

        let writable = output.buffer.cont_write();
        let writable = writable - writable % granularity;
        let bytes = writable.min(data.len() * width.expansion());

        let consumed = copy_native(width, data, output.buffer.write_region(bytes));
        let produced = consumed * width.expansion();
        output.buffer.inc_write(produced);

        Ok(Chunk {
            consumed,
            produced,
            full: output.buffer.space() < granularity,
        })
    }
}
