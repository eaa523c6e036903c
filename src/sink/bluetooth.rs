//! Bluetooth A2DP sink handler

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{Result, SinkError};
use crate::output::{DeviceVolume, ExternalSource, Output, OutputMode, OutputState};
use crate::pipeline::Pipeline;

use super::events::{EventCallback, SinkEvent};

const SOURCE: ExternalSource = ExternalSource::Bluetooth;

/// Commands delivered by the Bluetooth stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BtCommand {
    /// A source connected
    Connected,
    /// The source disconnected
    Disconnected,
    /// Start rendering
    Play,
    /// Pause, keeping buffered audio
    Pause,
    /// Stop, discarding buffered audio
    Stop,
    /// Stream sample rate
    Rate(u32),
    /// AVRCP absolute volume (0 to 127)
    Volume(u16),
}

/// Translates Bluetooth sink commands into output transitions
pub struct BluetoothSink {
    pipeline: Arc<Pipeline>,
    events: Option<EventCallback>,
}

impl BluetoothSink {
    /// Create a handler for `pipeline`
    #[must_use]
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            events: None,
        }
    }

    /// Set event callback
    #[must_use]
    pub fn with_events(mut self, callback: EventCallback) -> Self {
        self.events = Some(callback);
        self
    }

    /// Handle a command from the Bluetooth stack
    ///
    /// # Errors
    ///
    /// Returns `DecoderActive` if the local decoder owns the output; the
    /// stack should then drop the connection. Returns `OwnershipConflict` if
    /// the AirPlay sink owns the output. The output is unchanged in both
    /// cases.
    pub fn handle_command(&self, command: BtCommand) -> Result<()> {
        let decode = self.pipeline.lock_decode();

        if !decode.is_stopped() {
            warn!("Cannot use BT sink while the local decoder is active");
            return Err(SinkError::DecoderActive { sink: SOURCE });
        }

        let event = match command {
            BtCommand::Volume(raw) => {
                let volume = DeviceVolume::from_bluetooth(raw);
                self.pipeline.set_volume(volume);
                Some(SinkEvent::VolumeChanged {
                    sink: SOURCE,
                    volume,
                })
            }
            command => {
                let mut output = self.pipeline.lock_output();
                let event = Self::apply(&mut output, command)?;
                drop(output);
                event
            }
        };
        drop(decode);

        if let (Some(event), Some(callback)) = (event, &self.events) {
            callback(event);
        }
        Ok(())
    }

    /// Handle PCM from the Bluetooth stack
    ///
    /// Returns the number of bytes enqueued.
    pub fn handle_data(&self, data: &[u8]) -> usize {
        self.pipeline.write_pcm(SOURCE, data)
    }

    fn apply(output: &mut Output, command: BtCommand) -> Result<Option<SinkEvent>> {
        if let Some(owner) = output.state.foreign_owner(SOURCE) {
            // someone else's session: a disconnect is not ours to act on
            if command == BtCommand::Disconnected {
                return Ok(None);
            }
            return Err(SinkError::OwnershipConflict {
                requested: SOURCE,
                owner,
            });
        }

        let event = match command {
            BtCommand::Connected => {
                output.state.claim(SOURCE);
                info!("BT sink started");
                Some(SinkEvent::Claimed { sink: SOURCE })
            }
            BtCommand::Disconnected => {
                if output.state.external == Some(SOURCE) {
                    output.state.release();
                    info!("BT sink stopped");
                    Some(SinkEvent::Released {
                        sink: SOURCE,
                        expected: false,
                    })
                } else {
                    None
                }
            }
            BtCommand::Play => {
                output.state.mode = OutputMode::Running;
                info!("BT sink playing");
                Some(SinkEvent::PlaybackStarted {
                    sink: SOURCE,
                    start_at: None,
                })
            }
            BtCommand::Pause => {
                Self::pause(&mut output.state);
                Some(SinkEvent::PlaybackStopped {
                    sink: SOURCE,
                    flushed: false,
                })
            }
            BtCommand::Stop => {
                // stop is flush followed by pause
                output.buffer.flush();
                Self::pause(&mut output.state);
                Some(SinkEvent::PlaybackStopped {
                    sink: SOURCE,
                    flushed: true,
                })
            }
            BtCommand::Rate(rate) => {
                output.state.set_sample_rate(rate);
                info!("Setting BT sample rate {}", rate);
                Some(SinkEvent::RateChanged {
                    sink: SOURCE,
                    sample_rate: rate,
                })
            }
            BtCommand::Volume(_) => None,
        };

        Ok(event)
    }

    fn pause(state: &mut OutputState) {
        state.mode = OutputMode::Stopped;
        info!("BT sink stopped");
    }
}
