//! Sink events for application integration

use std::sync::Arc;

use crate::output::{DeviceVolume, ExternalSource};

use super::sync::Correction;

/// Events emitted by the external sink handlers
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    /// A producer took ownership of the output
    Claimed {
        /// Owning producer
        sink: ExternalSource,
    },

    /// A producer released the output
    Released {
        /// Releasing producer
        sink: ExternalSource,
        /// The release followed a flush, so a disconnect is routine
        expected: bool,
    },

    /// Rendering started or is scheduled to start
    PlaybackStarted {
        /// Producer
        sink: ExternalSource,
        /// Deferred start time (ms), if any
        start_at: Option<u32>,
    },

    /// Rendering stopped while still owning the output
    PlaybackStopped {
        /// Producer
        sink: ExternalSource,
        /// Buffered audio was discarded
        flushed: bool,
    },

    /// Stream sample rate changed
    RateChanged {
        /// Producer
        sink: ExternalSource,
        /// New sample rate
        sample_rate: u32,
    },

    /// Drift correction issued to the renderer
    SyncCorrected {
        /// Mean drift (ms) that triggered it
        error_ms: f64,
        /// Correction applied
        correction: Correction,
    },

    /// Device volume changed
    VolumeChanged {
        /// Producer
        sink: ExternalSource,
        /// Volume pair sent to the device
        volume: DeviceVolume,
    },
}

/// Callback type for sink events
///
/// Invoked after the handler has released its locks.
pub type EventCallback = Arc<dyn Fn(SinkEvent) + Send + Sync + 'static>;
