//! Test doubles for the pipeline's collaborators
//!
//! Stand-ins for the wall clock, the DAC volume setter, and the Bluetooth
//! and AirPlay transports, so handlers can be driven without hardware.

pub mod mock_stack;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::audio::clock::Clock;
use crate::config::SinkConfig;
use crate::output::VolumeControl;
use crate::pipeline::Pipeline;
use crate::sink::events::{EventCallback, SinkEvent};

pub use mock_stack::{MockBluetoothStack, MockRaopReceiver};

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU32,
}

impl ManualClock {
    /// Create a clock reading `start_ms`
    #[must_use]
    pub fn new(start_ms: u32) -> Self {
        Self {
            now: AtomicU32::new(start_ms),
        }
    }

    /// Set the current time
    pub fn set(&self, ms: u32) {
        self.now.store(ms, Ordering::Release);
    }

    /// Move the clock forward
    pub fn advance(&self, ms: u32) {
        self.now.fetch_add(ms, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.load(Ordering::Acquire)
    }
}

/// Volume setter that records every call
#[derive(Debug, Default)]
pub struct RecordingVolume {
    calls: Mutex<Vec<(u32, u32)>>,
}

impl RecordingVolume {
    /// Recorded left/right pairs, oldest first
    pub fn calls(&self) -> Vec<(u32, u32)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent left/right pair
    pub fn last(&self) -> Option<(u32, u32)> {
        self.calls().last().copied()
    }
}

impl VolumeControl for RecordingVolume {
    fn set_volume(&self, left: u32, right: u32) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((left, right));
    }
}

/// Collects sink events
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<SinkEvent>>,
}

impl EventLog {
    /// Create a log and the callback feeding it
    #[must_use]
    pub fn capture() -> (Arc<Self>, EventCallback) {
        let log = Arc::new(Self::default());
        let sink = log.clone();
        let callback: EventCallback = Arc::new(move |event| {
            sink.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event);
        });
        (log, callback)
    }

    /// Events received so far
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// A pipeline wired to a [`ManualClock`] and a [`RecordingVolume`]
pub struct TestPipeline {
    /// The pipeline
    pub pipeline: Arc<Pipeline>,
    /// Its clock
    pub clock: Arc<ManualClock>,
    /// Its volume setter
    pub volume: Arc<RecordingVolume>,
}

impl TestPipeline {
    /// Build from `config` with the clock at 1000 ms
    #[must_use]
    pub fn new(config: SinkConfig) -> Self {
        let clock = Arc::new(ManualClock::new(1000));
        let volume = Arc::new(RecordingVolume::default());
        let pipeline = Arc::new(Pipeline::new(config, clock.clone(), volume.clone()));
        Self {
            pipeline,
            clock,
            volume,
        }
    }
}
