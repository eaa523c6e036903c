//! Registration of the external sinks with their transport stacks

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::error::{Result, SinkError};
use crate::output::ExternalSource;
use crate::pipeline::Pipeline;

use super::airplay::AirPlaySink;
use super::bluetooth::BluetoothSink;
use super::events::EventCallback;

/// Bluetooth stack able to host a sink
pub trait BluetoothStack: Send + Sync {
    /// Start the A2DP sink role, delivering commands and data to `sink`
    fn init(&self, sink: Arc<BluetoothSink>);

    /// Stop the A2DP sink role
    fn deinit(&self);
}

/// AirPlay receiver able to host a sink
pub trait RaopReceiver: Send + Sync {
    /// Start advertising, delivering events and audio to `sink`
    fn init(&self, sink: Arc<AirPlaySink>);

    /// Stop advertising and tear down any session
    fn deinit(&self);
}

/// Lifecycle of the external sinks attached to one pipeline
pub struct ExternalSinks {
    pipeline: Arc<Pipeline>,
    bt_stack: Option<Arc<dyn BluetoothStack>>,
    raop_receiver: Option<Arc<dyn RaopReceiver>>,
    events: Option<EventCallback>,
    bluetooth: Mutex<Option<Arc<BluetoothSink>>>,
    airplay: Mutex<Option<Arc<AirPlaySink>>>,
}

impl ExternalSinks {
    /// Create with no transports
    #[must_use]
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            bt_stack: None,
            raop_receiver: None,
            events: None,
            bluetooth: Mutex::new(None),
            airplay: Mutex::new(None),
        }
    }

    /// Set the Bluetooth stack
    #[must_use]
    pub fn with_bluetooth(mut self, stack: Arc<dyn BluetoothStack>) -> Self {
        self.bt_stack = Some(stack);
        self
    }

    /// Set the AirPlay receiver
    #[must_use]
    pub fn with_airplay(mut self, receiver: Arc<dyn RaopReceiver>) -> Self {
        self.raop_receiver = Some(receiver);
        self
    }

    /// Set event callback shared by both sinks
    #[must_use]
    pub fn with_events(mut self, callback: EventCallback) -> Self {
        self.events = Some(callback);
        self
    }

    /// Attach every enabled sink
    ///
    /// Roles that cannot attach are logged and skipped; the other role is
    /// still attached.
    pub fn attach(&self) {
        let config = self.pipeline.config();

        if config.enable_bt_sink {
            match self.attach_bluetooth() {
                Ok(_) => {}
                Err(SinkError::RoleConflict { .. }) => warn!("Cannot be a BT sink and source"),
                Err(e) => warn!("BT sink not attached: {}", e),
            }
        }

        if config.enable_airplay {
            if let Err(e) = self.attach_airplay() {
                warn!("AirPlay sink not attached: {}", e);
            }
        }
    }

    /// Detach every attached sink
    pub fn detach(&self) {
        self.detach_bluetooth();
        self.detach_airplay();
    }

    /// Attach the Bluetooth sink, returning the handler
    ///
    /// Calling again while attached returns the existing handler.
    ///
    /// # Errors
    ///
    /// Returns `SinkDisabled` if disabled or no stack is configured, and
    /// `RoleConflict` if the output device is itself a Bluetooth source.
    pub fn attach_bluetooth(&self) -> Result<Arc<BluetoothSink>> {
        let config = self.pipeline.config();
        let disabled = SinkError::SinkDisabled {
            sink: ExternalSource::Bluetooth,
        };

        if !config.enable_bt_sink {
            return Err(disabled);
        }
        if config.is_bt_source() {
            return Err(SinkError::RoleConflict {
                device: config.output_device.clone(),
            });
        }
        let Some(stack) = &self.bt_stack else {
            return Err(disabled);
        };

        let mut slot = lock(&self.bluetooth);
        if let Some(sink) = slot.as_ref() {
            return Ok(sink.clone());
        }

        let mut sink = BluetoothSink::new(self.pipeline.clone());
        if let Some(events) = &self.events {
            sink = sink.with_events(events.clone());
        }
        let sink = Arc::new(sink);
        stack.init(sink.clone());
        *slot = Some(sink.clone());
        info!("Initializing BT sink");
        Ok(sink)
    }

    /// Attach the AirPlay sink, returning the handler
    ///
    /// Calling again while attached returns the existing handler.
    ///
    /// # Errors
    ///
    /// Returns `SinkDisabled` if disabled or no receiver is configured.
    pub fn attach_airplay(&self) -> Result<Arc<AirPlaySink>> {
        let disabled = SinkError::SinkDisabled {
            sink: ExternalSource::AirPlay,
        };

        if !self.pipeline.config().enable_airplay {
            return Err(disabled);
        }
        let Some(receiver) = &self.raop_receiver else {
            return Err(disabled);
        };

        let mut slot = lock(&self.airplay);
        if let Some(sink) = slot.as_ref() {
            return Ok(sink.clone());
        }

        let mut sink = AirPlaySink::new(self.pipeline.clone());
        if let Some(events) = &self.events {
            sink = sink.with_events(events.clone());
        }
        let sink = Arc::new(sink);
        receiver.init(sink.clone());
        *slot = Some(sink.clone());
        info!("Initializing AirPlay sink");
        Ok(sink)
    }

    /// Detach the Bluetooth sink if attached
    pub fn detach_bluetooth(&self) {
        if lock(&self.bluetooth).take().is_some() {
            if let Some(stack) = &self.bt_stack {
                stack.deinit();
            }
            info!("Stopping BT sink");
        }
    }

    /// Detach the AirPlay sink if attached
    pub fn detach_airplay(&self) {
        if lock(&self.airplay).take().is_some() {
            if let Some(receiver) = &self.raop_receiver {
                receiver.deinit();
            }
            info!("Stopping AirPlay sink");
        }
    }

    /// Attached Bluetooth handler
    #[must_use]
    pub fn bluetooth(&self) -> Option<Arc<BluetoothSink>> {
        lock(&self.bluetooth).clone()
    }

    /// Attached AirPlay handler
    #[must_use]
    pub fn airplay(&self) -> Option<Arc<AirPlaySink>> {
        lock(&self.airplay).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
