//! Mock Bluetooth stack and AirPlay receiver

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::sink::airplay::AirPlaySink;
use crate::sink::bluetooth::BluetoothSink;
use crate::sink::registry::{BluetoothStack, RaopReceiver};

/// Bluetooth stack that keeps the handler it was given
#[derive(Default)]
pub struct MockBluetoothStack {
    sink: Mutex<Option<Arc<BluetoothSink>>>,
    inits: AtomicUsize,
    deinits: AtomicUsize,
}

impl MockBluetoothStack {
    /// Handler registered by the last `init`
    pub fn sink(&self) -> Option<Arc<BluetoothSink>> {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of `init` calls
    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::Acquire)
    }

    /// Number of `deinit` calls
    pub fn deinits(&self) -> usize {
        self.deinits.load(Ordering::Acquire)
    }
}

impl BluetoothStack for MockBluetoothStack {
    fn init(&self, sink: Arc<BluetoothSink>) {
        *self.sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(sink);
        self.inits.fetch_add(1, Ordering::AcqRel);
    }

    fn deinit(&self) {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner).take();
        self.deinits.fetch_add(1, Ordering::AcqRel);
    }
}

/// AirPlay receiver that keeps the handler it was given
#[derive(Default)]
pub struct MockRaopReceiver {
    sink: Mutex<Option<Arc<AirPlaySink>>>,
    inits: AtomicUsize,
    deinits: AtomicUsize,
}

impl MockRaopReceiver {
    /// Handler registered by the last `init`
    pub fn sink(&self) -> Option<Arc<AirPlaySink>> {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of `init` calls
    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::Acquire)
    }

    /// Number of `deinit` calls
    pub fn deinits(&self) -> usize {
        self.deinits.load(Ordering::Acquire)
    }
}

impl RaopReceiver for MockRaopReceiver {
    fn init(&self, sink: Arc<AirPlaySink>) {
        *self.sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(sink);
        self.inits.fetch_add(1, Ordering::AcqRel);
    }

    fn deinit(&self) {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner).take();
        self.deinits.fetch_add(1, Ordering::AcqRel);
    }
}
