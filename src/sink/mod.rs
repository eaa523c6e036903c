//! External producer handlers
//!
//! One handler per external source: [`BluetoothSink`] for the Bluetooth
//! A2DP sink role and [`AirPlaySink`] for the AirPlay receiver. Each
//! translates its source's commands into output transitions and buffer
//! writes on the shared [`Pipeline`](crate::pipeline::Pipeline), refusing
//! anything while the local decoder or the other source owns the output.

pub mod airplay;
pub mod bluetooth;
pub mod events;
pub mod registry;
pub mod sync;

#[cfg(test)]
mod tests;

pub use airplay::{AirPlaySink, RaopEvent};
pub use bluetooth::{BluetoothSink, BtCommand};
pub use events::{EventCallback, SinkEvent};
pub use registry::{BluetoothStack, ExternalSinks, RaopReceiver};
pub use sync::{Correction, SyncEstimator, SyncWindow, TimingSnapshot};
