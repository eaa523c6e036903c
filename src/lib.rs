//! # external-sink
//!
//! Plays audio from external sources (a Bluetooth A2DP sink and an AirPlay
//! receiver) through the shared output pipeline that the local decode
//! engine normally drives.
//!
//! ## Features
//!
//! - Mutual exclusion between the local decoder and external producers
//! - Backpressured PCM writer with 16 to 32-bit widening
//! - Output state machine shared with the renderer
//! - AirPlay drift estimation with frame skip/pause correction
//! - Cubic volume curve for both sources
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use external_sink::{AirPlaySink, Pipeline, RaopEvent, SinkConfig, SystemClock};
//! use external_sink::output::VolumeControl;
//!
//! struct Dac;
//!
//! impl VolumeControl for Dac {
//!     fn set_volume(&self, _left: u32, _right: u32) {}
//! }
//!
//! # fn example() -> Result<(), external_sink::SinkError> {
//! let config = SinkConfig::with_device("I2S").airplay(true);
//! let pipeline = Arc::new(Pipeline::new(config, Arc::new(SystemClock::new()), Arc::new(Dac)));
//!
//! let airplay = AirPlaySink::new(pipeline.clone());
//! airplay.handle_event(RaopEvent::Setup)?;
//! airplay.handle_event(RaopEvent::Stream)?;
//! airplay.handle_data(&[0u8; 1408], pipeline.now_ms() + 2000);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Pipeline**: decode lock, buffer lock, output buffer and state
//! - **Sinks**: per-source command handlers and the sync estimator
//! - **Registry**: attach/detach against the transport stacks

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
/// Error types
pub mod error;
/// Configuration
pub mod config;
/// Local decoder state
pub mod decode;

/// Testing utilities
pub mod testing;

pub mod audio;
pub mod output;
pub mod pipeline;
pub mod sink;

// Re-exports
pub use audio::{Clock, OutputBuffer, SampleWidth, SystemClock};
pub use config::SinkConfig;
pub use decode::DecodeState;
pub use error::{Result, SinkError};
pub use output::{DeviceVolume, ExternalSource, OutputMode, OutputState, RendererReport};
pub use pipeline::Pipeline;
pub use sink::{
    AirPlaySink, BluetoothSink, BtCommand, ExternalSinks, RaopEvent, SinkEvent, SyncEstimator,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
///
/// Convenient re-exports
pub mod prelude {
    pub use crate::{
        AirPlaySink, BluetoothSink, BtCommand, DecodeState, ExternalSinks, ExternalSource,
        OutputMode, Pipeline, RaopEvent, SinkConfig, SinkError, SinkEvent,
    };
}
