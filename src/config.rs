//! External sink configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::audio::buffer::FRAME_ALIGN;
use crate::audio::format::SampleWidth;
use crate::error::{Result, SinkError};

/// Sink and pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Audio output device name
    pub output_device: String,

    /// Register as a Bluetooth A2DP sink
    pub enable_bt_sink: bool,

    /// Register as an AirPlay receiver sink
    pub enable_airplay: bool,

    /// Native sample width of the output buffer
    pub sample_width: SampleWidth,

    /// Initial output buffer size in bytes
    pub buffer_size: usize,

    /// Sample rate of AirPlay streams
    pub raop_sample_rate: u32,

    /// Seconds of audio the output buffer holds while AirPlay is active
    pub raop_buffer_secs: f32,

    /// Writer backpressure sleep in milliseconds
    pub backpressure_ms: u64,

    /// Drift (ms) tolerated before a skip/pause correction
    pub sync_threshold_ms: u32,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            output_device: "I2S".to_string(),
            enable_bt_sink: false,
            enable_airplay: false,
            sample_width: SampleWidth::default(),
            buffer_size: 128 * 1024,
            raop_sample_rate: 44_100,
            raop_buffer_secs: 1.2,
            backpressure_ms: 50,
            sync_threshold_ms: 10,
        }
    }
}

impl SinkConfig {
    /// Create with custom output device name
    #[must_use]
    pub fn with_device(name: impl Into<String>) -> Self {
        Self {
            output_device: name.into(),
            ..Default::default()
        }
    }

    /// Parse from a JSON document; missing fields take defaults
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check values the pipeline relies on
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Config` describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.raop_sample_rate == 0 {
            return Err(SinkError::Config {
                message: "raop_sample_rate must be non-zero".to_string(),
            });
        }
        if self.buffer_size < FRAME_ALIGN {
            return Err(SinkError::Config {
                message: format!("buffer_size must be at least {FRAME_ALIGN} bytes"),
            });
        }
        if !(self.raop_buffer_secs.is_finite() && self.raop_buffer_secs > 0.0) {
            return Err(SinkError::Config {
                message: "raop_buffer_secs must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Enable the Bluetooth sink
    #[must_use]
    pub fn bt_sink(mut self, enabled: bool) -> Self {
        self.enable_bt_sink = enabled;
        self
    }

    /// Enable the AirPlay sink
    #[must_use]
    pub fn airplay(mut self, enabled: bool) -> Self {
        self.enable_airplay = enabled;
        self
    }

    /// Set native sample width
    #[must_use]
    pub fn sample_width(mut self, width: SampleWidth) -> Self {
        self.sample_width = width;
        self
    }

    /// Set initial buffer size
    #[must_use]
    pub fn buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = bytes;
        self
    }

    /// Set backpressure interval
    #[must_use]
    pub fn backpressure_ms(mut self, ms: u64) -> Self {
        self.backpressure_ms = ms;
        self
    }

    /// Writer backpressure interval
    #[must_use]
    pub fn backpressure_interval(&self) -> Duration {
        Duration::from_millis(self.backpressure_ms)
    }

    /// Output buffer size used while AirPlay streams (32-bit stereo)
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn raop_buffer_size(&self) -> usize {
        let bytes_per_sec = self.raop_sample_rate as usize * SampleWidth::Bits32.bytes_per_frame();
        (bytes_per_sec as f64 * f64::from(self.raop_buffer_secs)) as usize
    }

    /// Whether the output device is itself a Bluetooth source
    ///
    /// Such a device cannot also register as a Bluetooth sink.
    #[must_use]
    pub fn is_bt_source(&self) -> bool {
        self.output_device.to_ascii_lowercase().contains("bt ")
    }

    /// Whether AirPlay drift correction may run on this device
    ///
    /// Disabled on Bluetooth outputs, which buffer on their own.
    #[must_use]
    pub fn sync_allowed(&self) -> bool {
        !self.output_device.to_ascii_lowercase().contains("bt")
    }
}
