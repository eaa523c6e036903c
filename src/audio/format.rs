//! Sample format definitions for the shared output buffer

use serde::{Deserialize, Serialize};

/// Number of interleaved channels carried by the output buffer
pub const CHANNELS: usize = 2;

/// Bytes per sample of the PCM delivered by external producers (16-bit)
pub const INPUT_BYTES_PER_SAMPLE: usize = 2;

/// Native sample width of the output pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SampleWidth {
    /// 16-bit signed samples, copied as-is
    #[serde(rename = "16")]
    Bits16,
    /// 32-bit signed samples, widened from 16-bit input
    #[default]
    #[serde(rename = "32")]
    Bits32,
}

impl SampleWidth {
    /// Get bytes per sample
    #[must_use]
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleWidth::Bits16 => 2,
            SampleWidth::Bits32 => 4,
        }
    }

    /// Get bytes per stereo frame
    #[must_use]
    pub fn bytes_per_frame(self) -> usize {
        self.bytes_per_sample() * CHANNELS
    }

    /// Output bytes produced per input byte
    #[must_use]
    pub fn expansion(self) -> usize {
        self.bytes_per_sample() / INPUT_BYTES_PER_SAMPLE
    }

    /// Smallest unit the writer may place into the buffer
    ///
    /// Widened samples are never split across a write boundary.
    #[must_use]
    pub fn write_granularity(self) -> usize {
        match self {
            SampleWidth::Bits16 => 1,
            SampleWidth::Bits32 => self.bytes_per_sample(),
        }
    }

    /// Convert a byte count in the output buffer to frames
    #[must_use]
    pub fn bytes_to_frames(self, bytes: usize) -> u64 {
        (bytes / self.bytes_per_frame()) as u64
    }
}
