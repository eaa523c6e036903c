use std::io;
use thiserror::Error;

use crate::output::ExternalSource;

/// Errors raised by the external sink handlers
///
/// None of these are fatal: handlers leave the pipeline untouched and the
/// caller decides whether to log, ignore, or react (for example by dropping
/// a Bluetooth link).
#[derive(Debug, Error)]
pub enum SinkError {
    // ===== Ownership Errors =====
    /// The local decode engine currently owns the output pipeline
    #[error("cannot use {sink} sink while the local decoder is active")]
    DecoderActive {
        /// The producer whose command or data was discarded
        sink: ExternalSource,
    },

    /// Another external producer already owns the output pipeline
    #[error("{requested} sink rejected: output is owned by {owner}")]
    OwnershipConflict {
        /// The producer that attempted the transition
        requested: ExternalSource,
        /// The producer holding ownership
        owner: ExternalSource,
    },

    // ===== Synchronization Errors =====
    /// Not enough frames have been played to take a sync measurement
    #[error("insufficient playback data: {played} frames played, {required} required")]
    InsufficientData {
        /// Frames reported played by the device
        played: u64,
        /// Frames required before measuring
        required: u64,
    },

    /// Sync measurement is disabled or the renderer is not running
    #[error("sync measurement unavailable: {reason}")]
    SyncUnavailable {
        /// Why the measurement was skipped
        reason: &'static str,
    },

    // ===== Registration Errors =====
    /// The output device is a Bluetooth source and cannot also be a sink
    #[error("device {device} cannot be a BT sink and source")]
    RoleConflict {
        /// The configured output device name
        device: String,
    },

    /// The sink type is disabled in configuration
    #[error("{sink} sink is disabled")]
    SinkDisabled {
        /// The disabled producer
        sink: ExternalSource,
    },

    // ===== Configuration Errors =====
    /// Invalid configuration value
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Configuration could not be parsed
    #[error("configuration parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while loading configuration
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SinkError {
    /// Check whether this error means the pipeline is owned by someone else
    #[must_use]
    pub fn is_ownership_error(&self) -> bool {
        matches!(
            self,
            Self::DecoderActive { .. } | Self::OwnershipConflict { .. }
        )
    }

    /// Check whether this error only skipped a sync measurement
    #[must_use]
    pub fn is_measurement_skipped(&self) -> bool {
        matches!(
            self,
            Self::InsufficientData { .. } | Self::SyncUnavailable { .. }
        )
    }
}

/// Result type alias for sink operations
pub type Result<T> = std::result::Result<T, SinkError>;
