//! Run state of the local decode engine
//!
//! External producers may only touch the output while the local decoder is
//! stopped. The authoritative state lives under the pipeline's decode lock;
//! [`DecodeGate`] mirrors it in an atomic so the data path can take the
//! advisory lock-free read it needs on every chunk.

use std::sync::atomic::{AtomicBool, Ordering};

/// Local decode engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeState {
    /// Idle; external producers may use the output
    #[default]
    Stopped,
    /// Stream opened, decoder about to run
    Ready,
    /// Decoding into the output buffer
    Running,
    /// Decoding finished, output still draining
    Complete,
    /// Decoder failed, awaiting reset
    Error,
}

impl DecodeState {
    /// Is the decoder stopped?
    #[must_use]
    pub fn is_stopped(self) -> bool {
        self == DecodeState::Stopped
    }
}

/// Lock-free mirror of the decode state
#[derive(Debug)]
pub struct DecodeGate {
    stopped: AtomicBool,
}

impl DecodeGate {
    /// Create a gate for the given initial state
    #[must_use]
    pub fn new(state: DecodeState) -> Self {
        Self {
            stopped: AtomicBool::new(state.is_stopped()),
        }
    }

    /// Publish a new state; call with the decode lock held
    pub fn publish(&self, state: DecodeState) {
        self.stopped.store(state.is_stopped(), Ordering::Release);
    }

    /// Advisory check that external writes are allowed
    ///
    /// May be stale by a few samples' worth of time; writers re-check on
    /// every unit of work.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

impl Default for DecodeGate {
    fn default() -> Self {
        Self::new(DecodeState::Stopped)
    }
}
