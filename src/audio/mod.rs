//! Audio handling module

pub mod buffer;
pub mod clock;
pub mod convert;
pub mod format;


pub use buffer::OutputBuffer;
pub use clock::{Clock, SystemClock, frames_to_ms, ms_between, ms_to_frames};
pub use convert::{copy_native, widen_i16_to_i32};
pub use format::SampleWidth;
