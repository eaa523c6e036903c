//! Shared output ring buffer
//!
//! A fixed-capacity circular byte region holding rendered-format frames
//! awaiting the renderer. The buffer itself is not synchronised: it lives
//! inside the pipeline's buffer lock together with the output state, so a
//! producer and the renderer never touch the cursors concurrently.

use tracing::debug;

/// Capacities are kept a multiple of the widest stereo frame (2 x 32-bit)
/// so neither cursor can wrap in the middle of a frame.
pub const FRAME_ALIGN: usize = 8;

/// Circular byte buffer with explicit fill accounting
#[derive(Debug)]
pub struct OutputBuffer {
    /// Buffer storage
    data: Vec<u8>,
    /// Read position
    read_pos: usize,
    /// Write position
    write_pos: usize,
    /// Bytes currently held
    used: usize,
}

impl OutputBuffer {
    /// Create a new buffer, rounding `capacity` down to whole frames
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u8; align_capacity(capacity)],
            read_pos: 0,
            write_pos: 0,
            used: 0,
        }
    }

    /// Get buffer capacity in bytes
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes waiting to be rendered
    #[must_use]
    pub fn used(&self) -> usize {
        self.used
    }

    /// Free bytes
    #[must_use]
    pub fn space(&self) -> usize {
        self.capacity() - self.used
    }

    /// Check if buffer is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Check if buffer is full
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.space() == 0
    }

    /// Free bytes reachable from the write cursor before it wraps
    #[must_use]
    pub fn cont_write(&self) -> usize {
        self.space().min(self.capacity() - self.write_pos)
    }

    /// Used bytes reachable from the read cursor before it wraps
    #[must_use]
    pub fn cont_read(&self) -> usize {
        self.used.min(self.capacity() - self.read_pos)
    }

    /// Mutable view of the next `len` writable bytes
    ///
    /// `len` is clamped to [`cont_write`](Self::cont_write); data placed
    /// here becomes visible once [`inc_write`](Self::inc_write) is called.
    pub fn write_region(&mut self, len: usize) -> &mut [u8] {
        let len = len.min(self.cont_write());
        let start = self.write_pos;
        &mut self.data[start..start + len]
    }

    /// Commit `count` bytes written through [`write_region`](Self::write_region)
    pub fn inc_write(&mut self, count: usize) {
        let count = count.min(self.cont_write());
        self.write_pos = (self.write_pos + count) % self.capacity();
        self.used += count;
    }

    /// Read data from buffer
    ///
    /// Returns number of bytes read
    pub fn read(&mut self, output: &mut [u8]) -> usize {
        let to_read = self.peek(output);
        self.advance_read(to_read);
        to_read
    }

    /// Peek at data without consuming
    pub fn peek(&self, output: &mut [u8]) -> usize {
        let to_peek = output.len().min(self.used);

        if to_peek == 0 {
            return 0;
        }

        let first_part = (self.capacity() - self.read_pos).min(to_peek);
        let second_part = to_peek - first_part;

        output[..first_part].copy_from_slice(&self.data[self.read_pos..self.read_pos + first_part]);

        if second_part > 0 {
            output[first_part..to_peek].copy_from_slice(&self.data[..second_part]);
        }

        to_peek
    }

    /// Skip/discard bytes from read position
    pub fn skip(&mut self, count: usize) -> usize {
        let to_skip = count.min(self.used);
        self.advance_read(to_skip);
        to_skip
    }

    /// Discard everything buffered
    pub fn flush(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
        self.used = 0;
    }

    /// Reallocate to a new capacity
    ///
    /// Buffered data is discarded; callers hold the buffer lock and own the
    /// output, so no producer or renderer is mid-copy.
    pub fn resize(&mut self, capacity: usize) {
        let capacity = align_capacity(capacity);
        if capacity != self.capacity() {
            self.data = vec![0u8; capacity];
        }
        self.flush();
        debug!("output buffer resized to {} bytes", capacity);
    }

    fn advance_read(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        self.read_pos = (self.read_pos + count) % self.capacity();
        self.used -= count;
    }
}

fn align_capacity(capacity: usize) -> usize {
    (capacity - capacity % FRAME_ALIGN).max(FRAME_ALIGN)
}
