use crate::audio::buffer::*;

fn write_all(buffer: &mut OutputBuffer, data: &[u8]) -> usize {
    let mut written = 0;
    while written < data.len() {
        let n = buffer.cont_write().min(data.len() - written);
        if n == 0 {
            break;
        }
        buffer.write_region(n).copy_from_slice(&data[written..written + n]);
        buffer.inc_write(n);
        written += n;
    }
    written
}

#[test]
fn test_write_read_simple() {
    let mut buffer = OutputBuffer::new(1024);

    let data = vec![1u8, 2, 3, 4, 5];
    let written = write_all(&mut buffer, &data);
    assert_eq!(written, 5);
    assert_eq!(buffer.used(), 5);
    assert_eq!(buffer.space(), 1019);

    let mut output = vec![0u8; 5];
    let read = buffer.read(&mut output);
    assert_eq!(read, 5);
    assert_eq!(output, data);
    assert!(buffer.is_empty());
}

#[test]
fn test_capacity_aligned_to_frames() {
    assert_eq!(OutputBuffer::new(1027).capacity(), 1024);
    assert_eq!(OutputBuffer::new(3).capacity(), FRAME_ALIGN);
}

#[test]
fn test_cont_write_stops_at_wrap() {
    let mut buffer = OutputBuffer::new(16);

    write_all(&mut buffer, &[0; 12]);
    let mut out = [0u8; 8];
    buffer.read(&mut out);

    // 4 bytes left before the end, 8 more free after wrapping
    assert_eq!(buffer.space(), 12);
    assert_eq!(buffer.cont_write(), 4);
    assert_eq!(buffer.write_region(100).len(), 4);
}

#[test]
fn test_wraparound() {
    let mut buffer = OutputBuffer::new(8);

    write_all(&mut buffer, &[1, 2, 3, 4, 5]);
    let mut out = vec![0u8; 3];
    buffer.read(&mut out);
    assert_eq!(out, vec![1, 2, 3]);

    // Wraps in two contiguous runs
    assert_eq!(write_all(&mut buffer, &[6, 7, 8, 9, 10, 11]), 6);
    assert!(buffer.is_full());
    assert_eq!(buffer.cont_write(), 0);

    let mut out = vec![0u8; 8];
    let n = buffer.read(&mut out);
    assert_eq!(n, 8);
    assert_eq!(out, vec![4, 5, 6, 7, 8, 9, 10, 11]);
}

#[test]
fn test_peek_and_skip() {
    let mut buffer = OutputBuffer::new(1024);
    write_all(&mut buffer, &[1, 2, 3, 4, 5]);

    let mut out = vec![0u8; 3];
    assert_eq!(buffer.peek(&mut out), 3);
    assert_eq!(out, vec![1, 2, 3]);
    assert_eq!(buffer.used(), 5);

    assert_eq!(buffer.skip(2), 2);
    assert_eq!(buffer.cont_read(), 3);
    assert_eq!(buffer.skip(100), 3);
    assert!(buffer.is_empty());
}

#[test]
fn test_flush_resets_cursors() {
    let mut buffer = OutputBuffer::new(64);
    write_all(&mut buffer, &[7; 40]);
    buffer.flush();

    assert!(buffer.is_empty());
    assert_eq!(buffer.cont_write(), 64);

    // Flushing twice is harmless
    buffer.flush();
    assert_eq!(buffer.space(), 64);
}

#[test]
fn test_resize_discards_and_reallocates() {
    let mut buffer = OutputBuffer::new(64);
    write_all(&mut buffer, &[7; 40]);

    buffer.resize(423_360);
    assert_eq!(buffer.capacity(), 423_360);
    assert!(buffer.is_empty());
    assert_eq!(buffer.cont_write(), 423_360);
}

#[test]
fn test_buffer_wrapping_randomized() {
    use rand::Rng;

    let mut buffer = OutputBuffer::new(104);
    let mut rng = rand::thread_rng();

    let mut current_val: u8 = 0;
    let mut expected_val: u8 = 0;

    for _ in 0..1000 {
        let should_write = if buffer.is_empty() {
            true
        } else if buffer.is_full() {
            false
        } else {
            rng.gen_bool(0.5)
        };

        if should_write {
            let write_size = rng.gen_range(1..=buffer.space().max(1));
            let mut data = Vec::with_capacity(write_size);
            for _ in 0..write_size {
                data.push(current_val);
                current_val = current_val.wrapping_add(1);
            }
            assert_eq!(write_all(&mut buffer, &data), write_size);
        } else {
            let read_size = rng.gen_range(1..=buffer.used().max(1));
            let mut out = vec![0u8; read_size];
            let n = buffer.read(&mut out);

            for &b in &out[..n] {
                assert_eq!(b, expected_val);
                expected_val = expected_val.wrapping_add(1);
            }
        }
    }
}
