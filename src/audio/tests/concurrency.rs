use crate::audio::buffer::OutputBuffer;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[test]
fn test_concurrent_producer_consumer_under_lock() {
    let buffer = Arc::new(Mutex::new(OutputBuffer::new(4096)));
    let buffer_clone = buffer.clone();

    let iteration_count = 500;
    let chunk_size = 1000;

    let producer = thread::spawn(move || {
        for i in 0..iteration_count {
            #[allow(clippy::cast_possible_truncation)]
            let data = vec![(i % 255) as u8; chunk_size];
            let mut total_written = 0;
            while total_written < chunk_size {
                let written = {
                    let mut buf = buffer.lock().unwrap();
                    let n = buf.cont_write().min(chunk_size - total_written);
                    buf.write_region(n)
                        .copy_from_slice(&data[total_written..total_written + n]);
                    buf.inc_write(n);
                    n
                };
                total_written += written;
                if written == 0 {
                    thread::sleep(Duration::from_micros(10));
                }
            }
        }
    });

    let consumer = thread::spawn(move || {
        let mut total_read_bytes = 0;
        let expected_total = iteration_count * chunk_size;
        let mut temp_buf = vec![0u8; 777];

        while total_read_bytes < expected_total {
            let read = buffer_clone.lock().unwrap().read(&mut temp_buf);
            if read > 0 {
                for (j, byte) in temp_buf.iter().enumerate().take(read) {
                    let byte_index = total_read_bytes + j;
                    let chunk_index = byte_index / chunk_size;
                    #[allow(clippy::cast_possible_truncation)]
                    let expected_val = (chunk_index % 255) as u8;
                    assert_eq!(*byte, expected_val, "Mismatch at byte {byte_index}");
                }
                total_read_bytes += read;
            } else {
                thread::sleep(Duration::from_micros(10));
            }
        }
    });

    producer.join().unwrap();
    consumer.join().unwrap();
}
