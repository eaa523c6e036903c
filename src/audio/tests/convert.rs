use crate::audio::convert::*;
use crate::audio::format::SampleWidth;

#[test]
fn test_widen_preserves_sign() {
    // 0x4000, -0x4000 (0xC000), i16::MIN, i16::MAX
    let input: Vec<u8> = vec![0x00, 0x40, 0x00, 0xC0, 0x00, 0x80, 0xFF, 0x7F];
    let mut output = vec![0u8; 16];

    assert_eq!(widen_i16_to_i32(&input, &mut output), 4);

    let samples: Vec<i32> = output
        .chunks_exact(4)
        .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    assert_eq!(samples, vec![0x4000_0000, -0x4000_0000, i32::MIN, 0x7FFF_0000]);
}

#[test]
fn test_widen_limited_by_output() {
    let input = vec![1u8; 8];
    let mut output = vec![0u8; 6];

    // Only one whole 32-bit sample fits
    assert_eq!(widen_i16_to_i32(&input, &mut output), 1);
    assert_eq!(&output[..4], &[0, 0, 1, 1]);
}

#[test]
fn test_copy_native_16_bit() {
    let input = [1u8, 2, 3, 4, 5];
    let mut output = [0u8; 3];

    assert_eq!(copy_native(SampleWidth::Bits16, &input, &mut output), 3);
    assert_eq!(output, [1, 2, 3]);
}

#[test]
fn test_copy_native_32_bit_reports_input_bytes() {
    let input = [0u8, 1, 0, 2];
    let mut output = [0u8; 8];

    assert_eq!(copy_native(SampleWidth::Bits32, &input, &mut output), 4);
    assert_eq!(output, [0, 0, 0, 1, 0, 0, 0, 2]);
}

#[test]
fn test_sample_width_sizes() {
    assert_eq!(SampleWidth::Bits16.bytes_per_frame(), 4);
    assert_eq!(SampleWidth::Bits32.bytes_per_frame(), 8);
    assert_eq!(SampleWidth::Bits16.expansion(), 1);
    assert_eq!(SampleWidth::Bits32.expansion(), 2);
    assert_eq!(SampleWidth::Bits32.bytes_to_frames(800), 100);
}
