//! Sample conversion for the output writer

use byteorder::{ByteOrder, LittleEndian};

use super::format::{INPUT_BYTES_PER_SAMPLE, SampleWidth};

/// Widen 16-bit little-endian samples into 32-bit little-endian samples
///
/// Each sample is shifted into the high half (`s << 16`), so the sign is
/// carried by the arithmetic shift rather than truncated. Converts as many
/// whole samples as fit in both slices and returns the number converted.
pub fn widen_i16_to_i32(input: &[u8], output: &mut [u8]) -> usize {
    let samples = (input.len() / INPUT_BYTES_PER_SAMPLE).min(output.len() / 4);

    for (src, dst) in input
        .chunks_exact(INPUT_BYTES_PER_SAMPLE)
        .zip(output.chunks_exact_mut(4))
        .take(samples)
    {
        let sample = LittleEndian::read_i16(src);
        LittleEndian::write_i32(dst, i32::from(sample) << 16);
    }

    samples
}

/// Copy input PCM into an output region in the pipeline's native width
///
/// `output` must be sized in output bytes; returns the number of input
/// bytes consumed.
pub fn copy_native(width: SampleWidth, input: &[u8], output: &mut [u8]) -> usize {
    match width {
        SampleWidth::Bits16 => {
            let n = input.len().min(output.len());
            output[..n].copy_from_slice(&input[..n]);
            n
        }
        SampleWidth::Bits32 => widen_i16_to_i32(input, output) * INPUT_BYTES_PER_SAMPLE,
    }
}
