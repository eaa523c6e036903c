use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use external_sink::audio::convert::widen_i16_to_i32;
use external_sink::testing::TestPipeline;
use external_sink::{ExternalSource, SampleWidth, SinkConfig};

fn benchmark_widen(c: &mut Criterion) {
    // one AirPlay block
    let input = vec![0x5Au8; 1408];
    let mut output = vec![0u8; 2816];

    c.bench_function("widen_i16_to_i32_block", |b| {
        b.iter(|| widen_i16_to_i32(black_box(&input), black_box(&mut output)))
    });
}

fn benchmark_write_pcm(c: &mut Criterion) {
    let input = vec![0x5Au8; 1408];

    for (name, width) in [
        ("write_pcm_16_bit", SampleWidth::Bits16),
        ("write_pcm_32_bit", SampleWidth::Bits32),
    ] {
        let test = TestPipeline::new(SinkConfig::default().sample_width(width));
        let pipeline = Arc::clone(&test.pipeline);

        c.bench_function(name, |b| {
            b.iter(|| {
                let n = pipeline.write_pcm(ExternalSource::Bluetooth, black_box(&input));
                // drain so the writer never waits
                pipeline.lock_output().buffer.flush();
                n
            })
        });
    }
}

criterion_group!(benches, benchmark_widen, benchmark_write_pcm);
criterion_main!(benches);
