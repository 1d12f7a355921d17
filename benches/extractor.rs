use criterion::{black_box, criterion_group, criterion_main, Criterion};
use facekey::encoding::encode_components;
use facekey::extractor::{ExtractorParams, FuzzyExtractor, SampleLockExtractor};
use facekey::helper::HelperCodec;

fn reading() -> Vec<f32> {
    (0..128).map(|i| ((i * 37) % 19) as f32 - 9.5).collect()
}

fn bench_extractor(c: &mut Criterion) {
    let extractor = SampleLockExtractor::new(ExtractorParams::new(16, 8)).unwrap();
    let enrolled = encode_components(&reading());
    let (_, helper) = extractor.generate(&enrolled).unwrap();

    let mut noisy = reading();
    for i in [5, 31, 64, 90] {
        noisy[i] = -noisy[i];
    }
    let noisy = encode_components(&noisy);

    c.bench_function("generate_128bit_t8", |b| {
        b.iter(|| extractor.generate(black_box(&enrolled)).unwrap())
    });
    c.bench_function("reproduce_128bit_t8_close", |b| {
        b.iter(|| extractor.reproduce(black_box(&noisy), &helper).unwrap())
    });

    let codec = HelperCodec::new();
    c.bench_function("helper_codec_roundtrip", |b| {
        b.iter(|| codec.deserialize(&codec.serialize(black_box(&helper))).unwrap())
    });
}

criterion_group!(benches, bench_extractor);
criterion_main!(benches);
