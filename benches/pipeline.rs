use criterion::{Criterion, black_box, criterion_group, criterion_main};
use paint_by_numbers_wasm::{Pixel, PipelineParams, classify, quantize, run_pipeline, segment};
use palette::Srgb;

/// 600x400 gradient with a few hard edges, about the size the pipeline scales inputs to.
fn synthetic_image(width: u32, height: u32) -> Vec<Pixel> {
    (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                let band = ((x / 75) + (y / 50)) % 4;
                Srgb::new(
                    (x * 255 / width) as u8,
                    (band * 60) as u8,
                    (y * 255 / height) as u8,
                )
            })
        })
        .collect()
}

fn benchmark_stages(c: &mut Criterion) {
    let (w, h) = (600, 400);
    let pixels = synthetic_image(w, h);
    let palette = quantize(&pixels, 10).expect("quantize");
    let labels = classify(&pixels, w, h, &palette).expect("classify");

    c.bench_function("quantize_10", |b| b.iter(|| quantize(black_box(&pixels), 10)));
    c.bench_function("classify_600x400", |b| {
        b.iter(|| classify(black_box(&pixels), w, h, black_box(&palette)))
    });
    c.bench_function("segment_600x400", |b| b.iter(|| segment(black_box(&labels), 10)));
    c.bench_function("pipeline_600x400", |b| {
        let params = PipelineParams::default();
        b.iter(|| run_pipeline(black_box(&pixels), w, h, &params))
    });
}

criterion_group!(benches, benchmark_stages);
criterion_main!(benches);
