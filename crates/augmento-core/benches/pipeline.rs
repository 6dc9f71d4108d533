//! Benchmarks for the Augmento augmentation pipeline.
//!
//! Run with: cargo bench -p augmento-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, Rgb, RgbImage};

use augmento_core::{
    DirectorySink, IdCounter, Image, OperationFactory, OperationSpec, OutputImageFormat, Pipeline,
    ThreadController,
};

fn sample(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8])
    }))
}

fn standard_pipeline() -> Pipeline {
    let specs = vec![
        OperationSpec::new("rotate", vec![-15.0, 15.0, 2.0], 0.5),
        OperationSpec::new("reflect", vec![], 0.5),
        OperationSpec::new("color jitter", vec![20.0, 0.2, 0.2, 10.0], 0.8),
        OperationSpec::new("blur", vec![3.0, 5.0], 0.3),
    ];
    Pipeline::from_specs(&specs, 42).expect("valid pipeline")
}

fn benchmark_pipeline_apply(c: &mut Criterion) {
    let pipeline = standard_pipeline();
    let raster = sample(512, 512);
    let ids = IdCounter::default();

    c.bench_function("pipeline_apply_512px", |b| {
        b.iter(|| {
            let mut image = Image::with_counter(raster.clone(), "bench.png", &ids);
            let _ = pipeline.apply(black_box(&mut image));
        })
    });
}

fn benchmark_single_operations(c: &mut Criterion) {
    let raster = sample(256, 256);
    let mut group = c.benchmark_group("operation_256px");
    for (name, params) in [
        ("rotate", vec![-30.0, 30.0, 0.0]),
        ("histogram equalization", vec![]),
        ("inject noise", vec![0.0, 0.0, 5.0, 10.0]),
        ("blur", vec![5.0, 5.0]),
        ("sharpen", vec![]),
    ] {
        let mut pipeline = Pipeline::new(7);
        pipeline.add(OperationFactory::create(name, &params, 1.0).expect("valid operation"));
        let ids = IdCounter::default();
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut image = Image::with_counter(raster.clone(), "op.png", &ids);
                let _ = pipeline.apply(black_box(&mut image));
            })
        });
    }
    group.finish();
}

fn benchmark_controller_run(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in");
    std::fs::create_dir_all(&input).expect("input dir");
    let paths: Vec<_> = (0..8)
        .map(|i| {
            let path = input.join(format!("bench_{i}.png"));
            sample(128, 128).save(&path).expect("write input");
            path
        })
        .collect();
    let pipeline = standard_pipeline();

    c.bench_function("controller_8x2_bmp", |b| {
        b.iter(|| {
            let mut sink =
                DirectorySink::new(dir.path().join("out"), OutputImageFormat::Bmp).expect("sink");
            let mut controller = ThreadController::new(4, 16);
            let _ = controller.run(black_box(&paths), 2, &pipeline, &mut sink);
        })
    });
}

criterion_group!(
    benches,
    benchmark_pipeline_apply,
    benchmark_single_operations,
    benchmark_controller_run,
);
criterion_main!(benches);
